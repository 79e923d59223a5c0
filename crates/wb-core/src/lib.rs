//! wassup-board/crates/wb-core/src/lib.rs
//!
//! The domain model and interface definitions for Wassup-Board.

pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_validation_rejects_empty_content_first() {
        let thread = Thread::new("", "");
        assert_eq!(thread.validate(), Err(ValidationError::EmptyContent));

        let thread = Thread::new("hello", "");
        assert_eq!(thread.validate(), Err(ValidationError::MissingUser));

        assert!(Thread::new("hello", "anna").validate().is_ok());
    }

    #[test]
    fn thread_uses_board_field_names_on_the_wire() {
        let thread = Thread {
            id: 4,
            content: "Hi".into(),
            user: "Anna".into(),
            up_votes_count: 1,
            down_votes_count: 2,
        };
        let json = serde_json::to_value(&thread).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ID": 4,
                "Content": "Hi",
                "User": "Anna",
                "UpVotesCount": 1,
                "DownVotesCount": 2
            })
        );
    }

    #[test]
    fn thread_decodes_with_missing_counters_and_id() {
        let thread: Thread =
            serde_json::from_str(r#"{"Content":"this is thread 1","User":"bob"}"#).unwrap();
        assert_eq!(thread.id, 0);
        assert_eq!(thread.up_votes_count, 0);
        assert_eq!(thread.user, "bob");

        let missing_user: Thread = serde_json::from_str(r#"{"Content":"hi"}"#).unwrap();
        assert_eq!(missing_user.validate(), Err(ValidationError::MissingUser));
    }

    #[test]
    fn validation_messages_match_http_contract() {
        assert_eq!(
            ValidationError::EmptyContent.to_string(),
            "Thread content must have at least 1 character."
        );
        assert_eq!(ValidationError::MissingUser.to_string(), "Thread is missing a user.");
    }

    struct FixedStore(Threads);

    #[async_trait::async_trait]
    impl ThreadStore for FixedStore {
        async fn save_thread(&self, _thread: Thread) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".into()))
        }

        async fn get_threads(&self) -> std::result::Result<Threads, StoreError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn thread_count_defaults_to_history_length() {
        let store = FixedStore(vec![Thread::new("a", "b"), Thread::new("c", "d")]);
        assert_eq!(store.thread_count().await.unwrap(), 2);
    }
}
