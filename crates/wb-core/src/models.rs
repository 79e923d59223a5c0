//! # Domain Models
//!
//! The records exchanged between posters, the store and live viewers.
//! Field names on the wire follow the board's existing JSON clients
//! (`ID`, `Content`, `User`, ...), hence the serde renames.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Welcome text every paired viewer sees before anyone has typed.
pub const DEFAULT_PAIR_TEXT: &str = "hi, enter text here";

/// A single posted message.
///
/// `id` is assigned once, by the persistence worker, right before the
/// record is appended to the store. Anything a client sends there is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Thread {
    #[serde(rename = "ID")]
    pub id: u64,
    pub content: String,
    pub user: String,
    pub up_votes_count: u64,
    pub down_votes_count: u64,
}

/// Full board history, in persistence order.
pub type Threads = Vec<Thread>;

impl Thread {
    pub fn new(content: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            user: user.into(),
            ..Self::default()
        }
    }

    /// Same rule on every ingress path: content and user must be non-empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        if self.user.is_empty() {
            return Err(ValidationError::MissingUser);
        }
        Ok(())
    }
}

/// Which live group a connection belongs to. Fixed by the upgrade route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Receives the full thread history after every persisted post.
    Broadcast,
    /// Shares the live text buffer with the other paired peers.
    Paired,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast => f.write_str("broadcast"),
            Self::Paired => f.write_str("paired"),
        }
    }
}
