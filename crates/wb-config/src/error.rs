use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("configuration invalid: {0}")]
    Invalid(#[from] ValidationError),
}

/// Values that load fine but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("hub.queue_capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("hub.initial_push_timeout_ms must be at least 1")]
    ZeroInitialPushTimeout,

    #[error("store.path must not be empty")]
    EmptyStorePath,

    #[error("cors.allowed_origins contains an empty entry")]
    EmptyOrigin,
}
