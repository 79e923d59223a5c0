//! # Errors
//!
//! Failure taxonomy shared by every Wassup-Board crate. Transport and store
//! failures stay local to the connection or item they hit; only `AppError`
//! is ever surfaced to an HTTP caller.

use std::time::Duration;
use thiserror::Error;

/// A thread failed the content/user rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Thread content must have at least 1 character.")]
    EmptyContent,

    #[error("Thread is missing a user.")]
    MissingUser,
}

/// A live connection can no longer be read from or written to.
///
/// Always fatal to the one connection it concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,

    /// The peer sent a frame that does not decode. Treated like a close.
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("transport failure: {0}")]
    Io(String),

    #[error("send timed out after {0:?}")]
    TimedOut(Duration),
}

/// The thread store could not read or append.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The primary error type for request-facing operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Thread)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Payload or path segment that cannot be interpreted
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The live pipeline is not accepting work (shut down or not started)
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for Wassup-Board logic.
pub type Result<T> = std::result::Result<T, AppError>;
