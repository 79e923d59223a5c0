use thiserror::Error;
use wb_core::{AppError, StoreError, TransportError, ValidationError};

use crate::connection::ConnectionId;

/// Errors returned by the [`Hub`](crate::Hub) facade.
#[derive(Error, Debug)]
pub enum HubError {
    #[error("hub workers are already running")]
    WorkersAlreadyStarted,

    /// The queues are closed: the hub has been shut down.
    #[error("hub is shut down")]
    Closed,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

/// One fan-out write that did not reach its target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("send to connection {connection} failed: {source}")]
pub struct SendError {
    pub connection: ConnectionId,
    #[source]
    pub source: TransportError,
}

impl From<HubError> for AppError {
    fn from(err: HubError) -> Self {
        match err {
            HubError::Validation(e) => AppError::Validation(e),
            HubError::Persistence(e) => AppError::Store(e),
            HubError::Closed => AppError::Unavailable("hub is shut down".into()),
            other => AppError::Internal(other.to_string()),
        }
    }
}
