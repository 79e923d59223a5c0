//! # Core Traits (Ports)
//!
//! Any store plugin or transport adapter must implement these traits to be
//! wired into the hub.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{StoreError, TransportError};
use crate::models::{Thread, Threads};

/// Append-only persistence of threads.
///
/// The store keeps whatever it is handed; ID assignment belongs to the caller
/// (the hub's persistence worker is the only writer).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Appends one thread to the end of the history.
    async fn save_thread(&self, thread: Thread) -> Result<(), StoreError>;

    /// Returns a snapshot of the full ordered history. The snapshot must not
    /// change under the caller when a concurrent append lands.
    async fn get_threads(&self) -> Result<Threads, StoreError>;

    /// Number of stored threads, which is also the next ID to hand out.
    async fn thread_count(&self) -> Result<usize, StoreError> {
        Ok(self.get_threads().await?.len())
    }
}

/// Write half of a live framed connection.
///
/// Takes `&self` so the hub can share one sink between the initial state
/// push and the broadcast worker; implementations serialize writes internally.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Writes one frame. No retry.
    async fn send_frame(&self, frame: Bytes) -> Result<(), TransportError>;

    /// Best-effort close, used when the hub drops a connection.
    async fn close(&self) {}
}

/// Read half of a live framed connection. Owned by exactly one reader.
#[async_trait]
pub trait FrameStream: Send {
    /// Waits for the next data frame. Control frames are the adapter's concern.
    async fn next_frame(&mut self) -> Result<Bytes, TransportError>;
}
