//! In-memory transport for exercising the hub without sockets.
//!
//! [`memory_transport`] returns the two server-side halves plus a
//! [`MemoryPeer`] that plays the remote client.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wb_core::{FrameSink, FrameStream, TransportError};

#[derive(Default)]
struct Flags {
    broken: AtomicBool,
    stalled: AtomicBool,
    closed_by_server: AtomicBool,
}

pub struct MemorySink {
    tx: mpsc::UnboundedSender<Bytes>,
    flags: Arc<Flags>,
}

pub struct MemoryStream {
    rx: mpsc::UnboundedReceiver<Bytes>,
}

/// The client end of an in-memory connection.
pub struct MemoryPeer {
    to_server: Option<mpsc::UnboundedSender<Bytes>>,
    from_server: mpsc::UnboundedReceiver<Bytes>,
    flags: Arc<Flags>,
}

pub fn memory_transport() -> (MemorySink, MemoryStream, MemoryPeer) {
    let (to_peer, from_server) = mpsc::unbounded_channel();
    let (to_server, from_peer) = mpsc::unbounded_channel();
    let flags = Arc::new(Flags::default());

    (
        MemorySink {
            tx: to_peer,
            flags: flags.clone(),
        },
        MemoryStream { rx: from_peer },
        MemoryPeer {
            to_server: Some(to_server),
            from_server,
            flags,
        },
    )
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_frame(&self, frame: Bytes) -> Result<(), TransportError> {
        if self.flags.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.flags.broken.load(Ordering::SeqCst) {
            return Err(TransportError::Io("simulated write failure".into()));
        }
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn close(&self) {
        self.flags.closed_by_server.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FrameStream for MemoryStream {
    async fn next_frame(&mut self) -> Result<Bytes, TransportError> {
        self.rx.recv().await.ok_or(TransportError::Closed)
    }
}

impl MemoryPeer {
    /// Sends a frame to the server. Returns false once the peer is closed.
    pub fn send(&self, frame: impl Into<Bytes>) -> bool {
        match &self.to_server {
            Some(tx) => tx.send(frame.into()).is_ok(),
            None => false,
        }
    }

    /// Simulates the client going away: the server's reader sees a close.
    pub fn close(&mut self) {
        self.to_server = None;
    }

    /// Makes every later server write fail.
    pub fn break_writes(&self) {
        self.flags.broken.store(true, Ordering::SeqCst);
    }

    /// Makes every later server write hang forever.
    pub fn stall_writes(&self) {
        self.flags.stalled.store(true, Ordering::SeqCst);
    }

    pub fn closed_by_server(&self) -> bool {
        self.flags.closed_by_server.load(Ordering::SeqCst)
    }

    pub async fn recv(&mut self) -> Option<Bytes> {
        self.from_server.recv().await
    }

    pub async fn recv_timeout(&mut self, wait: Duration) -> Option<Bytes> {
        tokio::time::timeout(wait, self.from_server.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.from_server.try_recv().ok()
    }
}
