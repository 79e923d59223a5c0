//! # Connection
//!
//! A live transport split into its two halves. [`Connection`] is the write
//! half: cheap to clone, stored in the registry, used by the initial state
//! push and by the broadcast worker. [`ConnectionReader`] is the read half,
//! owned by exactly one ingestion loop.

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use wb_core::{ConnectionMode, FrameSink, FrameStream, Thread, Threads, TransportError};

/// Registry-assigned handle. Identity of a connection is this number, never
/// the transport itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    mode: ConnectionMode,
    sink: Arc<dyn FrameSink>,
}

impl Connection {
    pub fn new(id: ConnectionId, mode: ConnectionMode, sink: Arc<dyn FrameSink>) -> Self {
        Self { id, mode, sink }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    /// Serializes the whole history into a single frame.
    pub async fn send_threads(&self, history: &Threads) -> Result<(), TransportError> {
        let frame =
            serde_json::to_vec(history).map_err(|e| TransportError::Malformed(e.to_string()))?;
        self.sink.send_frame(Bytes::from(frame)).await
    }

    /// Writes the raw buffer as one frame.
    pub async fn send_text(&self, buf: Bytes) -> Result<(), TransportError> {
        self.sink.send_frame(buf).await
    }

    pub(crate) async fn close(&self) {
        self.sink.close().await;
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

pub struct ConnectionReader {
    id: ConnectionId,
    stream: Box<dyn FrameStream>,
}

impl ConnectionReader {
    pub fn new(id: ConnectionId, stream: Box<dyn FrameStream>) -> Self {
        Self { id, stream }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Waits for the next frame and decodes it as a thread.
    ///
    /// A frame that does not decode is reported as [`TransportError::Malformed`]
    /// and the caller must treat it exactly like a closed transport.
    pub async fn receive_thread(&mut self) -> Result<Thread, TransportError> {
        let frame = self.stream.next_frame().await?;
        serde_json::from_slice(&frame).map_err(|e| TransportError::Malformed(e.to_string()))
    }

    pub async fn receive_raw_text(&mut self) -> Result<Bytes, TransportError> {
        self.stream.next_frame().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_transport;

    #[tokio::test]
    async fn send_threads_writes_one_json_frame() {
        let (sink, _stream, mut peer) = memory_transport();
        let conn = Connection::new(ConnectionId::new(1), ConnectionMode::Broadcast, Arc::new(sink));

        let history = vec![Thread::new("hi", "anna"), Thread::new("bye", "bob")];
        conn.send_threads(&history).await.unwrap();

        let frame = peer.recv().await.unwrap();
        let decoded: Threads = serde_json::from_slice(&frame).unwrap();
        assert_eq!(decoded, history);
        assert!(peer.try_recv().is_none());
    }

    #[tokio::test]
    async fn malformed_frame_is_a_transport_error() {
        let (_sink, stream, peer) = memory_transport();
        let mut reader = ConnectionReader::new(ConnectionId::new(1), Box::new(stream));

        peer.send("not json at all");
        let err = reader.receive_thread().await.unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[tokio::test]
    async fn reader_reports_close() {
        let (_sink, stream, mut peer) = memory_transport();
        let mut reader = ConnectionReader::new(ConnectionId::new(1), Box::new(stream));

        peer.send("typed text");
        assert_eq!(reader.receive_raw_text().await.unwrap(), Bytes::from("typed text"));

        peer.close();
        assert_eq!(reader.receive_raw_text().await, Err(TransportError::Closed));
    }
}
