//! # Connection Registry
//!
//! The set of live connections, keyed by [`ConnectionId`]. Membership changes
//! and mode-filtered snapshots share one lock, so a snapshot never observes a
//! half-applied add or remove.
//!
//! Fan-out lives here too. A failed write is logged and skipped; it never
//! aborts the pass and never removes the target. Removal is the job of the
//! target's own ingestion loop.

use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use wb_core::{ConnectionMode, Threads, TransportError};

use crate::connection::{Connection, ConnectionId};
use crate::error::SendError;

/// What a broadcast pass delivers. The variant decides which send is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastPayload {
    ThreadUpdate(Threads),
    TextUpdate(Bytes),
}

impl BroadcastPayload {
    /// The group this payload is meant for.
    pub fn mode(&self) -> ConnectionMode {
        match self {
            Self::ThreadUpdate(_) => ConnectionMode::Broadcast,
            Self::TextUpdate(_) => ConnectionMode::Paired,
        }
    }
}

/// Outcome of one fan-out pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub failures: Vec<SendError>,
}

impl BroadcastReport {
    pub fn delivered(&self) -> usize {
        self.attempted - self.failures.len()
    }
}

#[derive(Default)]
pub struct ConnectionRegistry {
    members: RwLock<HashMap<ConnectionId, Connection>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next connection handle. Never reused.
    pub fn allocate_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Inserts the connection. Returns false, leaving the existing entry
    /// untouched, if the id is already present.
    pub async fn add(&self, conn: Connection) -> bool {
        let mut members = self.members.write().await;
        if members.contains_key(&conn.id()) {
            return false;
        }
        members.insert(conn.id(), conn);
        true
    }

    /// Idempotent: removing an absent id is a no-op.
    pub async fn remove(&self, id: ConnectionId) -> Option<Connection> {
        self.members.write().await.remove(&id)
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.members.read().await.contains_key(&id)
    }

    /// Snapshot of the current members of one group, ordered by id.
    pub async fn members_by_mode(&self, mode: ConnectionMode) -> Vec<Connection> {
        let mut members: Vec<Connection> = self
            .members
            .read()
            .await
            .values()
            .filter(|conn| conn.mode() == mode)
            .cloned()
            .collect();
        members.sort_by_key(Connection::id);
        members
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Removes and returns every member.
    pub(crate) async fn drain(&self) -> Vec<Connection> {
        self.members.write().await.drain().map(|(_, conn)| conn).collect()
    }

    /// Sends `payload` to every target in turn.
    ///
    /// Each write may be bounded by `send_timeout`; a timeout counts as a
    /// failed write.
    pub async fn broadcast(
        &self,
        targets: &[Connection],
        payload: &BroadcastPayload,
        send_timeout: Option<Duration>,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for target in targets {
            report.attempted += 1;

            let send = async {
                match payload {
                    BroadcastPayload::ThreadUpdate(history) => target.send_threads(history).await,
                    BroadcastPayload::TextUpdate(buf) => target.send_text(buf.clone()).await,
                }
            };

            let result = bounded(send_timeout, send).await;

            if let Err(source) = result {
                warn!(conn_id = %target.id(), mode = %target.mode(), error = %source, "broadcast send failed");
                report.failures.push(SendError {
                    connection: target.id(),
                    source,
                });
            }
        }

        debug!(
            mode = %payload.mode(),
            attempted = report.attempted,
            failed = report.failures.len(),
            "broadcast pass finished"
        );
        report
    }
}

/// Runs one write, failing it with [`TransportError::TimedOut`] past `limit`.
pub(crate) async fn bounded<F>(limit: Option<Duration>, send: F) -> Result<(), TransportError>
where
    F: Future<Output = Result<(), TransportError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, send)
            .await
            .unwrap_or(Err(TransportError::TimedOut(limit))),
        None => send.await,
    }
}
