//! # Background Workers
//!
//! Two long-lived loops decoupled by bounded queues:
//!
//! ```text
//! ingestion loops ──PersistRequest──▶ PersistenceWorker ──Signal::ThreadUpdate──┐
//! paired loops ─────────────────────────────────────────Signal::TextUpdate──────┤
//!                                                                               ▼
//!                                       registry fan-out ◀── BroadcastWorker ◀──┘
//! ```
//!
//! The persistence worker is the only writer to the store, so thread IDs are
//! dense and follow queue order. The broadcast worker handles one signal at a
//! time and always re-reads current state, never a value captured at enqueue.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info};
use wb_core::{StoreError, Thread, ThreadStore};

use crate::error::HubError;
use crate::registry::{BroadcastPayload, ConnectionRegistry};
use crate::text_buffer::TextBuffer;

/// Which piece of shared state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    ThreadUpdate,
    TextUpdate,
}

/// One queued thread, with an optional slot for whoever wants the stored copy.
pub(crate) struct PersistRequest {
    pub thread: Thread,
    pub reply: Option<oneshot::Sender<Result<Thread, HubError>>>,
}

pub(crate) struct PersistenceWorker {
    pub store: Arc<dyn ThreadStore>,
    pub queue: mpsc::Receiver<PersistRequest>,
    pub signals: mpsc::Sender<Signal>,
}

impl PersistenceWorker {
    pub async fn run(mut self) {
        info!("persistence worker started");

        while let Some(PersistRequest { thread, reply }) = self.queue.recv().await {
            match self.persist(thread).await {
                Ok(saved) => {
                    debug!(thread_id = saved.id, user = %saved.user, "thread persisted");
                    if let Some(reply) = reply {
                        let _ = reply.send(Ok(saved));
                    }
                    if self.signals.send(Signal::ThreadUpdate).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to persist thread, dropping it");
                    if let Some(reply) = reply {
                        let _ = reply.send(Err(HubError::Persistence(e)));
                    }
                }
            }
        }

        info!("persistence worker stopped");
    }

    /// Assigns the next dense ID and appends. Runs on the single writer only.
    async fn persist(&self, mut thread: Thread) -> Result<Thread, StoreError> {
        thread.id = self.store.thread_count().await? as u64;
        self.store.save_thread(thread.clone()).await?;
        Ok(thread)
    }
}

pub(crate) struct BroadcastWorker {
    pub store: Arc<dyn ThreadStore>,
    pub registry: Arc<ConnectionRegistry>,
    pub text: Arc<TextBuffer>,
    pub signals: mpsc::Receiver<Signal>,
    /// Held for a whole pass; registration takes it for the initial push.
    pub gate: Arc<Mutex<()>>,
    pub send_timeout: Option<Duration>,
    pub deregister_on_send_failure: bool,
}

impl BroadcastWorker {
    pub async fn run(mut self) {
        info!("broadcast worker started");

        while let Some(signal) = self.signals.recv().await {
            let _pass = self.gate.lock().await;

            let payload = match signal {
                Signal::ThreadUpdate => match self.store.get_threads().await {
                    Ok(history) => BroadcastPayload::ThreadUpdate(history),
                    Err(e) => {
                        error!(error = %e, "failed to load threads for broadcast");
                        continue;
                    }
                },
                Signal::TextUpdate => BroadcastPayload::TextUpdate(self.text.read().await),
            };

            let targets = self.registry.members_by_mode(payload.mode()).await;
            let report = self
                .registry
                .broadcast(&targets, &payload, self.send_timeout)
                .await;

            if self.deregister_on_send_failure {
                for failure in report.failures {
                    if let Some(conn) = self.registry.remove(failure.connection).await {
                        conn.close().await;
                        info!(conn_id = %conn.id(), "deregistered connection after failed send");
                    }
                }
            }
        }

        info!("broadcast worker stopped");
    }
}
