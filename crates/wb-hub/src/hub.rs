//! # Hub
//!
//! The facade the HTTP layer talks to. Owns the store handle, the registry,
//! the shared text buffer, both bounded queues and every spawned task.

use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use wb_core::{ConnectionMode, FrameSink, FrameStream, Thread, ThreadStore, Threads};

use crate::config::HubConfig;
use crate::connection::{Connection, ConnectionId, ConnectionReader};
use crate::error::HubError;
use crate::ingest::{self, IngestContext};
use crate::registry::{bounded, ConnectionRegistry};
use crate::supervisor::{TaskKind, TaskSupervisor};
use crate::text_buffer::TextBuffer;
use crate::workers::{BroadcastWorker, PersistRequest, PersistenceWorker, Signal};

type QueueReceivers = (mpsc::Receiver<PersistRequest>, mpsc::Receiver<Signal>);

/// Cheap to clone; every clone drives the same pipeline.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    store: Arc<dyn ThreadStore>,
    registry: Arc<ConnectionRegistry>,
    text: Arc<TextBuffer>,
    persist_tx: mpsc::Sender<PersistRequest>,
    signal_tx: mpsc::Sender<Signal>,
    /// Consumer ends, parked here until `start_workers` hands them out.
    idle_receivers: Mutex<Option<QueueReceivers>>,
    /// Serializes broadcast passes with the initial push of new connections.
    gate: Arc<tokio::sync::Mutex<()>>,
    tasks: TaskSupervisor,
    closed: AtomicBool,
}

impl Hub {
    pub fn new(store: Arc<dyn ThreadStore>, config: HubConfig) -> Self {
        let capacity = config.queue_capacity.max(1);
        let (persist_tx, persist_rx) = mpsc::channel(capacity);
        let (signal_tx, signal_rx) = mpsc::channel(capacity);
        let text = Arc::new(TextBuffer::new(config.welcome_text.clone()));

        Self {
            inner: Arc::new(HubInner {
                config,
                store,
                registry: Arc::new(ConnectionRegistry::new()),
                text,
                persist_tx,
                signal_tx,
                idle_receivers: Mutex::new(Some((persist_rx, signal_rx))),
                gate: Arc::new(tokio::sync::Mutex::new(())),
                tasks: TaskSupervisor::default(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Spawns the persistence and broadcast workers. Only the first call
    /// does anything; later calls report [`HubError::WorkersAlreadyStarted`].
    pub fn start_workers(&self) -> Result<(), HubError> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::SeqCst) {
            return Err(HubError::Closed);
        }

        let (persist_rx, signal_rx) = inner
            .idle_receivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(HubError::WorkersAlreadyStarted)?;

        let persistence = PersistenceWorker {
            store: inner.store.clone(),
            queue: persist_rx,
            signals: inner.signal_tx.clone(),
        };
        let broadcast = BroadcastWorker {
            store: inner.store.clone(),
            registry: inner.registry.clone(),
            text: inner.text.clone(),
            signals: signal_rx,
            gate: inner.gate.clone(),
            send_timeout: inner.config.send_timeout,
            deregister_on_send_failure: inner.config.deregister_on_send_failure,
        };

        let started = inner.tasks.spawn(TaskKind::PersistenceWorker, persistence.run())
            && inner.tasks.spawn(TaskKind::BroadcastWorker, broadcast.run());
        if !started {
            return Err(HubError::Closed);
        }
        Ok(())
    }

    /// Admits a freshly upgraded transport.
    ///
    /// Pushes the current state (history for broadcast, buffer for paired),
    /// registers the connection and starts its ingestion loop. If the initial
    /// push fails, or the hub shuts down meanwhile, the connection is never
    /// registered.
    ///
    /// The fan-out gate is held for the whole admission, so the initial push
    /// is always bounded: by `send_timeout` when set, otherwise by
    /// `initial_push_timeout`.
    pub async fn register_connection(
        &self,
        sink: Arc<dyn FrameSink>,
        stream: Box<dyn FrameStream>,
        mode: ConnectionMode,
    ) -> Result<ConnectionId, HubError> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::SeqCst) {
            return Err(HubError::Closed);
        }

        let id = inner.registry.allocate_id();
        let conn = Connection::new(id, mode, sink);
        let push_limit = Some(
            inner
                .config
                .send_timeout
                .unwrap_or(inner.config.initial_push_timeout),
        );

        let _gate = inner.gate.lock().await;
        let pushed = match mode {
            ConnectionMode::Broadcast => {
                let history = inner.store.get_threads().await?;
                bounded(push_limit, conn.send_threads(&history)).await
            }
            ConnectionMode::Paired => {
                let text = inner.text.read().await;
                bounded(push_limit, conn.send_text(text)).await
            }
        };
        if let Err(e) = pushed {
            warn!(conn_id = %id, %mode, error = %e, "initial push failed, connection dropped");
            return Err(e.into());
        }

        // Shutdown may have started while this registration waited.
        if inner.closed.load(Ordering::SeqCst) {
            conn.close().await;
            return Err(HubError::Closed);
        }
        inner.registry.add(conn.clone()).await;

        let reader = ConnectionReader::new(id, stream);
        let ctx = IngestContext {
            registry: inner.registry.clone(),
            persist: inner.persist_tx.clone(),
            signals: inner.signal_tx.clone(),
            text: inner.text.clone(),
            deregister_on_invalid_thread: inner.config.deregister_on_invalid_thread,
        };
        if !inner.tasks.spawn(TaskKind::Reader(id), ingest::run(reader, mode, ctx)) {
            inner.registry.remove(id).await;
            conn.close().await;
            return Err(HubError::Closed);
        }

        info!(conn_id = %id, %mode, "connection registered");
        Ok(id)
    }

    /// Queues a thread for persistence, waiting while the queue is full.
    pub async fn enqueue_thread(&self, thread: Thread) -> Result<(), HubError> {
        self.push(PersistRequest { thread, reply: None }).await
    }

    /// Validates, queues and waits for the stored copy with its assigned ID.
    pub async fn submit_thread(&self, thread: Thread) -> Result<Thread, HubError> {
        thread.validate()?;

        let (reply, stored) = oneshot::channel();
        self.push(PersistRequest {
            thread,
            reply: Some(reply),
        })
        .await?;

        stored.await.map_err(|_| HubError::Closed)?
    }

    async fn push(&self, request: PersistRequest) -> Result<(), HubError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(HubError::Closed);
        }
        self.inner
            .persist_tx
            .send(request)
            .await
            .map_err(|_| HubError::Closed)
    }

    pub async fn threads(&self) -> Result<Threads, HubError> {
        Ok(self.inner.store.get_threads().await?)
    }

    pub async fn thread(&self, id: u64) -> Result<Option<Thread>, HubError> {
        let history = self.threads().await?;
        Ok(usize::try_from(id)
            .ok()
            .and_then(|index| history.into_iter().nth(index)))
    }

    /// Current content of the shared paired-text buffer.
    pub async fn text(&self) -> Bytes {
        self.inner.text.read().await
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn workers_running(&self) -> bool {
        self.inner.tasks.is_running(TaskKind::PersistenceWorker)
            && self.inner.tasks.is_running(TaskKind::BroadcastWorker)
    }

    /// Number of ingestion loops still reading.
    pub fn active_readers(&self) -> usize {
        self.inner.tasks.running_readers()
    }

    /// Stops everything: cancels and joins the workers and every ingestion
    /// loop, then closes and forgets all registered connections. Idempotent.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        if inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        inner.tasks.shutdown().await;

        // Waits out any registration that is still pushing its initial state.
        let _gate = inner.gate.lock().await;
        let members = inner.registry.drain().await;
        let closed = members.len();
        for conn in members {
            conn.close().await;
        }
        info!(closed_connections = closed, "hub shut down");
    }
}
