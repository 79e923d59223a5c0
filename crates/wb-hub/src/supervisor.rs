use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::connection::ConnectionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    PersistenceWorker,
    BroadcastWorker,
    Reader(ConnectionId),
}

/// Keeps a handle to every task the hub spawns so they can all be cancelled
/// and joined at shutdown. Once shut down it refuses new tasks.
#[derive(Default)]
pub(crate) struct TaskSupervisor {
    tasks: DashMap<TaskKind, JoinHandle<()>>,
    closed: AtomicBool,
}

impl TaskSupervisor {
    /// Starts `task` under `kind`. Returns `false` (and never runs the task)
    /// once shutdown has begun.
    pub fn spawn<F>(&self, kind: TaskKind, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        self.tasks.retain(|_, handle| !handle.is_finished());
        self.tasks.insert(kind, tokio::spawn(task));

        // A shutdown that collected its handles before this insert won't see it.
        if self.closed.load(Ordering::SeqCst) {
            if let Some((_, handle)) = self.tasks.remove(&kind) {
                handle.abort();
            }
            return false;
        }
        true
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.tasks
            .get(&kind)
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn running_readers(&self) -> usize {
        self.tasks
            .iter()
            .filter(|entry| matches!(entry.key(), TaskKind::Reader(_)) && !entry.value().is_finished())
            .count()
    }

    /// Aborts every tracked task and waits for each to wind down.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let kinds: Vec<TaskKind> = self.tasks.iter().map(|entry| *entry.key()).collect();

        let mut handles = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if let Some((_, handle)) = self.tasks.remove(&kind) {
                handle.abort();
                handles.push((kind, handle));
            }
        }

        for (kind, handle) in handles {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    debug!(task = ?kind, error = %e, "task ended abnormally");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_cancels_pending_tasks() {
        let supervisor = TaskSupervisor::default();
        assert!(supervisor.spawn(TaskKind::Reader(ConnectionId::new(1)), std::future::pending()));
        assert!(supervisor.spawn(TaskKind::BroadcastWorker, std::future::pending()));
        assert_eq!(supervisor.running_readers(), 1);

        supervisor.shutdown().await;

        assert_eq!(supervisor.running_readers(), 0);
        assert!(!supervisor.is_running(TaskKind::BroadcastWorker));
    }

    #[tokio::test]
    async fn spawn_after_shutdown_is_refused() {
        let supervisor = TaskSupervisor::default();
        supervisor.shutdown().await;

        let (ran_tx, mut ran_rx) = tokio::sync::oneshot::channel::<()>();
        let spawned = supervisor.spawn(TaskKind::Reader(ConnectionId::new(7)), async move {
            let _ = ran_tx.send(());
        });

        assert!(!spawned);
        assert_eq!(supervisor.running_readers(), 0);
        tokio::task::yield_now().await;
        assert!(ran_rx.try_recv().is_err());
    }
}
