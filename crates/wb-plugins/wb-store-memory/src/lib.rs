//! # wb-store-memory
//! Volatile `ThreadStore` backed by a vector. Used by tests and by the
//! `store-memory` build of the server.

use async_trait::async_trait;
use tokio::sync::RwLock;
use wb_core::{StoreError, Thread, ThreadStore, Threads};

#[derive(Default)]
pub struct MemoryStore {
    threads: RwLock<Threads>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing history, kept in the given order.
    pub fn with_threads(threads: Threads) -> Self {
        Self {
            threads: RwLock::new(threads),
        }
    }
}

#[async_trait]
impl ThreadStore for MemoryStore {
    async fn save_thread(&self, thread: Thread) -> Result<(), StoreError> {
        self.threads.write().await.push(thread);
        Ok(())
    }

    async fn get_threads(&self) -> Result<Threads, StoreError> {
        Ok(self.threads.read().await.clone())
    }

    async fn thread_count(&self) -> Result<usize, StoreError> {
        Ok(self.threads.read().await.len())
    }
}
