//! # wb-store-flatfile
//!
//! Keeps the whole thread history as one JSON array in a single file.
//!
//! The file is read once when the store is opened. From then on reads are
//! served from memory and every save rewrites the full array, so the file
//! always holds a complete, parseable history.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};
use wb_core::{StoreError, Thread, ThreadStore, Threads};

const EMPTY_HISTORY: &[u8] = b"[]";

pub struct FlatFileStore {
    path: PathBuf,
    threads: Mutex<Threads>,
}

impl FlatFileStore {
    /// Opens `path`, creating it (and an empty history) when missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let threads: Threads = if raw.iter().all(u8::is_ascii_whitespace) {
            fs::write(&path, EMPTY_HISTORY).await?;
            Vec::new()
        } else {
            serde_json::from_slice(&raw)?
        };

        info!(path = %path.display(), threads = threads.len(), "flat-file store opened");
        Ok(Self {
            path,
            threads: Mutex::new(threads),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ThreadStore for FlatFileStore {
    async fn save_thread(&self, thread: Thread) -> Result<(), StoreError> {
        let mut threads = self.threads.lock().await;
        threads.push(thread);

        // The in-memory copy only keeps the new thread if the file took it.
        let written = match serde_json::to_vec(&*threads) {
            Ok(encoded) => fs::write(&self.path, encoded).await.map_err(StoreError::from),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = written {
            threads.pop();
            return Err(e);
        }

        debug!(path = %self.path.display(), threads = threads.len(), "history rewritten");
        Ok(())
    }

    async fn get_threads(&self) -> Result<Threads, StoreError> {
        Ok(self.threads.lock().await.clone())
    }

    async fn thread_count(&self) -> Result<usize, StoreError> {
        Ok(self.threads.lock().await.len())
    }
}
