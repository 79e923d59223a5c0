use bytes::Bytes;
use tokio::sync::RwLock;

/// The shared paired-text state. Last writer wins.
///
/// Written by paired ingestion loops, read by the broadcast worker and by the
/// initial push of a newly paired connection.
pub struct TextBuffer {
    current: RwLock<Bytes>,
}

impl TextBuffer {
    pub fn new(initial: impl Into<Bytes>) -> Self {
        Self {
            current: RwLock::new(initial.into()),
        }
    }

    pub async fn read(&self) -> Bytes {
        self.current.read().await.clone()
    }

    pub async fn replace(&self, text: Bytes) {
        *self.current.write().await = text;
    }
}
