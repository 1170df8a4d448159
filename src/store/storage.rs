//! Durable storage seam for the todo collection.
//!
//! The store is a key-value collaborator holding a single value: the full
//! JSON-serialized collection, overwritten wholesale on every mutation and
//! read once at startup. The production implementation is one JSON file.

use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("persistence writer task is gone")]
    WriterGone,
}

/// Injected storage collaborator consumed by `TodoStore`.
#[async_trait]
pub trait TodoStorage: Send + Sync + 'static {
    /// Read the persisted payload. `None` when nothing was ever written.
    async fn read(&self) -> Result<Option<String>, StorageError>;

    /// Overwrite the persisted payload wholesale.
    async fn write(&self, payload: &str) -> Result<(), StorageError>;
}

/// File-backed storage: the fixed storage key maps to one file path.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TodoStorage for FileStorage {
    async fn read(&self) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, payload: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, payload).await?;
        Ok(())
    }
}

/// In-memory storage double for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStorage {
    contents: std::sync::Mutex<Option<String>>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap().clone()
    }

    pub fn preload(payload: &str) -> Self {
        Self {
            contents: std::sync::Mutex::new(Some(payload.to_string())),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl TodoStorage for MemoryStorage {
    async fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents.lock().unwrap().clone())
    }

    async fn write(&self, payload: &str) -> Result<(), StorageError> {
        *self.contents.lock().unwrap() = Some(payload.to_string());
        Ok(())
    }
}
