use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use study_core::model::{Snapshot, SnapshotError};
use thiserror::Error;

use crate::fs::FileSnapshotRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Repository contract for the single persisted progress snapshot.
///
/// Adapters only move text; the default `load`/`save` methods run it through
/// the snapshot serializer.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Fetch the raw persisted document, `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    async fn load_text(&self) -> Result<Option<String>, StorageError>;

    /// Replace the persisted document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn save_text(&self, text: &str) -> Result<(), StorageError>;

    /// Fetch and parse the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Snapshot` if the stored document is not a valid
    /// progress file, or other storage errors.
    async fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        match self.load_text().await? {
            Some(text) => Ok(Some(Snapshot::from_json(&text)?)),
            None => Ok(None),
        }
    }

    /// Serialize and persist a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or writing fails.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let text = snapshot.to_json()?;
        self.save_text(&text).await
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    document: Arc<Mutex<Option<String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryRepository {
    async fn load_text(&self) -> Result<Option<String>, StorageError> {
        let guard = self
            .document
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_text(&self, text: &str) -> Result<(), StorageError> {
        let mut guard = self
            .document
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(text.to_owned());
        Ok(())
    }
}

/// Snapshot repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SnapshotRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            snapshots: Arc::new(InMemoryRepository::new()),
        }
    }

    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            snapshots: Arc::new(FileSnapshotRepository::new(path)),
        }
    }
}
