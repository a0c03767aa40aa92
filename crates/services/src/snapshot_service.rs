use std::sync::Arc;

use storage::{SnapshotRepository, StorageError};
use study_core::model::Snapshot;
use tracing::{info, warn};

use crate::error::SnapshotServiceError;
use crate::store::ProgressStore;

/// How [`SnapshotService::open`] populated the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A saved snapshot replaced whatever the store held.
    Restored,
    /// Nothing was saved; the store was seeded from the catalog if empty.
    Seeded,
    /// The saved document was unreadable as a progress file and was ignored;
    /// the store is left empty.
    Discarded,
}

/// Moves snapshots between a `ProgressStore` and a repository.
#[derive(Clone)]
pub struct SnapshotService {
    repo: Arc<dyn SnapshotRepository>,
}

impl SnapshotService {
    #[must_use]
    pub fn new(repo: Arc<dyn SnapshotRepository>) -> Self {
        Self { repo }
    }

    /// Load the saved snapshot into `store`, or initialize it from the catalog
    /// when nothing has been saved.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotServiceError` if the saved document cannot be read or
    /// parsed; the store is left untouched in that case.
    pub async fn open(&self, store: &mut ProgressStore) -> Result<OpenOutcome, SnapshotServiceError> {
        match self.repo.load().await? {
            Some(snapshot) => {
                store.replace(snapshot);
                info!(course = %store.catalog().id, "restored saved progress");
                Ok(OpenOutcome::Restored)
            }
            None => {
                store.initialize();
                Ok(OpenOutcome::Seeded)
            }
        }
    }

    /// Like [`SnapshotService::open`], but a saved document that is not a valid
    /// progress file is skipped instead of failing, so the caller can replace
    /// it (for example with an imported file).
    ///
    /// # Errors
    ///
    /// Returns `SnapshotServiceError::Storage` if the backing store itself
    /// cannot be read.
    pub async fn open_or_discard(
        &self,
        store: &mut ProgressStore,
    ) -> Result<OpenOutcome, SnapshotServiceError> {
        match self.open(store).await {
            Err(SnapshotServiceError::Storage(StorageError::Snapshot(err))) => {
                warn!(error = %err, "ignoring unreadable progress file");
                Ok(OpenOutcome::Discarded)
            }
            other => other,
        }
    }

    /// Persist the store's snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotServiceError::NotInitialized` for an empty store, or
    /// storage failures.
    pub async fn save(&self, store: &ProgressStore) -> Result<(), SnapshotServiceError> {
        let snapshot = store.snapshot().ok_or(SnapshotServiceError::NotInitialized)?;
        self.repo.save(snapshot).await?;
        Ok(())
    }

    /// Serialize the store's snapshot for download.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotServiceError::NotInitialized` for an empty store.
    pub fn export_text(store: &ProgressStore) -> Result<String, SnapshotServiceError> {
        let snapshot = store.snapshot().ok_or(SnapshotServiceError::NotInitialized)?;
        Ok(snapshot.to_json()?)
    }

    /// Replace the store's snapshot with an uploaded progress file.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotServiceError::Snapshot` for invalid JSON or a wrong
    /// top-level shape; the store keeps its previous snapshot.
    pub fn import_text(store: &mut ProgressStore, text: &str) -> Result<(), SnapshotServiceError> {
        let snapshot = Snapshot::from_json(text).inspect_err(|err| {
            warn!(error = %err, "rejected progress file");
        })?;
        store.replace(snapshot);
        info!(course = %store.catalog().id, "imported progress file");
        Ok(())
    }
}
