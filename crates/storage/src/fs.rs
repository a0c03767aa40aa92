use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::repository::{SnapshotRepository, StorageError};

/// Keeps the snapshot in a single JSON file, the same document a user would
/// download or upload by hand.
#[derive(Debug, Clone)]
pub struct FileSnapshotRepository {
    path: PathBuf,
}

impl FileSnapshotRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "progress.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotRepository for FileSnapshotRepository {
    async fn load_text(&self) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => {
                debug!(path = %self.path.display(), bytes = text.len(), "read progress file");
                Ok(Some(text))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no progress file yet");
                Ok(None)
            }
            Err(err) => Err(self.io_error(err)),
        }
    }

    async fn save_text(&self, text: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        // The target is only ever replaced whole.
        let staging = self.staging_path();
        let published = match tokio::fs::write(&staging, text).await {
            Ok(()) => tokio::fs::rename(&staging, &self.path).await,
            Err(err) => Err(err),
        };
        if let Err(err) = published {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                debug!(path = %staging.display(), error = %cleanup, "staging file not removed");
            }
            warn!(path = %self.path.display(), error = %err, "failed to save progress file");
            return Err(self.io_error(err));
        }

        info!(path = %self.path.display(), bytes = text.len(), "saved progress file");
        Ok(())
    }
}
