//! Shared error types for the services crate.

use thiserror::Error;

use storage::StorageError;
use study_core::model::{AttachmentError, LinkError, SnapshotError};

/// Errors emitted by `ProgressStore` mutations and lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("progress has not been initialized")]
    NotInitialized,
    #[error("module not found: {module:?}")]
    ModuleNotFound { module: String },
    #[error("topic not found: {topic:?} in {module:?}")]
    TopicNotFound { module: String, topic: String },
    #[error("question {index} not found in {module:?}")]
    QuestionNotFound { module: String, index: usize },
    #[error("no {list} entry at index {index} (list has {len})")]
    IndexOutOfRange {
        list: &'static str,
        index: usize,
        len: usize,
    },
    #[error("mark {topic:?} as done before rating your confidence")]
    ConfidenceRequiresDone { module: String, topic: String },
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

impl ProgressError {
    /// True for the lookup failures (missing module, topic or question).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ProgressError::ModuleNotFound { .. }
                | ProgressError::TopicNotFound { .. }
                | ProgressError::QuestionNotFound { .. }
        )
    }
}

/// Errors emitted by `SnapshotService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapshotServiceError {
    #[error("progress has not been initialized")]
    NotInitialized,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
