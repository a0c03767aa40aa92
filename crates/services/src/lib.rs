#![forbid(unsafe_code)]

pub mod dashboard;
pub mod error;
pub mod snapshot_service;
pub mod store;

pub use dashboard::{Dashboard, ModuleProgress};
pub use error::{ProgressError, SnapshotServiceError};
pub use snapshot_service::{OpenOutcome, SnapshotService};
pub use store::{
    ProgressStore, QuestionField, QuestionList, TopicField, TopicList, TopicListItem,
};
