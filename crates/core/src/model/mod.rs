pub mod attachment;
pub mod catalog;
mod lenient;
mod link;
mod question;
mod snapshot;
mod topic;

pub use attachment::{Attachment, AttachmentError, AttachmentKind, AttachmentPreview};
pub use catalog::{Catalog, CatalogError, Course, TopicContent};
pub use link::{LinkError, validate_link};
pub use question::QuestionRecord;
pub use snapshot::{ModuleTopics, Snapshot, SnapshotError};
pub use topic::{ConfidenceParseError, ConfidenceRating, TopicRecord};
