use study_core::model::{
    Attachment, Catalog, ConfidenceRating, QuestionRecord, Snapshot, TopicRecord, validate_link,
};
use study_core::progress::{self, CompletionSummary, ConfidenceHistogram};
use tracing::{debug, info};

use crate::error::ProgressError;

//
// ─── FIELD SELECTORS ───────────────────────────────────────────────────────────
//

/// A scalar user field on a topic, carrying its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicField {
    Done(bool),
    Notes(String),
    Confidence(ConfidenceRating),
}

/// The list-valued user fields on a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicList {
    Links,
    Attachments,
}

impl TopicList {
    fn name(self) -> &'static str {
        match self {
            TopicList::Links => "link",
            TopicList::Attachments => "attachment",
        }
    }
}

/// An entry to append to one of a topic's lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicListItem {
    /// Raw user input; validated and trimmed before it is stored.
    Link(String),
    Attachment(Attachment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionField {
    AnswerText(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionList {
    Attachments,
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Owns one user's progress snapshot for a course.
///
/// The store starts empty; [`ProgressStore::initialize`] seeds it from the
/// catalog exactly once. Every mutation touches one field of one record and
/// hands back the updated record.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    catalog: Catalog,
    snapshot: Option<Snapshot>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            snapshot: None,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Seed from the catalog if no snapshot exists yet. Calling this again is a
    /// no-op and never discards user data.
    pub fn initialize(&mut self) -> &Snapshot {
        let catalog = &self.catalog;
        self.snapshot.get_or_insert_with(|| {
            info!(course = %catalog.id, "seeding progress from catalog");
            Snapshot::seed(catalog)
        })
    }

    /// Wholesale replacement, used when a progress file is loaded.
    pub fn replace(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        self.snapshot.replace(snapshot)
    }

    /// Drop the current snapshot, returning it.
    pub fn clear(&mut self) -> Option<Snapshot> {
        self.snapshot.take()
    }

    // ─── Lookups ───────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `ProgressError` if the store is empty or the topic is unknown.
    pub fn topic(&self, module: &str, topic: &str) -> Result<&TopicRecord, ProgressError> {
        let snapshot = self.snapshot.as_ref().ok_or(ProgressError::NotInitialized)?;
        let topics = snapshot
            .modules
            .get(module)
            .ok_or_else(|| module_not_found(module))?;
        topics
            .get(topic)
            .ok_or_else(|| topic_not_found(module, topic))
    }

    /// # Errors
    ///
    /// Returns `ProgressError` if the store is empty or the question is unknown.
    pub fn question(&self, module: &str, index: usize) -> Result<&QuestionRecord, ProgressError> {
        let snapshot = self.snapshot.as_ref().ok_or(ProgressError::NotInitialized)?;
        let questions = snapshot
            .questions
            .get(module)
            .ok_or_else(|| module_not_found(module))?;
        questions
            .get(index)
            .ok_or_else(|| question_not_found(module, index))
    }

    /// Questions for a module, in display order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the store is empty or the module is unknown.
    pub fn questions(&self, module: &str) -> Result<&[QuestionRecord], ProgressError> {
        let snapshot = self.snapshot.as_ref().ok_or(ProgressError::NotInitialized)?;
        snapshot
            .questions
            .get(module)
            .map(Vec::as_slice)
            .ok_or_else(|| module_not_found(module))
    }

    fn topic_mut(&mut self, module: &str, topic: &str) -> Result<&mut TopicRecord, ProgressError> {
        let snapshot = self.snapshot.as_mut().ok_or(ProgressError::NotInitialized)?;
        let topics = snapshot
            .modules
            .get_mut(module)
            .ok_or_else(|| module_not_found(module))?;
        topics
            .get_mut(topic)
            .ok_or_else(|| topic_not_found(module, topic))
    }

    fn question_mut(
        &mut self,
        module: &str,
        index: usize,
    ) -> Result<&mut QuestionRecord, ProgressError> {
        let snapshot = self.snapshot.as_mut().ok_or(ProgressError::NotInitialized)?;
        let questions = snapshot
            .questions
            .get_mut(module)
            .ok_or_else(|| module_not_found(module))?;
        questions
            .get_mut(index)
            .ok_or_else(|| question_not_found(module, index))
    }

    // ─── Topic mutations ───────────────────────────────────────────────────────

    /// Overwrite one scalar field of a topic.
    ///
    /// Un-marking a topic as done also clears its confidence rating, and a
    /// rating can only be set on a done topic.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` for unknown keys or a rating on an undone topic.
    pub fn set_topic_field(
        &mut self,
        module: &str,
        topic: &str,
        field: TopicField,
    ) -> Result<&TopicRecord, ProgressError> {
        let record = self.topic_mut(module, topic)?;
        match field {
            TopicField::Done(done) => {
                record.done = done;
                if !done {
                    record.confidence = ConfidenceRating::Unset;
                }
                debug!(module, topic, done, "topic completion updated");
            }
            TopicField::Notes(notes) => {
                record.notes = notes;
                debug!(module, topic, len = record.notes.len(), "topic notes updated");
            }
            TopicField::Confidence(rating) => {
                if rating.is_set() && !record.done {
                    return Err(ProgressError::ConfidenceRequiresDone {
                        module: module.to_string(),
                        topic: topic.to_string(),
                    });
                }
                record.confidence = rating;
                debug!(module, topic, %rating, "topic confidence updated");
            }
        }
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns `ProgressError` for unknown keys or an invalid link.
    pub fn append_to_topic_list(
        &mut self,
        module: &str,
        topic: &str,
        item: TopicListItem,
    ) -> Result<&TopicRecord, ProgressError> {
        // Validate before the lookup borrows the record mutably.
        let item = match item {
            TopicListItem::Link(raw) => TopicListItem::Link(validate_link(&raw)?),
            other => other,
        };
        let record = self.topic_mut(module, topic)?;
        match item {
            TopicListItem::Link(link) => {
                debug!(module, topic, link = %link, "link added");
                record.links.push(link);
            }
            TopicListItem::Attachment(attachment) => {
                debug!(module, topic, name = %attachment.name, "attachment added");
                record.attachments.push(attachment);
            }
        }
        Ok(record)
    }

    /// Remove one list entry by position.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::IndexOutOfRange` (leaving the list untouched)
    /// when `index` is past the end, or a lookup error for unknown keys.
    pub fn remove_from_topic_list_at(
        &mut self,
        module: &str,
        topic: &str,
        list: TopicList,
        index: usize,
    ) -> Result<&TopicRecord, ProgressError> {
        let record = self.topic_mut(module, topic)?;
        let len = match list {
            TopicList::Links => record.links.len(),
            TopicList::Attachments => record.attachments.len(),
        };
        if index >= len {
            return Err(ProgressError::IndexOutOfRange {
                list: list.name(),
                index,
                len,
            });
        }
        match list {
            TopicList::Links => {
                record.links.remove(index);
            }
            TopicList::Attachments => {
                record.attachments.remove(index);
            }
        }
        debug!(module, topic, list = list.name(), index, "list entry removed");
        Ok(record)
    }

    /// Encode an uploaded file and attach it to a topic.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Attachment` for unsupported or unnamed files.
    pub fn attach_topic_file(
        &mut self,
        module: &str,
        topic: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<&TopicRecord, ProgressError> {
        let attachment = Attachment::from_upload(name, bytes)?;
        self.append_to_topic_list(module, topic, TopicListItem::Attachment(attachment))
    }

    // ─── Question mutations ────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `ProgressError` for unknown keys.
    pub fn set_question_field(
        &mut self,
        module: &str,
        index: usize,
        field: QuestionField,
    ) -> Result<&QuestionRecord, ProgressError> {
        let record = self.question_mut(module, index)?;
        match field {
            QuestionField::AnswerText(text) => {
                record.answer_text = text;
                debug!(module, index, "answer updated");
            }
        }
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns `ProgressError` for unknown keys.
    pub fn append_to_question_list(
        &mut self,
        module: &str,
        index: usize,
        attachment: Attachment,
    ) -> Result<&QuestionRecord, ProgressError> {
        let record = self.question_mut(module, index)?;
        debug!(module, index, name = %attachment.name, "solution file added");
        record.attachments.push(attachment);
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::IndexOutOfRange` when `position` is past the
    /// end, or a lookup error for unknown keys.
    pub fn remove_from_question_list_at(
        &mut self,
        module: &str,
        index: usize,
        list: QuestionList,
        position: usize,
    ) -> Result<&QuestionRecord, ProgressError> {
        let record = self.question_mut(module, index)?;
        match list {
            QuestionList::Attachments => {
                let len = record.attachments.len();
                if position >= len {
                    return Err(ProgressError::IndexOutOfRange {
                        list: "solution file",
                        index: position,
                        len,
                    });
                }
                record.attachments.remove(position);
            }
        }
        debug!(module, index, position, "solution file removed");
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Attachment` for unsupported or unnamed files.
    pub fn attach_question_file(
        &mut self,
        module: &str,
        index: usize,
        name: &str,
        bytes: &[u8],
    ) -> Result<&QuestionRecord, ProgressError> {
        let attachment = Attachment::from_upload(name, bytes)?;
        self.append_to_question_list(module, index, attachment)
    }

    // ─── Rollups ───────────────────────────────────────────────────────────────

    /// Completion counts; an empty store reports `0 / 0`.
    #[must_use]
    pub fn completion(&self) -> CompletionSummary {
        self.snapshot
            .as_ref()
            .map(progress::compute_completion)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn confidence_histogram(&self) -> ConfidenceHistogram {
        self.snapshot
            .as_ref()
            .map(progress::compute_confidence_histogram)
            .unwrap_or_default()
    }
}

fn module_not_found(module: &str) -> ProgressError {
    ProgressError::ModuleNotFound {
        module: module.to_string(),
    }
}

fn topic_not_found(module: &str, topic: &str) -> ProgressError {
    ProgressError::TopicNotFound {
        module: module.to_string(),
        topic: topic.to_string(),
    }
}

fn question_not_found(module: &str, index: usize) -> ProgressError {
    ProgressError::QuestionNotFound {
        module: module.to_string(),
        index,
    }
}
