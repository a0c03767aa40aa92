use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use thiserror::Error;

use crate::model::catalog::Catalog;
use crate::model::question::QuestionRecord;
use crate::model::topic::TopicRecord;

/// Topics of one module, keyed by topic name in display order.
pub type ModuleTopics = IndexMap<String, TopicRecord>;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("progress file is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("this does not appear to be a valid progress file: {0}")]
    Schema(String),

    #[error("could not encode progress: {0}")]
    Encode(#[source] serde_json::Error),
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// The complete serializable state of one user's progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub modules: IndexMap<String, ModuleTopics>,
    #[serde(rename = "pyqs", alias = "questions")]
    pub questions: IndexMap<String, Vec<QuestionRecord>>,
}

/// Top-level shape accepted on load. Both keys are optional here so that a
/// missing one is reported as a schema problem rather than a parse failure.
#[derive(Deserialize)]
struct SnapshotDocument {
    modules: Option<IndexMap<String, ModuleTopics>>,
    #[serde(alias = "questions")]
    pyqs: Option<IndexMap<String, Vec<QuestionRecord>>>,
}

impl Snapshot {
    /// Default progress for every topic and question in `catalog`.
    #[must_use]
    pub fn seed(catalog: &Catalog) -> Self {
        let modules = catalog
            .modules
            .iter()
            .map(|(module, topics)| {
                let topics = topics
                    .iter()
                    .map(|(name, content)| (name.clone(), TopicRecord::seeded(content)))
                    .collect();
                (module.clone(), topics)
            })
            .collect();
        let questions = catalog
            .pyqs
            .iter()
            .map(|(module, prompts)| {
                let records = prompts
                    .iter()
                    .map(|prompt| QuestionRecord::seeded(prompt.as_str()))
                    .collect();
                (module.clone(), records)
            })
            .collect();
        Self { modules, questions }
    }

    /// Serialize to pretty-printed JSON (two-space indent, declaration order).
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Encode` if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(SnapshotError::Encode)
    }

    /// Parse a progress file.
    ///
    /// Only the top-level shape is enforced; individual topic and question
    /// fields fall back to their defaults when missing or mistyped.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Parse` for malformed JSON and
    /// `SnapshotError::Schema` when `modules` or `pyqs` is missing or has the
    /// wrong shape.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let doc: SnapshotDocument = serde_json::from_str(text).map_err(|err| {
            match err.classify() {
                Category::Data => SnapshotError::Schema(err.to_string()),
                Category::Io | Category::Syntax | Category::Eof => SnapshotError::Parse(err),
            }
        })?;
        let modules = doc
            .modules
            .ok_or_else(|| SnapshotError::Schema("missing top-level `modules`".into()))?;
        let questions = doc
            .pyqs
            .ok_or_else(|| SnapshotError::Schema("missing top-level `pyqs`".into()))?;
        Ok(Self { modules, questions })
    }

    #[must_use]
    pub fn topic(&self, module: &str, topic: &str) -> Option<&TopicRecord> {
        self.modules.get(module)?.get(topic)
    }

    pub fn topic_mut(&mut self, module: &str, topic: &str) -> Option<&mut TopicRecord> {
        self.modules.get_mut(module)?.get_mut(topic)
    }

    #[must_use]
    pub fn question(&self, module: &str, index: usize) -> Option<&QuestionRecord> {
        self.questions.get(module)?.get(index)
    }

    pub fn question_mut(&mut self, module: &str, index: usize) -> Option<&mut QuestionRecord> {
        self.questions.get_mut(module)?.get_mut(index)
    }

    /// Iterate over every topic record across all modules.
    pub fn topics(&self) -> impl Iterator<Item = &TopicRecord> {
        self.modules.values().flat_map(IndexMap::values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attachment::Attachment;
    use crate::model::catalog::Course;
    use crate::model::topic::ConfidenceRating;

    fn seeded() -> Snapshot {
        Snapshot::seed(&Course::Cst301.catalog().unwrap())
    }

    #[test]
    fn seed_mirrors_catalog_shape() {
        let catalog = Course::Cst303.catalog().unwrap();
        let snapshot = Snapshot::seed(&catalog);
        assert_eq!(snapshot.topics().count(), catalog.topic_count());
        assert!(snapshot.topics().all(|t| !t.done && t.notes.is_empty()));
        let (module, prompts) = catalog.pyqs.first().unwrap();
        assert_eq!(snapshot.question(module, 0).unwrap().prompt, prompts[0]);
    }

    #[test]
    fn json_roundtrip_preserves_user_state_and_order() {
        let mut snapshot = seeded();
        let module = snapshot.modules.keys().nth(1).unwrap().clone();
        let topic = snapshot.modules[&module].keys().last().unwrap().clone();
        {
            let record = snapshot.topic_mut(&module, &topic).unwrap();
            record.done = true;
            record.confidence = ConfidenceRating::Low;
            record.notes = "pumping lemma: pick s = a^p b^p".into();
            record.links.push("https://example.com/pl".into());
            record.attachments.push(Attachment::from_upload("pl.png", &[1, 2, 3]).unwrap());
        }
        snapshot.question_mut(&module, 0).unwrap().answer_text = "draft".into();

        let text = snapshot.to_json().unwrap();
        let restored = Snapshot::from_json(&text).unwrap();
        assert_eq!(restored, snapshot);
        assert!(restored.modules.keys().eq(snapshot.modules.keys()));
    }

    #[test]
    fn to_json_uses_two_space_indent_and_persisted_keys() {
        let text = seeded().to_json().unwrap();
        assert!(text.starts_with("{\n  \"modules\": {"));
        assert!(text.contains("\"pyqs\": {"));
        assert!(text.contains("\"my_photos_bytes\": []"));
    }

    #[test]
    fn from_json_rejects_missing_top_level_keys() {
        assert!(matches!(
            Snapshot::from_json(r#"{"foo": 1}"#),
            Err(SnapshotError::Schema(_))
        ));
        assert!(matches!(
            Snapshot::from_json(r#"{"modules": {}}"#),
            Err(SnapshotError::Schema(_))
        ));
        assert!(matches!(
            Snapshot::from_json("[1, 2]"),
            Err(SnapshotError::Schema(_))
        ));
        assert!(matches!(
            Snapshot::from_json(r#"{"modules": [], "pyqs": {}}"#),
            Err(SnapshotError::Schema(_))
        ));
    }

    #[test]
    fn from_json_reports_syntax_errors_as_parse() {
        assert!(matches!(
            Snapshot::from_json("{\"modules\": "),
            Err(SnapshotError::Parse(_))
        ));
        assert!(matches!(
            Snapshot::from_json("not json"),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[test]
    fn from_json_accepts_questions_alias_and_sparse_topics() {
        let snapshot = Snapshot::from_json(
            r#"{"modules": {"M": {"T": {"done": true}}}, "questions": {"M": [{"q": "Why?"}]}}"#,
        )
        .unwrap();
        let topic = snapshot.topic("M", "T").unwrap();
        assert!(topic.done);
        assert!(topic.links.is_empty());
        assert_eq!(topic.confidence, ConfidenceRating::Unset);
        assert_eq!(snapshot.question("M", 0).unwrap().answer_text, "");
    }
}
