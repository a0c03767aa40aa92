use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("unknown course: {0}")]
    UnknownCourse(String),

    #[error("catalog {course} is malformed: {source}")]
    Malformed {
        course: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog has no modules")]
    Empty,

    #[error("module {module:?} has no topics")]
    EmptyModule { module: String },

    #[error("module {module:?} has study content but no practice questions")]
    MissingQuestions { module: String },

    #[error("module {module:?} has practice questions but no study content")]
    MissingTopics { module: String },
}

//
// ─── COURSES ───────────────────────────────────────────────────────────────────
//

/// Built-in syllabi shipped with the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Course {
    /// CST 301, Formal Languages and Automata Theory.
    #[default]
    Cst301,
    /// CST 303, Computer Networks.
    Cst303,
}

impl Course {
    pub const ALL: [Course; 2] = [Course::Cst301, Course::Cst303];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Course::Cst301 => "cst301",
            Course::Cst303 => "cst303",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Course::Cst301 => include_str!("../../catalogs/cst301.json"),
            Course::Cst303 => include_str!("../../catalogs/cst303.json"),
        }
    }

    /// Parse and validate the embedded catalog for this course.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Malformed` if the embedded JSON does not match
    /// the catalog shape, or the structural error from [`Catalog::validate`].
    pub fn catalog(self) -> Result<Catalog, CatalogError> {
        Catalog::parse(self.id(), self.source())
    }
}

impl FromStr for Course {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Course::ALL
            .into_iter()
            .find(|course| course.id().eq_ignore_ascii_case(needle))
            .ok_or_else(|| CatalogError::UnknownCourse(needle.to_string()))
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Authored, read-only material for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicContent {
    pub definition: String,
    pub pyq_focus: String,
    pub strategy: String,
}

/// The static content tree a snapshot is seeded from.
///
/// `modules` and `pyqs` are independent trees sharing module names; only
/// [`Catalog::validate`] checks that they line up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub title: String,
    pub export_file_name: String,
    pub modules: IndexMap<String, IndexMap<String, TopicContent>>,
    pub pyqs: IndexMap<String, Vec<String>>,
}

impl Catalog {
    fn parse(course: &'static str, text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(text)
            .map_err(|source| CatalogError::Malformed { course, source })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check that the authored trees are usable for navigation.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found, in module order.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.modules.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (module, topics) in &self.modules {
            if topics.is_empty() {
                return Err(CatalogError::EmptyModule {
                    module: module.clone(),
                });
            }
            if !self.pyqs.contains_key(module) {
                return Err(CatalogError::MissingQuestions {
                    module: module.clone(),
                });
            }
        }
        if let Some(module) = self.pyqs.keys().find(|m| !self.modules.contains_key(*m)) {
            return Err(CatalogError::MissingTopics {
                module: module.clone(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.modules.values().map(IndexMap::len).sum()
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.pyqs.values().map(Vec::len).sum()
    }
}
