use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::model::attachment::Attachment;
use crate::model::catalog::TopicContent;
use crate::model::lenient;

//
// ─── CONFIDENCE ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown confidence rating: {0:?} (expected unset, low, medium or high)")]
pub struct ConfidenceParseError(pub String);

/// Post-completion self-assessment for a topic.
///
/// On disk the rating is stored as the label the user picked, or `null` when
/// unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConfidenceRating {
    #[default]
    Unset,
    Low,
    Medium,
    High,
}

impl ConfidenceRating {
    pub const LOW_LABEL: &'static str = "Not Confident (Need Review)";
    pub const MEDIUM_LABEL: &'static str = "Somewhat Confident";
    pub const HIGH_LABEL: &'static str = "Very Confident (Ready for Exam)";

    /// Persisted label, `None` for `Unset`.
    #[must_use]
    pub fn label(self) -> Option<&'static str> {
        match self {
            ConfidenceRating::Unset => None,
            ConfidenceRating::Low => Some(Self::LOW_LABEL),
            ConfidenceRating::Medium => Some(Self::MEDIUM_LABEL),
            ConfidenceRating::High => Some(Self::HIGH_LABEL),
        }
    }

    /// Map a persisted label back to a rating; anything unrecognised is `Unset`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            Self::LOW_LABEL => ConfidenceRating::Low,
            Self::MEDIUM_LABEL => ConfidenceRating::Medium,
            Self::HIGH_LABEL => ConfidenceRating::High,
            other => other.parse().unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn is_set(self) -> bool {
        self != ConfidenceRating::Unset
    }
}

impl FromStr for ConfidenceRating {
    type Err = ConfidenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unset" | "none" | "" => Ok(ConfidenceRating::Unset),
            "low" => Ok(ConfidenceRating::Low),
            "medium" => Ok(ConfidenceRating::Medium),
            "high" => Ok(ConfidenceRating::High),
            _ => Err(ConfidenceParseError(s.to_string())),
        }
    }
}

impl fmt::Display for ConfidenceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfidenceRating::Unset => "unset",
            ConfidenceRating::Low => "low",
            ConfidenceRating::Medium => "medium",
            ConfidenceRating::High => "high",
        })
    }
}

impl Serialize for ConfidenceRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.label() {
            Some(label) => serializer.serialize_str(label),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for ConfidenceRating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(label) => ConfidenceRating::from_label(&label),
            _ => ConfidenceRating::Unset,
        })
    }
}

//
// ─── TOPIC RECORD ──────────────────────────────────────────────────────────────
//

/// Authored content for one syllabus topic plus the user's progress on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    #[serde(default, deserialize_with = "lenient::string_or_default")]
    pub definition: String,
    #[serde(default, deserialize_with = "lenient::string_or_default")]
    pub pyq_focus: String,
    #[serde(default, deserialize_with = "lenient::string_or_default")]
    pub strategy: String,
    #[serde(default, deserialize_with = "lenient::bool_or_default")]
    pub done: bool,
    #[serde(
        rename = "my_notes",
        default,
        deserialize_with = "lenient::string_or_default"
    )]
    pub notes: String,
    #[serde(
        rename = "my_links",
        default,
        deserialize_with = "lenient::vec_or_default"
    )]
    pub links: Vec<String>,
    #[serde(
        rename = "my_photos_bytes",
        default,
        deserialize_with = "lenient::vec_or_default"
    )]
    pub attachments: Vec<Attachment>,
    #[serde(rename = "survey", default)]
    pub confidence: ConfidenceRating,
}

impl TopicRecord {
    /// Fresh record for an authored topic: not done, no notes, no rating.
    #[must_use]
    pub fn seeded(content: &TopicContent) -> Self {
        Self {
            definition: content.definition.clone(),
            pyq_focus: content.pyq_focus.clone(),
            strategy: content.strategy.clone(),
            done: false,
            notes: String::new(),
            links: Vec::new(),
            attachments: Vec::new(),
            confidence: ConfidenceRating::Unset,
        }
    }

    /// Rating that counts toward the dashboard: only done topics report one.
    #[must_use]
    pub fn effective_confidence(&self) -> ConfidenceRating {
        if self.done {
            self.confidence
        } else {
            ConfidenceRating::Unset
        }
    }
}
