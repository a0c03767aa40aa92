use serde::{Deserialize, Serialize};

use crate::model::attachment::Attachment;
use crate::model::lenient;

/// A practice question and the user's written and uploaded answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "q", default, deserialize_with = "lenient::string_or_default")]
    pub prompt: String,
    #[serde(
        rename = "my_text",
        default,
        deserialize_with = "lenient::string_or_default"
    )]
    pub answer_text: String,
    #[serde(
        rename = "my_files",
        default,
        deserialize_with = "lenient::vec_or_default"
    )]
    pub attachments: Vec<Attachment>,
}

impl QuestionRecord {
    #[must_use]
    pub fn seeded(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            answer_text: String::new(),
            attachments: Vec::new(),
        }
    }

    /// Whether the user has written or uploaded anything for this question.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        !self.answer_text.trim().is_empty() || !self.attachments.is_empty()
    }
}
