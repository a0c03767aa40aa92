use study_core::progress::{self, CompletionSummary, ConfidenceHistogram};

use crate::store::ProgressStore;

/// Per-module completion row, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProgress {
    pub name: String,
    pub completion: CompletionSummary,
}

/// Presentation-agnostic dashboard numbers.
///
/// No pre-formatted strings; the caller decides how to render bars, counts
/// and labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub course_title: String,
    pub completion: CompletionSummary,
    pub confidence: ConfidenceHistogram,
    pub modules: Vec<ModuleProgress>,
    pub question_count: usize,
    pub answered_questions: usize,
}

impl Dashboard {
    /// Summarize the store. An uninitialized store yields an empty dashboard.
    #[must_use]
    pub fn from_store(store: &ProgressStore) -> Self {
        let course_title = store.catalog().title.clone();
        let Some(snapshot) = store.snapshot() else {
            return Self {
                course_title,
                completion: CompletionSummary::default(),
                confidence: ConfidenceHistogram::default(),
                modules: Vec::new(),
                question_count: 0,
                answered_questions: 0,
            };
        };

        let modules = snapshot
            .modules
            .iter()
            .map(|(name, topics)| ModuleProgress {
                name: name.clone(),
                completion: progress::module_completion(topics),
            })
            .collect();
        let questions = snapshot.questions.values().flatten();
        let (question_count, answered_questions) =
            questions.fold((0, 0), |(total, answered), q| {
                (total + 1, answered + usize::from(q.is_answered()))
            });

        Self {
            course_title,
            completion: store.completion(),
            confidence: store.confidence_histogram(),
            modules,
            question_count,
            answered_questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{QuestionField, TopicField};
    use study_core::Course;

    #[test]
    fn empty_store_has_empty_dashboard() {
        let store = ProgressStore::new(Course::Cst301.catalog().unwrap());
        let dashboard = Dashboard::from_store(&store);
        assert_eq!(dashboard.completion.total, 0);
        assert!(dashboard.modules.is_empty());
        assert_eq!(dashboard.course_title, store.catalog().title);
    }

    #[test]
    fn dashboard_tracks_modules_and_answers() {
        let mut store = ProgressStore::new(Course::Cst301.catalog().unwrap());
        store.initialize();
        let module = "Module 3: CFGs and Myhill-Nerode";
        let topic = store.catalog().modules[module].keys().next().unwrap().clone();
        store
            .set_topic_field(module, &topic, TopicField::Done(true))
            .unwrap();
        store
            .set_question_field(module, 2, QuestionField::AnswerText("S -> aSb".into()))
            .unwrap();

        let dashboard = Dashboard::from_store(&store);
        assert_eq!(dashboard.modules.len(), 5);
        let row = dashboard.modules.iter().find(|m| m.name == module).unwrap();
        assert_eq!(row.completion, CompletionSummary { completed: 1, total: 4 });
        assert_eq!(dashboard.completion.completed, 1);
        assert_eq!(dashboard.question_count, store.catalog().question_count());
        assert_eq!(dashboard.answered_questions, 1);
    }
}
