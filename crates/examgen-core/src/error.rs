//! Error types for exam composition and history corrections.

use std::fmt::Display;

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{Difficulty, PinnedPair};

fn list<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fatal conditions that stop a session. None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("no questions were completed on or before {cutoff}")]
    NoEligibleQuestions { cutoff: NaiveDate },

    #[error("requested topics have no eligible questions: {}", list(.0))]
    MissingTopics(Vec<String>),

    #[error("requested difficulties have no eligible questions: {}", list(.0))]
    MissingDifficulties(Vec<Difficulty>),

    #[error("pinned topic/difficulty pairs have no eligible questions: {}", list(.0))]
    MissingPinnedPairs(Vec<PinnedPair>),

    #[error("pinned topic/difficulty pairs ask for more questions than the bank holds: {}", list(.0))]
    PinnedPairsOversubscribed(Vec<PinnedPair>),

    #[error("{needed} wildcard slot(s) but only {available} eligible wildcard topic(s)")]
    InsufficientWildcardTopics { needed: usize, available: usize },

    #[error("{topics} topic slot(s) but {difficulties} difficulty slot(s)")]
    SlotCountMismatch { topics: usize, difficulties: usize },

    #[error(
        "no satisfiable topic/difficulty pairing after {attempts} attempts; \
         check that the question bank can support the requested distribution"
    )]
    CombinationSearchExhausted { attempts: usize },

    #[error("no eligible questions for {topic} / {difficulty}")]
    EmptySlot {
        topic: String,
        difficulty: Difficulty,
    },

    #[error("student {student_id} has already seen every {topic} / {difficulty} question")]
    SelectionExhausted {
        student_id: String,
        topic: String,
        difficulty: Difficulty,
    },
}

impl ComposeError {
    /// Errors caused by the exam plan or bank as a whole, rather than by one
    /// student's history.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, ComposeError::SelectionExhausted { .. })
    }
}

/// Failures of post-hoc history corrections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrectionError {
    #[error("student {0} not found in history")]
    StudentNotFound(String),

    #[error("student {student_id} has no {exam_type} exam")]
    ExamNotFound {
        student_id: String,
        exam_type: String,
    },

    #[error("question {question_id} is not on {student_id}'s {exam_type} exam")]
    QuestionNotFound {
        student_id: String,
        exam_type: String,
        question_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_list_missing_items() {
        let err = ComposeError::MissingTopics(vec!["Syntax".into(), "Phonology".into()]);
        assert_eq!(
            err.to_string(),
            "requested topics have no eligible questions: Syntax, Phonology"
        );

        let err = ComposeError::MissingPinnedPairs(vec![PinnedPair::new("Syntax", Difficulty::Hard)]);
        assert!(err.to_string().contains("Syntax / hard"));

        let err = ComposeError::PinnedPairsOversubscribed(vec![PinnedPair::new("A", Difficulty::Easy)]);
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("A / easy"));
    }

    #[test]
    fn configuration_classification() {
        assert!(ComposeError::CombinationSearchExhausted { attempts: 100 }.is_configuration_error());
        assert!(!ComposeError::SelectionExhausted {
            student_id: "S1".into(),
            topic: "Syntax".into(),
            difficulty: Difficulty::Easy,
        }
        .is_configuration_error());
    }
}
