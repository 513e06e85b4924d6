//! Exam history: which questions each student has already been given.
//!
//! The history is append-only during generation. The only mutations outside
//! [`History::record`] are the explicit corrections [`History::remove_exam`]
//! and [`History::replace_question`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CorrectionError;
use crate::model::Question;

/// Student id -> exam type -> questions, in exam order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    exams: BTreeMap<String, BTreeMap<String, Vec<Question>>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exam_exists(&self, student_id: &str, exam_type: &str) -> bool {
        self.exam(student_id, exam_type).is_some()
    }

    /// The questions on one recorded exam.
    pub fn exam(&self, student_id: &str, exam_type: &str) -> Option<&[Question]> {
        self.exams
            .get(student_id)
            .and_then(|types| types.get(exam_type))
            .map(Vec::as_slice)
    }

    /// Questions previously seen, filtered by optional student and exam type.
    ///
    /// `None` for either filter means every student or every exam type.
    pub fn questions_seen(&self, student_id: Option<&str>, exam_type: Option<&str>) -> Vec<&Question> {
        let students: Vec<&BTreeMap<String, Vec<Question>>> = match student_id {
            Some(sid) => self.exams.get(sid).into_iter().collect(),
            None => self.exams.values().collect(),
        };
        students
            .into_iter()
            .flat_map(|types| {
                types
                    .iter()
                    .filter(move |(t, _)| exam_type.is_none_or(|want| t.as_str() == want))
                    .flat_map(|(_, qs)| qs.iter())
            })
            .collect()
    }

    /// Record a newly composed exam. Existing entries are never overwritten.
    ///
    /// Returns `false` (and leaves history untouched) if the student already
    /// has an exam of this type.
    pub fn record(&mut self, student_id: &str, exam_type: &str, questions: Vec<Question>) -> bool {
        let types = self.exams.entry(student_id.to_string()).or_default();
        if types.contains_key(exam_type) {
            tracing::warn!(student_id, exam_type, "exam already recorded; keeping the existing one");
            return false;
        }
        types.insert(exam_type.to_string(), questions);
        true
    }

    /// Every exam type recorded for any student.
    pub fn exam_types(&self) -> BTreeSet<&str> {
        self.exams
            .values()
            .flat_map(|types| types.keys().map(String::as_str))
            .collect()
    }

    pub fn students(&self) -> impl Iterator<Item = &str> {
        self.exams.keys().map(String::as_str)
    }

    /// Number of recorded exams across all students.
    pub fn len(&self) -> usize {
        self.exams.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete one recorded exam so it can be regenerated.
    pub fn remove_exam(&mut self, student_id: &str, exam_type: &str) -> Result<Vec<Question>, CorrectionError> {
        let types = self
            .exams
            .get_mut(student_id)
            .ok_or_else(|| CorrectionError::StudentNotFound(student_id.to_string()))?;
        let removed = types
            .remove(exam_type)
            .ok_or_else(|| CorrectionError::ExamNotFound {
                student_id: student_id.to_string(),
                exam_type: exam_type.to_string(),
            })?;
        if types.is_empty() {
            self.exams.remove(student_id);
        }
        Ok(removed)
    }

    /// Swap one question on a recorded exam for another, keeping its position.
    pub fn replace_question(
        &mut self,
        student_id: &str,
        exam_type: &str,
        old_id: &str,
        replacement: Question,
    ) -> Result<Question, CorrectionError> {
        let types = self
            .exams
            .get_mut(student_id)
            .ok_or_else(|| CorrectionError::StudentNotFound(student_id.to_string()))?;
        let questions = types
            .get_mut(exam_type)
            .ok_or_else(|| CorrectionError::ExamNotFound {
                student_id: student_id.to_string(),
                exam_type: exam_type.to_string(),
            })?;
        let slot = questions
            .iter_mut()
            .find(|q| q.id == old_id)
            .ok_or_else(|| CorrectionError::QuestionNotFound {
                student_id: student_id.to_string(),
                exam_type: exam_type.to_string(),
                question_id: old_id.to_string(),
            })?;
        Ok(std::mem::replace(slot, replacement))
    }

    /// How many times each question id has been given out.
    pub fn exposure_counts(&self, exam_type: Option<&str>) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for q in self.questions_seen(None, exam_type) {
            *counts.entry(q.id.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;

    fn q(id: &str) -> Question {
        Question::new(id, "Syntax", Difficulty::Easy)
    }

    fn sample_history() -> History {
        let mut h = History::new();
        h.record("S1", "midterm", vec![q("A"), q("B")]);
        h.record("S1", "final", vec![q("C")]);
        h.record("S2", "midterm", vec![q("A"), q("D")]);
        h
    }

    #[test]
    fn seen_filters() {
        let h = sample_history();
        assert_eq!(h.questions_seen(Some("S1"), None).len(), 3);
        assert_eq!(h.questions_seen(Some("S1"), Some("midterm")).len(), 2);
        assert_eq!(h.questions_seen(None, Some("midterm")).len(), 4);
        assert_eq!(h.questions_seen(None, None).len(), 5);
        assert!(h.questions_seen(Some("S9"), None).is_empty());
    }

    #[test]
    fn record_never_overwrites() {
        let mut h = sample_history();
        assert!(!h.record("S1", "midterm", vec![q("Z")]));
        let ids: Vec<&str> = h.exam("S1", "midterm").unwrap().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn exam_types_and_exposure() {
        let h = sample_history();
        assert_eq!(h.exam_types().into_iter().collect::<Vec<_>>(), vec!["final", "midterm"]);
        let counts = h.exposure_counts(Some("midterm"));
        assert_eq!(counts.get("A"), Some(&2));
        assert_eq!(counts.get("C"), None);
    }

    #[test]
    fn remove_exam_cleans_up() {
        let mut h = sample_history();
        let removed = h.remove_exam("S2", "midterm").unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!h.exam_exists("S2", "midterm"));
        assert_eq!(h.students().collect::<Vec<_>>(), vec!["S1"]);

        assert_eq!(
            h.remove_exam("S2", "midterm").unwrap_err(),
            CorrectionError::StudentNotFound("S2".into())
        );
        assert!(matches!(
            h.remove_exam("S1", "quiz").unwrap_err(),
            CorrectionError::ExamNotFound { .. }
        ));
    }

    #[test]
    fn replace_question_keeps_position() {
        let mut h = sample_history();
        let old = h.replace_question("S1", "midterm", "A", q("E")).unwrap();
        assert_eq!(old.id, "A");
        let ids: Vec<&str> = h.exam("S1", "midterm").unwrap().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["E", "B"]);

        assert!(matches!(
            h.replace_question("S1", "midterm", "nope", q("F")).unwrap_err(),
            CorrectionError::QuestionNotFound { .. }
        ));
    }

    #[test]
    fn json_shape_is_nested_maps() {
        let h = sample_history();
        let value = serde_json::to_value(&h).unwrap();
        assert!(value["S1"]["midterm"].is_array());
        let back: History = serde_json::from_value(value).unwrap();
        assert_eq!(back, h);
    }
}
