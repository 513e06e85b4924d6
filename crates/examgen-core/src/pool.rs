//! Question pool: bank questions indexed by topic and difficulty.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::error::ComposeError;
use crate::model::{Difficulty, Question, RawQuestion};

/// Questions grouped as topic -> difficulty -> questions, in load order.
///
/// Empty groups are never stored, so every topic and difficulty the pool
/// reports has at least one question behind it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionPool {
    by_topic: BTreeMap<String, BTreeMap<Difficulty, Vec<Question>>>,
}

impl QuestionPool {
    /// Build a pool from raw bank rows, dropping omitted and malformed rows.
    pub fn load<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = RawQuestion>,
    {
        let mut skipped = 0usize;
        let pool = Self::from_questions(rows.into_iter().filter_map(|row| {
            let q = row.into_question();
            if q.is_none() {
                skipped += 1;
            }
            q
        }));
        if skipped > 0 {
            tracing::debug!(skipped, "dropped omitted or incomplete question rows");
        }
        pool
    }

    /// Build a pool from already-validated questions. Omitted ones are skipped.
    pub fn from_questions<I>(questions: I) -> Self
    where
        I: IntoIterator<Item = Question>,
    {
        let mut by_topic: BTreeMap<String, BTreeMap<Difficulty, Vec<Question>>> = BTreeMap::new();
        for q in questions.into_iter().filter(|q| !q.omit) {
            by_topic
                .entry(q.topic.clone())
                .or_default()
                .entry(q.difficulty)
                .or_default()
                .push(q);
        }
        Self { by_topic }
    }

    /// Sub-pool of questions completed on or before `cutoff`.
    ///
    /// Questions with no completion date are never eligible.
    pub fn questions_of_date_cutoff(&self, cutoff: NaiveDate) -> Result<QuestionPool, ComposeError> {
        let restricted = Self::from_questions(
            self.iter()
                .filter(|q| q.is_completed_by(cutoff))
                .cloned(),
        );
        if restricted.is_empty() {
            return Err(ComposeError::NoEligibleQuestions { cutoff });
        }
        Ok(restricted)
    }

    /// Questions matching the optional topic and difficulty filters.
    pub fn questions_for(&self, topic: Option<&str>, difficulty: Option<Difficulty>) -> Vec<&Question> {
        let topics: Vec<&BTreeMap<Difficulty, Vec<Question>>> = match topic {
            Some(t) => self.by_topic.get(t).into_iter().collect(),
            None => self.by_topic.values().collect(),
        };
        topics
            .into_iter()
            .flat_map(|diffs| {
                diffs
                    .iter()
                    .filter(move |(d, _)| difficulty.is_none_or(|want| **d == want))
                    .flat_map(|(_, qs)| qs.iter())
            })
            .collect()
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.by_topic.keys().map(String::as_str)
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.by_topic.contains_key(topic)
    }

    /// Every difficulty present under any topic.
    pub fn difficulties(&self) -> BTreeSet<Difficulty> {
        self.by_topic
            .values()
            .flat_map(|diffs| diffs.keys().copied())
            .collect()
    }

    /// Number of questions for one topic/difficulty pair.
    pub fn count(&self, topic: &str, difficulty: Difficulty) -> usize {
        self.by_topic
            .get(topic)
            .and_then(|diffs| diffs.get(&difficulty))
            .map_or(0, Vec::len)
    }

    /// Question count per difficulty across all topics.
    pub fn difficulty_counts(&self) -> BTreeMap<Difficulty, usize> {
        let mut counts = BTreeMap::new();
        for diffs in self.by_topic.values() {
            for (d, qs) in diffs {
                *counts.entry(*d).or_insert(0) += qs.len();
            }
        }
        counts
    }

    /// Groups in topic then difficulty order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, Difficulty, &[Question])> {
        self.by_topic.iter().flat_map(|(topic, diffs)| {
            diffs
                .iter()
                .map(move |(d, qs)| (topic.as_str(), *d, qs.as_slice()))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.groups().flat_map(|(_, _, qs)| qs.iter())
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.iter().find(|q| q.id == id)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.by_topic.is_empty()
    }
}
