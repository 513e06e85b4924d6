//! Exam composer: turns a session configuration, the question pool and the
//! history into one student's exam.
//!
//! Composition runs in a fixed order: idempotency check, date cutoff,
//! feasibility checks, pinned-pair separation, combination search, pinned
//! merge, ordering, slot filling, and finally a single history write.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combination::{combos_exist, CombinationGenerator, Slot, SlotOrigin};
use crate::error::ComposeError;
use crate::history::History;
use crate::model::{is_wildcard, Difficulty, PinnedPair, Question, SessionConfig};
use crate::ordering::order_slots;
use crate::pool::QuestionPool;
use crate::selector::{Exposure, Tier, UniqueQuestionSelector};

/// Receives progress events while a session runs.
pub trait ProgressReporter {
    fn on_exam_start(&self, student_id: &str, exam_type: &str);
    fn on_exam_complete(&self, exam: &ComposedExam);
    fn on_relaxation(&self, relaxation: &Relaxation);
}

/// A no-op reporter for library use.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_exam_start(&self, _student_id: &str, _exam_type: &str) {}
    fn on_exam_complete(&self, _exam: &ComposedExam) {}
    fn on_relaxation(&self, _relaxation: &Relaxation) {}
}

/// A slot that could only be filled after dropping constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relaxation {
    pub student_id: String,
    pub exam_type: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_id: String,
    pub tier: Tier,
}

/// Result of composing (or re-using) one student's exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedExam {
    pub student_id: String,
    pub exam_type: String,
    pub questions: Vec<Question>,
    pub relaxations: Vec<Relaxation>,
    /// `true` if the exam came from history unchanged.
    pub reused: bool,
}

/// Student groups; members of a group should not share questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentGroups {
    groups: Vec<Vec<String>>,
}

impl StudentGroups {
    pub fn new(groups: Vec<Vec<String>>) -> Self {
        Self { groups }
    }

    /// Everyone who shares at least one group with `student_id`.
    pub fn group_mates(&self, student_id: &str) -> BTreeSet<&str> {
        self.groups
            .iter()
            .filter(|g| g.iter().any(|m| m == student_id))
            .flatten()
            .map(String::as_str)
            .filter(|m| *m != student_id)
            .collect()
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Composes exams for one session.
pub struct ExamComposer<'a> {
    pool: &'a QuestionPool,
    config: &'a SessionConfig,
    groups: &'a StudentGroups,
}

impl<'a> ExamComposer<'a> {
    pub fn new(pool: &'a QuestionPool, config: &'a SessionConfig, groups: &'a StudentGroups) -> Self {
        Self {
            pool,
            config,
            groups,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        self.config
    }

    /// Compose the exam for `student_id` sitting on `exam_date`.
    ///
    /// If history already holds this student's exam of this type it is
    /// returned unchanged and nothing is written. Otherwise the new exam is
    /// recorded exactly once, after every slot is filled.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        history: &mut History,
        student_id: &str,
        exam_date: NaiveDate,
        rng: &mut R,
    ) -> Result<ComposedExam, ComposeError> {
        let exam_type = self.config.exam_type.as_str();

        if let Some(existing) = history.exam(student_id, exam_type) {
            tracing::debug!(student_id, exam_type, "exam already in history; reusing");
            return Ok(ComposedExam {
                student_id: student_id.to_string(),
                exam_type: exam_type.to_string(),
                questions: existing.to_vec(),
                relaxations: Vec::new(),
                reused: true,
            });
        }

        let cutoff = self.config.cutoff.cutoff_for(exam_date);
        let pool = self.pool.questions_of_date_cutoff(cutoff)?;
        let wildcard_candidates = self.check_feasibility(&pool)?;

        let slots = self.plan_slots(&pool, &wildcard_candidates, rng)?;

        let (questions, relaxations) = {
            let mates = self.groups.group_mates(student_id);
            let exposure = Exposure::new(
                student_id,
                history.questions_seen(Some(student_id), None),
                mates
                    .iter()
                    .filter_map(|m| history.exam(m, exam_type))
                    .flatten(),
            );
            let selector = UniqueQuestionSelector::new(&pool, &exposure);

            let mut questions: Vec<Question> = Vec::with_capacity(slots.len());
            let mut relaxations = Vec::new();
            for slot in &slots {
                let selection = selector.select(slot, &questions, rng)?;
                if selection.tier > Tier::A {
                    relaxations.push(Relaxation {
                        student_id: student_id.to_string(),
                        exam_type: exam_type.to_string(),
                        topic: slot.topic.clone(),
                        difficulty: slot.difficulty,
                        question_id: selection.question.id.clone(),
                        tier: selection.tier,
                    });
                }
                questions.push(selection.question);
            }
            (questions, relaxations)
        };

        history.record(student_id, exam_type, questions.clone());
        tracing::info!(
            student_id,
            exam_type,
            questions = questions.len(),
            relaxations = relaxations.len(),
            "composed exam"
        );

        Ok(ComposedExam {
            student_id: student_id.to_string(),
            exam_type: exam_type.to_string(),
            questions,
            relaxations,
            reused: false,
        })
    }

    /// Check the date-restricted pool against the configuration and return
    /// the wildcard candidates that have questions in it.
    pub fn check_feasibility(&self, pool: &QuestionPool) -> Result<Vec<String>, ComposeError> {
        let config = self.config;
        if config.topics.len() != config.difficulties.len() {
            return Err(ComposeError::SlotCountMismatch {
                topics: config.topics.len(),
                difficulties: config.difficulties.len(),
            });
        }

        let mut missing_topics: Vec<String> = Vec::new();
        for topic in config.topics.iter().filter(|t| !is_wildcard(t)) {
            if !pool.has_topic(topic) && !missing_topics.contains(topic) {
                missing_topics.push(topic.clone());
            }
        }
        if !missing_topics.is_empty() {
            return Err(ComposeError::MissingTopics(missing_topics));
        }

        let available = pool.difficulties();
        let missing_diffs: BTreeSet<Difficulty> = config
            .difficulties
            .iter()
            .filter(|d| !available.contains(*d))
            .copied()
            .collect();
        if !missing_diffs.is_empty() {
            return Err(ComposeError::MissingDifficulties(missing_diffs.into_iter().collect()));
        }

        let missing_pins: Vec<PinnedPair> = config
            .pinned
            .iter()
            .filter(|p| !is_wildcard(&p.topic) && pool.count(&p.topic, p.difficulty) == 0)
            .cloned()
            .collect();
        if !missing_pins.is_empty() {
            return Err(ComposeError::MissingPinnedPairs(missing_pins));
        }

        let mut oversubscribed: Vec<PinnedPair> = Vec::new();
        for pin in config.pinned.iter().filter(|p| !is_wildcard(&p.topic)) {
            let wanted = config.pinned.iter().filter(|p| *p == pin).count();
            if wanted > pool.count(&pin.topic, pin.difficulty) && !oversubscribed.contains(pin) {
                oversubscribed.push(pin.clone());
            }
        }
        if !oversubscribed.is_empty() {
            return Err(ComposeError::PinnedPairsOversubscribed(oversubscribed));
        }

        let mut candidates: Vec<String> = Vec::new();
        for topic in &config.wildcard_topics {
            if pool.has_topic(topic) && !candidates.contains(topic) {
                candidates.push(topic.clone());
            }
        }

        let needed = config.topics.iter().filter(|t| is_wildcard(t)).count();
        if needed > candidates.len() {
            return Err(ComposeError::InsufficientWildcardTopics {
                needed,
                available: candidates.len(),
            });
        }
        Ok(candidates)
    }

    /// Pinned separation, combination search, pinned merge and ordering.
    fn plan_slots<R: Rng + ?Sized>(
        &self,
        pool: &QuestionPool,
        wildcard_candidates: &[String],
        rng: &mut R,
    ) -> Result<Vec<Slot>, ComposeError> {
        let config = self.config;
        let mut free_topics = config.topics.clone();
        let mut free_diffs = config.difficulties.clone();
        for pin in &config.pinned {
            if let Some(i) = free_topics.iter().position(|t| *t == pin.topic) {
                free_topics.remove(i);
            }
            if let Some(i) = free_diffs.iter().position(|d| *d == pin.difficulty) {
                free_diffs.remove(i);
            }
        }

        let pinned: Vec<Slot> = config
            .pinned
            .iter()
            .filter(|p| !is_wildcard(&p.topic))
            .map(|p| Slot::new(p.topic.clone(), p.difficulty, SlotOrigin::Pinned))
            .collect();

        let generator = CombinationGenerator::new(pool, wildcard_candidates);
        let mut slots = generator.generate_around(&free_topics, &free_diffs, &pinned, rng)?;
        slots.extend(pinned);

        for pin in config.pinned.iter().filter(|p| is_wildcard(&p.topic)) {
            let open: Vec<&String> = wildcard_candidates
                .iter()
                .filter(|c| {
                    if slots.iter().any(|s| s.origin.is_wildcard() && &s.topic == *c) {
                        return false;
                    }
                    let mut trial = slots.clone();
                    trial.push(Slot::new(c.as_str(), pin.difficulty, SlotOrigin::PinnedWildcard));
                    combos_exist(pool, &trial)
                })
                .collect();
            let Some(topic) = open.choose(rng) else {
                return Err(ComposeError::InsufficientWildcardTopics {
                    needed: config.topics.iter().filter(|t| is_wildcard(t)).count(),
                    available: wildcard_candidates.len(),
                });
            };
            slots.push(Slot::new((*topic).clone(), pin.difficulty, SlotOrigin::PinnedWildcard));
        }

        Ok(order_slots(config.ordering, &config.topics, slots, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CutoffPolicy, OrderingPolicy, WILDCARD};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bank() -> QuestionPool {
        let done = date(2021, 1, 1);
        let mut qs = Vec::new();
        for topic in ["Phonology", "Morphology", "Syntax"] {
            for diff in Difficulty::ALL {
                for i in 0..4 {
                    qs.push(
                        Question::new(format!("{topic}-{diff}-{i}"), topic, diff)
                            .with_source(format!("{topic}-{diff}-{i}-src"))
                            .with_completed(done),
                    );
                }
            }
        }
        QuestionPool::from_questions(qs)
    }

    fn config(topics: &[&str], diffs: &[Difficulty]) -> SessionConfig {
        SessionConfig {
            exam_type: "midterm".into(),
            topics: topics.iter().map(|s| s.to_string()).collect(),
            difficulties: diffs.to_vec(),
            pinned: Vec::new(),
            wildcard_topics: Vec::new(),
            ordering: OrderingPolicy::AsSpecified,
            cutoff: CutoffPolicy::PreviousFriday,
        }
    }

    #[test]
    fn composes_and_records_once() {
        let pool = bank();
        let cfg = config(
            &["Phonology", "Morphology", "Syntax"],
            &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard],
        );
        let groups = StudentGroups::default();
        let composer = ExamComposer::new(&pool, &cfg, &groups);
        let mut history = History::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let exam = composer
            .compose(&mut history, "S1", date(2021, 5, 17), &mut rng)
            .unwrap();
        assert!(!exam.reused);
        assert_eq!(exam.questions.len(), 3);
        let topics: Vec<&str> = exam.questions.iter().map(|q| q.topic.as_str()).collect();
        assert_eq!(topics, vec!["Phonology", "Morphology", "Syntax"]);
        assert_eq!(history.exam("S1", "midterm").unwrap(), exam.questions.as_slice());

        let again = composer
            .compose(&mut history, "S1", date(2021, 5, 17), &mut rng)
            .unwrap();
        assert!(again.reused);
        assert_eq!(again.questions, exam.questions);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn missing_topic_fails_without_touching_history() {
        let pool = bank();
        let cfg = config(&["Semantics"], &[Difficulty::Easy]);
        let groups = StudentGroups::default();
        let composer = ExamComposer::new(&pool, &cfg, &groups);
        let mut history = History::new();
        let err = composer
            .compose(&mut history, "S1", date(2021, 5, 17), &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err, ComposeError::MissingTopics(vec!["Semantics".into()]));
        assert!(history.is_empty());
    }

    #[test]
    fn cutoff_excludes_recent_questions() {
        let pool = bank();
        let cfg = config(&["Syntax"], &[Difficulty::Easy]);
        let groups = StudentGroups::default();
        let composer = ExamComposer::new(&pool, &cfg, &groups);
        let mut history = History::new();
        // Previous Friday of 2021-01-04 is 2021-01-01: still eligible.
        assert!(composer
            .compose(&mut history, "S1", date(2021, 1, 4), &mut ChaCha8Rng::seed_from_u64(0))
            .is_ok());
        // Previous Friday of 2020-12-31 is 2020-12-25: nothing completed yet.
        let err = composer
            .compose(&mut history, "S2", date(2020, 12, 31), &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, ComposeError::NoEligibleQuestions { .. }));
    }

    #[test]
    fn pinned_pair_always_present() {
        let pool = bank();
        let mut cfg = config(
            &["Phonology", "Morphology", "Syntax"],
            &[Difficulty::Easy, Difficulty::Easy, Difficulty::VeryHard],
        );
        cfg.pinned = vec![PinnedPair::new("Syntax", Difficulty::VeryHard)];
        let groups = StudentGroups::default();
        let composer = ExamComposer::new(&pool, &cfg, &groups);
        for seed in 0..10 {
            let mut history = History::new();
            let exam = composer
                .compose(&mut history, "S1", date(2021, 5, 17), &mut ChaCha8Rng::seed_from_u64(seed))
                .unwrap();
            assert!(exam
                .questions
                .iter()
                .any(|q| q.topic == "Syntax" && q.difficulty == Difficulty::VeryHard));
        }
    }

    fn one_each(pairs: &[(&str, Difficulty)]) -> QuestionPool {
        let done = date(2021, 1, 1);
        QuestionPool::from_questions(
            pairs
                .iter()
                .map(|(t, d)| {
                    Question::new(format!("{t}-{d}"), *t, *d)
                        .with_source(format!("{t}-{d}-src"))
                        .with_completed(done)
                })
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn pinned_pair_counts_against_supply() {
        let pool = one_each(&[
            ("A", Difficulty::Easy),
            ("A", Difficulty::Hard),
            ("B", Difficulty::Easy),
            ("B", Difficulty::Hard),
        ]);
        let mut cfg = config(&["A", "A", "B"], &[Difficulty::Easy, Difficulty::Hard, Difficulty::Easy]);
        cfg.pinned = vec![PinnedPair::new("A", Difficulty::Easy)];
        let groups = StudentGroups::default();
        let composer = ExamComposer::new(&pool, &cfg, &groups);
        for seed in 0..20 {
            let mut history = History::new();
            let exam = composer
                .compose(&mut history, "S1", date(2021, 5, 17), &mut ChaCha8Rng::seed_from_u64(seed))
                .unwrap();
            let mut ids: Vec<&str> = exam.questions.iter().map(|q| q.id.as_str()).collect();
            ids.sort();
            assert_eq!(ids, vec!["A-easy", "A-hard", "B-easy"], "seed {seed}");
            assert!(exam.relaxations.is_empty());
        }
    }

    #[test]
    fn oversubscribed_pin_is_a_configuration_error() {
        let pool = one_each(&[("A", Difficulty::Easy), ("B", Difficulty::Easy)]);
        let mut cfg = config(&["A", "A"], &[Difficulty::Easy, Difficulty::Easy]);
        cfg.pinned = vec![PinnedPair::new("A", Difficulty::Easy), PinnedPair::new("A", Difficulty::Easy)];
        let groups = StudentGroups::default();
        let composer = ExamComposer::new(&pool, &cfg, &groups);
        let mut history = History::new();
        let err = composer
            .compose(&mut history, "S1", date(2021, 5, 17), &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::PinnedPairsOversubscribed(vec![PinnedPair::new("A", Difficulty::Easy)])
        );
        assert!(err.is_configuration_error());
        assert!(history.is_empty());
    }

    #[test]
    fn pinned_wildcard_uses_unused_candidate() {
        let pool = bank();
        let mut cfg = config(&[WILDCARD, WILDCARD], &[Difficulty::Easy, Difficulty::Hard]);
        cfg.wildcard_topics = vec!["Phonology".into(), "Syntax".into()];
        cfg.pinned = vec![PinnedPair::new(WILDCARD, Difficulty::Hard)];
        let groups = StudentGroups::default();
        let composer = ExamComposer::new(&pool, &cfg, &groups);
        for seed in 0..10 {
            let mut history = History::new();
            let exam = composer
                .compose(&mut history, "S1", date(2021, 5, 17), &mut ChaCha8Rng::seed_from_u64(seed))
                .unwrap();
            assert_eq!(exam.questions.len(), 2);
            assert_ne!(exam.questions[0].topic, exam.questions[1].topic);
        }
    }

    #[test]
    fn group_mates_get_disjoint_questions() {
        let pool = bank();
        let cfg = config(&["Syntax", "Syntax"], &[Difficulty::Easy, Difficulty::Easy]);
        let groups = StudentGroups::new(vec![vec!["S1".into(), "S2".into()]]);
        let composer = ExamComposer::new(&pool, &cfg, &groups);
        let mut history = History::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a = composer.compose(&mut history, "S1", date(2021, 5, 17), &mut rng).unwrap();
        let b = composer.compose(&mut history, "S2", date(2021, 5, 17), &mut rng).unwrap();
        for q in &b.questions {
            assert!(!a.questions.iter().any(|p| p.id == q.id));
        }
        assert!(b.relaxations.is_empty());
    }

    #[test]
    fn group_mates_union_across_groups() {
        let groups = StudentGroups::new(vec![
            vec!["S1".into(), "S2".into()],
            vec!["S3".into(), "S1".into()],
            vec!["S4".into()],
        ]);
        assert_eq!(groups.group_mates("S1").into_iter().collect::<Vec<_>>(), vec!["S2", "S3"]);
        assert!(groups.group_mates("S4").is_empty());
        assert!(groups.group_mates("S9").is_empty());
    }

    #[test]
    fn exhausted_group_pool_records_relaxation() {
        let done = date(2021, 1, 1);
        let pool = QuestionPool::from_questions(vec![
            Question::new("only", "Syntax", Difficulty::Easy)
                .with_source("only-src")
                .with_completed(done),
        ]);
        let cfg = config(&["Syntax"], &[Difficulty::Easy]);
        let groups = StudentGroups::new(vec![vec!["S1".into(), "S2".into()]]);
        let composer = ExamComposer::new(&pool, &cfg, &groups);
        let mut history = History::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        composer.compose(&mut history, "S1", date(2021, 5, 17), &mut rng).unwrap();
        let b = composer.compose(&mut history, "S2", date(2021, 5, 17), &mut rng).unwrap();
        assert_eq!(b.questions[0].id, "only");
        assert_eq!(b.relaxations.len(), 1);
        assert_eq!(b.relaxations[0].tier, Tier::B);
    }

    #[test]
    fn same_seed_same_exam() {
        let pool = bank();
        let mut cfg = config(
            &["Phonology", WILDCARD, "Syntax"],
            &[Difficulty::Easy, Difficulty::Hard, Difficulty::Medium],
        );
        cfg.wildcard_topics = vec!["Morphology".into(), "Phonology".into()];
        cfg.ordering = OrderingPolicy::Random;
        let groups = StudentGroups::default();
        let composer = ExamComposer::new(&pool, &cfg, &groups);
        let run = |seed| {
            let mut history = History::new();
            composer
                .compose(&mut history, "S1", date(2021, 5, 17), &mut ChaCha8Rng::seed_from_u64(seed))
                .unwrap()
                .questions
        };
        assert_eq!(run(99), run(99));
    }
}
