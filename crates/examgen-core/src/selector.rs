//! Unique-question selector with a fixed relaxation ladder.
//!
//! Each slot is filled by random draws from its topic/difficulty group. A
//! draw is accepted when it satisfies every constraint of the current tier;
//! after [`MAX_ATTEMPTS_PER_TIER`] rejected resamples the selector drops to
//! the next tier. A question already on the exam is never accepted.
//!
//! | tier | distinct subtypes | not on group-mate exam | unseen source | unseen question |
//! |------|-------------------|------------------------|---------------|-----------------|
//! | A    | yes               | yes                    | yes           | yes             |
//! | B    | yes               |                        | yes           | yes             |
//! | C    |                   |                        | yes           | yes             |
//! | D    |                   |                        |               | yes             |

use std::collections::HashSet;
use std::fmt;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combination::Slot;
use crate::error::ComposeError;
use crate::model::Question;
use crate::pool::QuestionPool;

/// Resamples allowed within one tier after the first draw.
pub const MAX_ATTEMPTS_PER_TIER: usize = 50;

/// Relaxation tier a question was accepted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
    D,
}

impl Tier {
    pub const LADDER: [Tier; 4] = [Tier::A, Tier::B, Tier::C, Tier::D];

    fn constraints(self) -> &'static [Constraint] {
        match self {
            Tier::A => &[
                Constraint::UnseenQuestion,
                Constraint::DistinctSubtypes,
                Constraint::NotOnGroupMateExam,
                Constraint::UnseenSource,
            ],
            Tier::B => &[
                Constraint::UnseenQuestion,
                Constraint::DistinctSubtypes,
                Constraint::UnseenSource,
            ],
            Tier::C => &[Constraint::UnseenQuestion, Constraint::UnseenSource],
            Tier::D => &[Constraint::UnseenQuestion],
        }
    }

    /// What a question accepted at this tier may violate.
    pub fn relaxed(self) -> &'static str {
        match self {
            Tier::A => "nothing",
            Tier::B => "group isolation",
            Tier::C => "group isolation and subtype uniqueness",
            Tier::D => "group isolation, subtype uniqueness and source uniqueness",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Constraint {
    DistinctSubtypes,
    NotOnGroupMateExam,
    UnseenSource,
    UnseenQuestion,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::DistinctSubtypes => write!(f, "shares a subtype with this exam"),
            Constraint::NotOnGroupMateExam => write!(f, "on a group-mate's exam"),
            Constraint::UnseenSource => write!(f, "source already seen"),
            Constraint::UnseenQuestion => write!(f, "question already seen"),
        }
    }
}

/// What one student has been exposed to, collected once per exam.
#[derive(Debug, Clone, Default)]
pub struct Exposure {
    pub student_id: String,
    seen_ids: HashSet<String>,
    seen_sources: HashSet<String>,
    group_ids: HashSet<String>,
}

impl Exposure {
    /// `seen` is every question this student has had, on any exam type;
    /// `group_questions` is what their group-mates have on this exam type.
    pub fn new<'q, S, G>(student_id: &str, seen: S, group_questions: G) -> Self
    where
        S: IntoIterator<Item = &'q Question>,
        G: IntoIterator<Item = &'q Question>,
    {
        let mut seen_ids = HashSet::new();
        let mut seen_sources = HashSet::new();
        for q in seen {
            seen_ids.insert(q.id.clone());
            if !q.source.is_empty() {
                seen_sources.insert(q.source.clone());
            }
        }
        Self {
            student_id: student_id.to_string(),
            seen_ids,
            seen_sources,
            group_ids: group_questions.into_iter().map(|q| q.id.clone()).collect(),
        }
    }
}

/// A question chosen for a slot and the tier it was accepted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub question: Question,
    pub tier: Tier,
}

/// Fills slots for one student's exam.
pub struct UniqueQuestionSelector<'a> {
    pool: &'a QuestionPool,
    exposure: &'a Exposure,
}

impl<'a> UniqueQuestionSelector<'a> {
    pub fn new(pool: &'a QuestionPool, exposure: &'a Exposure) -> Self {
        Self { pool, exposure }
    }

    /// Pick a question for `slot` given the questions already on the exam.
    pub fn select<R: Rng + ?Sized>(
        &self,
        slot: &Slot,
        selected: &[Question],
        rng: &mut R,
    ) -> Result<Selection, ComposeError> {
        let eligible = self
            .pool
            .questions_for(Some(&slot.topic), Some(slot.difficulty));
        if eligible.is_empty() {
            return Err(ComposeError::EmptySlot {
                topic: slot.topic.clone(),
                difficulty: slot.difficulty,
            });
        }

        let exam = ExamSoFar::new(selected);

        for (i, tier) in Tier::LADDER.iter().copied().enumerate() {
            let mut last_violations = Vec::new();
            for _ in 0..=MAX_ATTEMPTS_PER_TIER {
                let Some(candidate) = eligible.choose(rng) else {
                    break;
                };
                let violations = self.violations(candidate, &exam, tier);
                if violations.is_empty() {
                    return Ok(Selection {
                        question: (*candidate).clone(),
                        tier,
                    });
                }
                last_violations = violations;
            }

            if let Some(next) = Tier::LADDER.get(i + 1) {
                tracing::warn!(
                    student = %self.exposure.student_id,
                    topic = %slot.topic,
                    difficulty = %slot.difficulty,
                    tier = %next,
                    reason = %join(&last_violations),
                    "relaxing selection constraints"
                );
            }
        }

        // Resampling can miss a lone valid candidate; sweep once in a seeded order.
        let mut order = eligible;
        order.shuffle(rng);
        if let Some(found) = order
            .into_iter()
            .find(|q| self.violations(q, &exam, Tier::D).is_empty())
        {
            tracing::warn!(
                student = %self.exposure.student_id,
                topic = %slot.topic,
                difficulty = %slot.difficulty,
                "accepted question only after exhaustive scan"
            );
            return Ok(Selection {
                question: found.clone(),
                tier: Tier::D,
            });
        }

        Err(ComposeError::SelectionExhausted {
            student_id: self.exposure.student_id.clone(),
            topic: slot.topic.clone(),
            difficulty: slot.difficulty,
        })
    }

    fn violations(&self, q: &Question, exam: &ExamSoFar<'_>, tier: Tier) -> Vec<Constraint> {
        if exam.ids.contains(q.id.as_str()) {
            // Hard constraint; reported as a repeat.
            return vec![Constraint::UnseenQuestion];
        }
        tier.constraints()
            .iter()
            .copied()
            .filter(|c| !self.satisfies(q, exam, *c))
            .collect()
    }

    fn satisfies(&self, q: &Question, exam: &ExamSoFar<'_>, constraint: Constraint) -> bool {
        match constraint {
            Constraint::DistinctSubtypes => q
                .subtypes
                .iter()
                .all(|s| !exam.subtypes.contains(s.as_str())),
            Constraint::NotOnGroupMateExam => !self.exposure.group_ids.contains(&q.id),
            Constraint::UnseenSource => {
                q.source.is_empty() || !self.exposure.seen_sources.contains(&q.source)
            }
            Constraint::UnseenQuestion => !self.exposure.seen_ids.contains(&q.id),
        }
    }
}

struct ExamSoFar<'q> {
    ids: HashSet<&'q str>,
    subtypes: HashSet<&'q str>,
}

impl<'q> ExamSoFar<'q> {
    fn new(selected: &'q [Question]) -> Self {
        Self {
            ids: selected.iter().map(|q| q.id.as_str()).collect(),
            subtypes: selected
                .iter()
                .flat_map(|q| q.subtypes.iter().map(String::as_str))
                .collect(),
        }
    }
}

fn join(constraints: &[Constraint]) -> String {
    constraints
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
