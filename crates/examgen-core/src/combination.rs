//! Combination generator: randomly pair topic slots with difficulty slots
//! until the pool can supply every pair.

use std::collections::HashMap;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ComposeError;
use crate::model::{is_wildcard, Difficulty};
use crate::pool::QuestionPool;

/// Attempts before giving up on finding a satisfiable pairing.
pub const MAX_COMBINATION_ATTEMPTS: usize = 100;

/// Where a slot's topic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotOrigin {
    /// A concrete topic from the topic list.
    Fixed,
    /// A wildcard entry resolved to a candidate topic.
    Wildcard,
    /// A pinned pair with a concrete topic.
    Pinned,
    /// A pinned pair whose topic was a wildcard.
    PinnedWildcard,
}

impl SlotOrigin {
    pub fn is_wildcard(self) -> bool {
        matches!(self, SlotOrigin::Wildcard | SlotOrigin::PinnedWildcard)
    }
}

/// One question position on an exam: a topic and a difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub topic: String,
    pub difficulty: Difficulty,
    pub origin: SlotOrigin,
}

impl Slot {
    pub fn new(topic: impl Into<String>, difficulty: Difficulty, origin: SlotOrigin) -> Self {
        Self {
            topic: topic.into(),
            difficulty,
            origin,
        }
    }
}

/// Can the pool supply every slot, counting repeated pairs against the
/// number of questions available for that pair?
pub fn combos_exist(pool: &QuestionPool, slots: &[Slot]) -> bool {
    let mut used: HashMap<(&str, Difficulty), usize> = HashMap::new();
    slots.iter().all(|slot| {
        let n = used.entry((slot.topic.as_str(), slot.difficulty)).or_insert(0);
        *n += 1;
        *n <= pool.count(&slot.topic, slot.difficulty)
    })
}

/// Draws random topic/difficulty pairings against one pool.
pub struct CombinationGenerator<'a> {
    pool: &'a QuestionPool,
    wildcard_topics: &'a [String],
}

impl<'a> CombinationGenerator<'a> {
    /// `wildcard_topics` should already be limited to topics present in `pool`.
    pub fn new(pool: &'a QuestionPool, wildcard_topics: &'a [String]) -> Self {
        Self {
            pool,
            wildcard_topics,
        }
    }

    /// One random pairing, without checking availability.
    ///
    /// Wildcard entries draw distinct candidate topics. Topics and
    /// difficulties are shuffled independently and zipped.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        topics: &[String],
        difficulties: &[Difficulty],
        rng: &mut R,
    ) -> Result<Vec<Slot>, ComposeError> {
        if topics.len() != difficulties.len() {
            return Err(ComposeError::SlotCountMismatch {
                topics: topics.len(),
                difficulties: difficulties.len(),
            });
        }

        let wild_count = topics.iter().filter(|t| is_wildcard(t)).count();
        if wild_count > self.wildcard_topics.len() {
            return Err(ComposeError::InsufficientWildcardTopics {
                needed: wild_count,
                available: self.wildcard_topics.len(),
            });
        }

        let mut resolved: Vec<(String, SlotOrigin)> = topics
            .iter()
            .filter(|t| !is_wildcard(t))
            .map(|t| (t.clone(), SlotOrigin::Fixed))
            .collect();
        resolved.extend(
            self.wildcard_topics
                .choose_multiple(rng, wild_count)
                .map(|t| (t.clone(), SlotOrigin::Wildcard)),
        );
        resolved.shuffle(rng);

        let mut diffs = difficulties.to_vec();
        diffs.shuffle(rng);

        Ok(resolved
            .into_iter()
            .zip(diffs)
            .map(|((topic, origin), difficulty)| Slot {
                topic,
                difficulty,
                origin,
            })
            .collect())
    }

    /// Propose pairings until one is satisfiable by the pool.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        topics: &[String],
        difficulties: &[Difficulty],
        rng: &mut R,
    ) -> Result<Vec<Slot>, ComposeError> {
        self.generate_around(topics, difficulties, &[], rng)
    }

    /// Like [`generate`](Self::generate), but `reserved` slots (pinned pairs
    /// merged in afterwards) count against the pool's supply too. Only the
    /// proposed slots are returned.
    pub fn generate_around<R: Rng + ?Sized>(
        &self,
        topics: &[String],
        difficulties: &[Difficulty],
        reserved: &[Slot],
        rng: &mut R,
    ) -> Result<Vec<Slot>, ComposeError> {
        for attempt in 1..=MAX_COMBINATION_ATTEMPTS {
            let mut slots = self.propose(topics, difficulties, rng)?;
            let proposed = slots.len();
            slots.extend_from_slice(reserved);
            if combos_exist(self.pool, &slots) {
                slots.truncate(proposed);
                tracing::debug!(attempt, "found satisfiable topic/difficulty pairing");
                return Ok(slots);
            }
        }
        Err(ComposeError::CombinationSearchExhausted {
            attempts: MAX_COMBINATION_ATTEMPTS,
        })
    }
}
