//! Final ordering of an exam's slots.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::combination::Slot;
use crate::model::{is_wildcard, Difficulty, OrderingPolicy};

/// Arrange `slots` according to `policy`.
///
/// `specified_topics` is the configured topic list (wildcards included) and
/// is only consulted for [`OrderingPolicy::AsSpecified`].
pub fn order_slots<R: Rng + ?Sized>(
    policy: OrderingPolicy,
    specified_topics: &[String],
    mut slots: Vec<Slot>,
    rng: &mut R,
) -> Vec<Slot> {
    match policy {
        OrderingPolicy::AsSpecified => as_specified(specified_topics, slots, rng),
        OrderingPolicy::Random => {
            slots.shuffle(rng);
            slots
        }
        OrderingPolicy::EasyMediumFirst => {
            match slots.iter().position(|s| s.difficulty.is_easy_or_medium()) {
                Some(pos) => {
                    let first = slots.remove(pos);
                    slots.shuffle(rng);
                    slots.insert(0, first);
                }
                None => slots.shuffle(rng),
            }
            slots
        }
        OrderingPolicy::VeryHardLast => {
            match slots
                .iter()
                .position(|s| s.difficulty == Difficulty::VeryHard)
            {
                Some(pos) => {
                    let last = slots.remove(pos);
                    slots.shuffle(rng);
                    slots.push(last);
                }
                None => slots.shuffle(rng),
            }
            slots
        }
    }
}

/// Concrete topics go where the list names them; wildcard positions take the
/// wildcard-derived slots in random order.
fn as_specified<R: Rng + ?Sized>(specified: &[String], slots: Vec<Slot>, rng: &mut R) -> Vec<Slot> {
    let mut remaining: Vec<Option<Slot>> = slots.into_iter().map(Some).collect();
    let mut placed: Vec<Option<Slot>> = Vec::with_capacity(remaining.len());

    for topic in specified {
        if is_wildcard(topic) {
            placed.push(None);
            continue;
        }
        let hit = remaining.iter().position(|s| {
            s.as_ref()
                .is_some_and(|s| !s.origin.is_wildcard() && &s.topic == topic)
        });
        placed.push(hit.and_then(|i| remaining[i].take()));
    }

    let mut leftovers: Vec<Slot> = remaining.into_iter().flatten().collect();
    leftovers.shuffle(rng);
    let mut leftovers = leftovers.into_iter();

    let mut ordered: Vec<Slot> = placed
        .into_iter()
        .filter_map(|slot| slot.or_else(|| leftovers.next()))
        .collect();
    ordered.extend(leftovers);
    ordered
}
