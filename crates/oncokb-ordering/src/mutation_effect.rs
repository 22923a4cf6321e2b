//! Mutation effect ordering.

use std::cmp::Ordering;

use crate::comparator::{compare_ranks, Direction, UNRANKED};

pub const MUTATION_EFFECT_PRIORITY: [&str; 10] = [
    "Gain-of-function",
    "Likely Gain-of-function",
    "Loss-of-function",
    "Likely Loss-of-function",
    "Neutral",
    "Likely Neutral",
    "Switch-of-function",
    "Likely Switch-of-function",
    "Inconclusive",
    "Unknown",
];

pub fn mutation_effect_priority(effect: &str) -> i32 {
    let effect = effect.trim();
    MUTATION_EFFECT_PRIORITY
        .iter()
        .position(|entry| entry.eq_ignore_ascii_case(effect))
        .map_or(UNRANKED, |idx| idx as i32)
}

pub fn compare_mutation_effects(a: &str, b: &str, direction: Direction) -> Ordering {
    compare_ranks(mutation_effect_priority(a), mutation_effect_priority(b), direction)
}
