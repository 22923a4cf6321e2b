//! Generic priority comparison.

use std::cmp::Ordering;

/// Priority reported for a value that is not in its table.
/// Lower than every real index.
pub const UNRANKED: i32 = -1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Most actionable (lowest index) first.
    #[default]
    Ascending,
    Descending,
}

/// Index of `value` in `table`, or [`UNRANKED`].
pub fn rank_in(table: &[&str], value: &str) -> i32 {
    table
        .iter()
        .position(|entry| *entry == value)
        .map_or(UNRANKED, |idx| idx as i32)
}

/// Compare two table indices. Unranked values go last in both directions
/// and never compare equal to a ranked one.
pub fn compare_ranks(a: i32, b: i32, direction: Direction) -> Ordering {
    match (a <= UNRANKED, b <= UNRANKED) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match direction {
            Direction::Ascending => a.cmp(&b),
            Direction::Descending => b.cmp(&a),
        },
    }
}

pub fn compare_by_priority<T, F>(a: &T, b: &T, priority: F, direction: Direction) -> Ordering
where
    T: ?Sized,
    F: Fn(&T) -> i32,
{
    compare_ranks(priority(a), priority(b), direction)
}
