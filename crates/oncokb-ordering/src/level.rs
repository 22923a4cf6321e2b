//! Levels of evidence.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::comparator::{compare_ranks, Direction, UNRANKED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelOfEvidence {
    #[serde(rename = "1")]
    Level1,
    #[serde(rename = "2A")]
    Level2A,
    #[serde(rename = "2B")]
    Level2B,
    #[serde(rename = "3A")]
    Level3A,
    #[serde(rename = "3B")]
    Level3B,
    #[serde(rename = "4")]
    Level4,
    #[serde(rename = "R1")]
    LevelR1,
    #[serde(rename = "R2")]
    LevelR2,
}

impl LevelOfEvidence {
    /// Priority table, strongest first.
    pub const ALL: [LevelOfEvidence; 8] = [
        LevelOfEvidence::Level1,
        LevelOfEvidence::Level2A,
        LevelOfEvidence::Level2B,
        LevelOfEvidence::Level3A,
        LevelOfEvidence::Level3B,
        LevelOfEvidence::Level4,
        LevelOfEvidence::LevelR1,
        LevelOfEvidence::LevelR2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelOfEvidence::Level1  => "1",
            LevelOfEvidence::Level2A => "2A",
            LevelOfEvidence::Level2B => "2B",
            LevelOfEvidence::Level3A => "3A",
            LevelOfEvidence::Level3B => "3B",
            LevelOfEvidence::Level4  => "4",
            LevelOfEvidence::LevelR1 => "R1",
            LevelOfEvidence::LevelR2 => "R2",
        }
    }

    /// Accepts bare (`2A`) and service-style (`LEVEL_2A`) spellings.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix("LEVEL_").unwrap_or(s);
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
    }

    pub fn priority(&self) -> i32 {
        Self::ALL
            .iter()
            .position(|level| level == self)
            .map_or(UNRANKED, |idx| idx as i32)
    }
}

impl fmt::Display for LevelOfEvidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of `level` in the level table, or [`UNRANKED`] for malformed input.
pub fn level_priority(level: &str) -> i32 {
    LevelOfEvidence::parse(level).map_or(UNRANKED, |l| l.priority())
}

pub fn compare_levels(a: &str, b: &str, direction: Direction) -> Ordering {
    compare_ranks(level_priority(a), level_priority(b), direction)
}

/// Strongest recognised level among `levels`.
pub fn highest_level<'a, I>(levels: I) -> Option<LevelOfEvidence>
where
    I: IntoIterator<Item = &'a str>,
{
    levels
        .into_iter()
        .filter_map(LevelOfEvidence::parse)
        .min_by_key(|level| level.priority())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_table_order_is_not_lexical() {
        let priorities: Vec<i32> = ["1", "2A", "2B", "3A", "3B", "4", "R1", "R2"]
            .iter()
            .map(|l| level_priority(l))
            .collect();
        assert_eq!(priorities, (0..8).collect::<Vec<_>>());
        // "3B" sorts after "2A" lexically too, but "R1" vs "4" only follows the table.
        assert!(level_priority("4") < level_priority("R1"));
        assert!(level_priority("1") < level_priority("2A"));
    }

    #[test]
    fn test_prefixed_levels_rank_like_bare() {
        assert_eq!(level_priority("LEVEL_2A"), level_priority("2A"));
        assert_eq!(level_priority(" r1 "), level_priority("R1"));
    }

    #[test]
    fn test_malformed_levels_are_unranked() {
        assert_eq!(level_priority("5"), UNRANKED);
        assert_eq!(level_priority(""), UNRANKED);
        assert_eq!(level_priority("LEVEL_"), UNRANKED);
        assert_eq!(level_priority("Dx1"), UNRANKED);
    }

    #[test]
    fn test_sort_levels_with_malformed_entries() {
        let mut levels = vec!["3B", "???", "1", "R2", "2A", ""];
        levels.sort_by(|a, b| compare_levels(a, b, Direction::Ascending));
        assert_eq!(&levels[..4], &["1", "2A", "3B", "R2"]);

        levels.sort_by(|a, b| compare_levels(a, b, Direction::Descending));
        assert_eq!(&levels[..4], &["R2", "3B", "2A", "1"]);
        assert_eq!(level_priority(levels[4]), UNRANKED);
        assert_eq!(level_priority(levels[5]), UNRANKED);
    }

    #[test]
    fn test_highest_level() {
        assert_eq!(highest_level(["3A", "LEVEL_2B", "R1"]), Some(LevelOfEvidence::Level2B));
        assert_eq!(highest_level(["nope"]), None);
    }
}
