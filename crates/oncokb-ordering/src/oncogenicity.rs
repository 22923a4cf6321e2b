//! Oncogenicity classes.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::comparator::{compare_ranks, Direction, UNRANKED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Oncogenicity {
    #[serde(rename = "Oncogenic")]
    Oncogenic,
    #[serde(rename = "Likely Oncogenic")]
    LikelyOncogenic,
    #[serde(rename = "Predicted Oncogenic")]
    PredictedOncogenic,
    #[serde(rename = "Resistance")]
    Resistance,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Likely Neutral")]
    LikelyNeutral,
    #[serde(rename = "Inconclusive")]
    Inconclusive,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Oncogenicity {
    /// Priority table, most actionable first.
    pub const ALL: [Oncogenicity; 8] = [
        Oncogenicity::Oncogenic,
        Oncogenicity::LikelyOncogenic,
        Oncogenicity::PredictedOncogenic,
        Oncogenicity::Resistance,
        Oncogenicity::Neutral,
        Oncogenicity::LikelyNeutral,
        Oncogenicity::Inconclusive,
        Oncogenicity::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Oncogenicity::Oncogenic          => "Oncogenic",
            Oncogenicity::LikelyOncogenic    => "Likely Oncogenic",
            Oncogenicity::PredictedOncogenic => "Predicted Oncogenic",
            Oncogenicity::Resistance         => "Resistance",
            Oncogenicity::Neutral            => "Neutral",
            Oncogenicity::LikelyNeutral      => "Likely Neutral",
            Oncogenicity::Inconclusive       => "Inconclusive",
            Oncogenicity::Unknown            => "Unknown",
        }
    }

    /// Parse a class name. Case and surrounding whitespace are ignored, and
    /// the legacy table labels `Yes` / `Likely` are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oncogenic" | "yes"            => Some(Oncogenicity::Oncogenic),
            "likely oncogenic" | "likely"  => Some(Oncogenicity::LikelyOncogenic),
            "predicted oncogenic"          => Some(Oncogenicity::PredictedOncogenic),
            "resistance"                   => Some(Oncogenicity::Resistance),
            "neutral"                      => Some(Oncogenicity::Neutral),
            "likely neutral"               => Some(Oncogenicity::LikelyNeutral),
            "inconclusive"                 => Some(Oncogenicity::Inconclusive),
            "unknown"                      => Some(Oncogenicity::Unknown),
            _                              => None,
        }
    }

    /// Canonical class for grouping. Anything unparseable is `Unknown`.
    pub fn normalize(s: &str) -> Self {
        Self::parse(s).unwrap_or(Oncogenicity::Unknown)
    }

    pub fn priority(&self) -> i32 {
        Self::ALL
            .iter()
            .position(|class| class == self)
            .map_or(UNRANKED, |idx| idx as i32)
    }
}

impl fmt::Display for Oncogenicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialOrd for Oncogenicity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered by the priority table, so sets and maps keyed by class iterate
/// most actionable first.
impl Ord for Oncogenicity {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_ranks(self.priority(), other.priority(), Direction::Ascending)
    }
}

/// Index of `class` in the oncogenicity table, or [`UNRANKED`].
pub fn oncogenicity_priority(class: &str) -> i32 {
    Oncogenicity::parse(class).map_or(UNRANKED, |c| c.priority())
}

pub fn compare_oncogenicity(a: &str, b: &str, direction: Direction) -> Ordering {
    compare_ranks(oncogenicity_priority(a), oncogenicity_priority(b), direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order() {
        let names: Vec<&str> = Oncogenicity::ALL.iter().map(|c| c.as_str()).collect();
        let mut shuffled = vec![
            "Unknown", "Resistance", "Likely Neutral", "Oncogenic",
            "Inconclusive", "Predicted Oncogenic", "Neutral", "Likely Oncogenic",
        ];
        shuffled.sort_by(|a, b| compare_oncogenicity(a, b, Direction::Ascending));
        assert_eq!(shuffled, names);
    }

    #[test]
    fn test_parse_aliases_and_case() {
        assert_eq!(Oncogenicity::parse("  likely ONCOGENIC "), Some(Oncogenicity::LikelyOncogenic));
        assert_eq!(Oncogenicity::parse("Yes"), Some(Oncogenicity::Oncogenic));
        assert_eq!(Oncogenicity::parse("Likely"), Some(Oncogenicity::LikelyOncogenic));
        assert_eq!(Oncogenicity::parse("Pathogenic"), None);
        assert_eq!(Oncogenicity::normalize(""), Oncogenicity::Unknown);
    }

    #[test]
    fn test_unrecognized_sorts_last_both_directions() {
        for direction in [Direction::Ascending, Direction::Descending] {
            let mut values = vec!["garbage", "Neutral", "Oncogenic", "Unknown"];
            values.sort_by(|a, b| compare_oncogenicity(a, b, direction));
            assert_eq!(*values.last().unwrap(), "garbage", "{direction:?}");
        }
    }

    #[test]
    fn test_ord_follows_priority() {
        assert!(Oncogenicity::Oncogenic < Oncogenicity::Resistance);
        assert!(Oncogenicity::LikelyNeutral < Oncogenicity::Unknown);
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&Oncogenicity::LikelyNeutral).unwrap();
        assert_eq!(json, "\"Likely Neutral\"");
    }
}
