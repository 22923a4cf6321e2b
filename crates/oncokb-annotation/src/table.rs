//! Column sorting for the clinical and biological tables.
//!
//! Priority columns (level, oncogenicity, mutation effect) go through the
//! ordering tables, so unrecognised values stay at the bottom whichever way
//! the column is sorted. Every sort falls back to alteration order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use oncokb_common::{Alteration, BiologicalVariant, ClinicalVariant};
use oncokb_ordering::{compare_levels, compare_mutation_effects, compare_oncogenicity, Direction};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    #[default]
    Alteration,
    Level,
    Oncogenicity,
    MutationEffect,
    CancerType,
    Citations,
}

impl SortColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Alteration     => "alteration",
            SortColumn::Level          => "level",
            SortColumn::Oncogenicity   => "oncogenicity",
            SortColumn::MutationEffect => "mutation-effect",
            SortColumn::CancerType     => "cancer-type",
            SortColumn::Citations      => "citations",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "alteration"      => Ok(SortColumn::Alteration),
            "level"           => Ok(SortColumn::Level),
            "oncogenicity"    => Ok(SortColumn::Oncogenicity),
            "mutation-effect" => Ok(SortColumn::MutationEffect),
            "cancer-type"     => Ok(SortColumn::CancerType),
            "citations"       => Ok(SortColumn::Citations),
            other => Err(format!("unknown sort column: {other}")),
        }
    }
}

/// Protein start, then end, then name ignoring case.
pub fn compare_alterations(a: &Alteration, b: &Alteration) -> Ordering {
    a.protein_start
        .cmp(&b.protein_start)
        .then(a.protein_end.cmp(&b.protein_end))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

fn directed(ordering: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Ascending => ordering,
        Direction::Descending => ordering.reverse(),
    }
}

pub fn sort_clinical(rows: &mut [ClinicalVariant], column: SortColumn, direction: Direction) {
    rows.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Level => compare_levels(&a.level, &b.level, direction),
            SortColumn::Oncogenicity => compare_oncogenicity(&a.oncogenic, &b.oncogenic, direction),
            SortColumn::CancerType => directed(
                a.cancer_type.to_lowercase().cmp(&b.cancer_type.to_lowercase()),
                direction,
            ),
            SortColumn::Citations => directed(a.citations.len().cmp(&b.citations.len()), direction),
            SortColumn::Alteration | SortColumn::MutationEffect => {
                directed(compare_alterations(&a.variant, &b.variant), direction)
            }
        };
        primary.then_with(|| compare_alterations(&a.variant, &b.variant))
    });
}

pub fn sort_biological(rows: &mut [BiologicalVariant], column: SortColumn, direction: Direction) {
    rows.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Oncogenicity => compare_oncogenicity(&a.oncogenic, &b.oncogenic, direction),
            SortColumn::MutationEffect => {
                compare_mutation_effects(&a.mutation_effect, &b.mutation_effect, direction)
            }
            SortColumn::Citations => directed(a.citations.len().cmp(&b.citations.len()), direction),
            SortColumn::Alteration | SortColumn::Level | SortColumn::CancerType => {
                directed(compare_alterations(&a.variant, &b.variant), direction)
            }
        };
        primary.then_with(|| compare_alterations(&a.variant, &b.variant))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clinical(name: &str, start: i32, level: &str) -> ClinicalVariant {
        ClinicalVariant {
            variant: Alteration::new(name, start, start),
            cancer_type: "Melanoma".to_string(),
            drugs: Vec::new(),
            level: level.to_string(),
            oncogenic: "Oncogenic".to_string(),
            citations: Default::default(),
        }
    }

    fn biological(name: &str, start: i32, oncogenic: &str, effect: &str) -> BiologicalVariant {
        BiologicalVariant {
            variant: Alteration::new(name, start, start),
            oncogenic: oncogenic.to_string(),
            mutation_effect: effect.to_string(),
            cancer_type: None,
            citations: Default::default(),
        }
    }

    fn names(rows: &[ClinicalVariant]) -> Vec<&str> {
        rows.iter().map(|r| r.variant.name.as_str()).collect()
    }

    #[test]
    fn test_alteration_order_is_positional() {
        let mut rows = vec![clinical("V600E", 600, "1"), clinical("G12C", 12, "1"), clinical("v600a", 600, "1")];
        sort_clinical(&mut rows, SortColumn::Alteration, Direction::Ascending);
        assert_eq!(names(&rows), vec!["G12C", "v600a", "V600E"]);
    }

    #[test]
    fn test_level_sort_keeps_unknown_last() {
        let mut rows = vec![
            clinical("A", 1, "R1"),
            clinical("B", 2, "Dx1"),
            clinical("C", 3, "LEVEL_2A"),
            clinical("D", 4, "1"),
        ];
        sort_clinical(&mut rows, SortColumn::Level, Direction::Ascending);
        assert_eq!(names(&rows), vec!["D", "C", "A", "B"]);

        sort_clinical(&mut rows, SortColumn::Level, Direction::Descending);
        assert_eq!(names(&rows), vec!["A", "C", "D", "B"]);
    }

    #[test]
    fn test_biological_by_mutation_effect_then_position() {
        let mut rows = vec![
            biological("K601E", 601, "Oncogenic", "Loss-of-function"),
            biological("V600E", 600, "Oncogenic", "Gain-of-function"),
            biological("G469A", 469, "Oncogenic", "Gain-of-function"),
        ];
        sort_biological(&mut rows, SortColumn::MutationEffect, Direction::Ascending);
        let order: Vec<&str> = rows.iter().map(|r| r.variant.name.as_str()).collect();
        assert_eq!(order, vec!["G469A", "V600E", "K601E"]);
    }

    #[test]
    fn test_parse_column_names() {
        assert_eq!("mutation_effect".parse::<SortColumn>().unwrap(), SortColumn::MutationEffect);
        assert_eq!("Level".parse::<SortColumn>().unwrap(), SortColumn::Level);
        assert!("drugs".parse::<SortColumn>().is_err());
    }
}
