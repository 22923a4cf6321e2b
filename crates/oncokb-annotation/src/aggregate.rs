//! Derived views over fetched records: the per-cancer-type frequency series,
//! the oncogenicity histogram and the mutation mapper track.
//! All functions are pure and never reorder their inputs.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use oncokb_common::{AggregationConfig, BiologicalVariant, CancerTypeSampleCount, PortalAlteration};
use oncokb_ordering::Oncogenicity;

/// One bar of the cancer-type frequency chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChartDatum {
    pub cancer_type: String,
    /// Percentage of sequenced samples of this cancer type with a mutation in the gene.
    pub frequency_percent: f64,
    /// The portal alterations that contributed, in input order.
    pub alterations: Vec<PortalAlteration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OncogenicityCount {
    pub oncogenicity: Oncogenicity,
    pub count: usize,
}

/// A portal alteration annotated with what the knowledge base says about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationMapperDatum {
    pub hugo_symbol: String,
    pub protein_change: String,
    pub protein_start: i32,
    pub protein_end: i32,
    pub reference_allele: Option<String>,
    pub variant_allele: Option<String>,
    pub mutation_type: String,
    pub oncogenicity: Oncogenicity,
    pub cancer_type: String,
}

// ── Bar chart ────────────────────────────────────────────────────────────────

/// Per-cancer-type mutation frequency.
///
/// Distinct sample ids per cancer type over that cancer type's sequenced total.
/// Cancer types whose total is not above `min_cohort_samples` (or that have no
/// total at all) are dropped. Sorted by frequency descending, ties by cancer
/// type name, truncated to `max_bar_chart_entries`.
///
/// If a cancer type is listed more than once in `sample_counts`, the smallest
/// total is used.
pub fn bar_chart_data(
    portal: &[PortalAlteration],
    sample_counts: &[CancerTypeSampleCount],
    config: &AggregationConfig,
) -> Vec<BarChartDatum> {
    let mut totals: HashMap<&str, u32> = HashMap::new();
    for entry in sample_counts {
        totals
            .entry(entry.cancer_type.as_str())
            .and_modify(|count| *count = (*count).min(entry.count))
            .or_insert(entry.count);
    }

    let mut groups: BTreeMap<&str, Vec<&PortalAlteration>> = BTreeMap::new();
    for alteration in portal {
        groups.entry(alteration.cancer_type.as_str()).or_default().push(alteration);
    }

    let mut data: Vec<BarChartDatum> = groups
        .into_iter()
        .filter_map(|(cancer_type, alterations)| {
            let total = *totals.get(cancer_type)?;
            if total <= config.min_cohort_samples {
                return None;
            }
            let samples: HashSet<&str> = alterations.iter().map(|a| a.sample_id.as_str()).collect();
            Some(BarChartDatum {
                cancer_type: cancer_type.to_string(),
                frequency_percent: 100.0 * samples.len() as f64 / f64::from(total),
                alterations: alterations.into_iter().cloned().collect(),
            })
        })
        .collect();

    // Stable, so equal frequencies keep the name order from the BTreeMap.
    data.sort_by(|a, b| b.frequency_percent.total_cmp(&a.frequency_percent));
    data.truncate(config.max_bar_chart_entries);
    data
}

/// Bar chart entries whose cancer type is in `cancer_types`; all of them if the set is empty.
pub fn filtered_bar_chart_data(bar_chart: &[BarChartDatum], cancer_types: &BTreeSet<String>) -> Vec<BarChartDatum> {
    if cancer_types.is_empty() {
        return bar_chart.to_vec();
    }
    bar_chart
        .iter()
        .filter(|datum| cancer_types.contains(&datum.cancer_type))
        .cloned()
        .collect()
}

/// Protein changes contributed by the given entries.
pub fn alterations_in(bar_chart: &[BarChartDatum]) -> BTreeSet<String> {
    bar_chart
        .iter()
        .flat_map(|datum| datum.alterations.iter().map(|a| a.protein_change.clone()))
        .collect()
}

/// Protein start positions contributed by the given entries.
pub fn positions_in(bar_chart: &[BarChartDatum]) -> BTreeSet<i32> {
    bar_chart
        .iter()
        .flat_map(|datum| datum.alterations.iter().map(|a| a.protein_start_position))
        .collect()
}

// ── Oncogenicity histogram ───────────────────────────────────────────────────

/// Count biological records per normalized oncogenicity class, in class priority
/// order. Classes with no records are absent.
pub fn oncogenicity_histogram(rows: &[BiologicalVariant]) -> Vec<OncogenicityCount> {
    let mut counts: BTreeMap<Oncogenicity, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(Oncogenicity::normalize(&row.oncogenic)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(oncogenicity, count)| OncogenicityCount { oncogenicity, count })
        .collect()
}

// ── Mutation mapper ──────────────────────────────────────────────────────────

/// Annotate each portal alteration with the biological record sharing its
/// protein change. Unmatched alterations are `Unknown` with no alleles.
/// When several biological records share a protein change the last one wins.
pub fn mutation_mapper_data(portal: &[PortalAlteration], biological: &[BiologicalVariant]) -> Vec<MutationMapperDatum> {
    let by_protein_change: HashMap<&str, &BiologicalVariant> = biological
        .iter()
        .map(|row| (row.variant.name.as_str(), row))
        .collect();

    portal
        .iter()
        .map(|mutation| {
            let known = by_protein_change.get(mutation.protein_change.as_str());
            MutationMapperDatum {
                hugo_symbol: mutation.gene.hugo_symbol.clone(),
                protein_change: mutation.protein_change.clone(),
                protein_start: mutation.protein_start_position,
                protein_end: mutation.protein_end_position,
                reference_allele: known.and_then(|row| row.variant.reference_allele.clone()),
                variant_allele: known.and_then(|row| row.variant.variant_allele.clone()),
                mutation_type: mutation.alteration_type.clone(),
                oncogenicity: known
                    .map(|row| Oncogenicity::normalize(&row.oncogenic))
                    .unwrap_or(Oncogenicity::Unknown),
                cancer_type: mutation.cancer_type.clone(),
            }
        })
        .collect()
}
