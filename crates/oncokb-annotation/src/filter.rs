//! Table filters: oncogenicity, cancer type and protein position.
//!
//! Each dimension is either inactive (empty) or an inclusion set, and active
//! dimensions combine with AND. The cancer-type dimension is a cross-link:
//! a record passes only if its alteration is one of the protein changes that
//! the selected bar-chart cancer types were built from.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use oncokb_common::{Alteration, BiologicalVariant, ClinicalVariant};
use oncokb_ordering::Oncogenicity;

use crate::aggregate::{alterations_in, filtered_bar_chart_data, BarChartDatum};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    oncogenicity_values: BTreeSet<Oncogenicity>,
    cancer_type_values: BTreeSet<String>,
    position_values: BTreeSet<i32>,
    #[serde(skip)]
    revision: u64,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Setters ──────────────────────────────────────────────────────────────

    /// Replace the oncogenicity dimension. An empty input deactivates it.
    pub fn set_oncogenicity<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = Oncogenicity>,
    {
        let values: BTreeSet<Oncogenicity> = values.into_iter().collect();
        if values != self.oncogenicity_values {
            debug!(?values, "oncogenicity filter");
            self.oncogenicity_values = values;
            self.revision += 1;
        }
    }

    pub fn set_cancer_types<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values != self.cancer_type_values {
            debug!(?values, "cancer type filter");
            self.cancer_type_values = values;
            self.revision += 1;
        }
    }

    pub fn set_positions<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = i32>,
    {
        let values: BTreeSet<i32> = values.into_iter().collect();
        if values != self.position_values {
            debug!(?values, "position filter");
            self.position_values = values;
            self.revision += 1;
        }
    }

    /// Clicking a bar selects its cancer type alone; `None` clears the selection.
    pub fn select_bar_chart_cancer_type(&mut self, cancer_type: Option<&str>) {
        match cancer_type {
            Some(cancer_type) => self.set_cancer_types([cancer_type]),
            None => self.set_cancer_types(std::iter::empty::<String>()),
        }
    }

    pub fn clear(&mut self) {
        self.set_oncogenicity([]);
        self.set_cancer_types(std::iter::empty::<String>());
        self.set_positions([]);
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn oncogenicity_values(&self) -> &BTreeSet<Oncogenicity> {
        &self.oncogenicity_values
    }

    pub fn cancer_type_values(&self) -> &BTreeSet<String> {
        &self.cancer_type_values
    }

    pub fn position_values(&self) -> &BTreeSet<i32> {
        &self.position_values
    }

    /// Any dimension active.
    pub fn is_active(&self) -> bool {
        !self.oncogenicity_values.is_empty()
            || !self.cancer_type_values.is_empty()
            || !self.position_values.is_empty()
    }

    /// Bumped on every effective change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Cancer types to highlight in the chart: the selected ones, or else the
    /// ones whose bars contain an alteration at a selected position.
    /// Only affects the chart, never table filtering.
    pub fn highlighted_cancer_types(&self, bar_chart: &[BarChartDatum]) -> BTreeSet<String> {
        if !self.cancer_type_values.is_empty() {
            return self.cancer_type_values.clone();
        }
        if self.position_values.is_empty() {
            return BTreeSet::new();
        }
        bar_chart
            .iter()
            .filter(|datum| {
                datum
                    .alterations
                    .iter()
                    .any(|a| self.position_values.contains(&a.protein_start_position))
            })
            .map(|datum| datum.cancer_type.clone())
            .collect()
    }

    // ── Filtering ────────────────────────────────────────────────────────────

    fn matches(&self, oncogenic: &str, variant: &Alteration, cross_linked: &BTreeSet<String>) -> bool {
        if !self.oncogenicity_values.is_empty()
            && !self.oncogenicity_values.contains(&Oncogenicity::normalize(oncogenic))
        {
            return false;
        }
        if !self.cancer_type_values.is_empty() && !cross_linked.contains(&variant.name) {
            return false;
        }
        if !self.position_values.is_empty() && !self.position_values.contains(&variant.protein_start) {
            return false;
        }
        true
    }

    fn cross_linked_alterations(&self, bar_chart: &[BarChartDatum]) -> BTreeSet<String> {
        if self.cancer_type_values.is_empty() {
            return BTreeSet::new();
        }
        alterations_in(&filtered_bar_chart_data(bar_chart, &self.cancer_type_values))
    }

    /// Clinical rows passing every active dimension. The cancer-type dimension
    /// also requires the row's own cancer type to be selected.
    pub fn filter_clinical(&self, rows: &[ClinicalVariant], bar_chart: &[BarChartDatum]) -> Vec<ClinicalVariant> {
        if !self.is_active() {
            return rows.to_vec();
        }
        let cross_linked = self.cross_linked_alterations(bar_chart);
        rows.iter()
            .filter(|row| {
                (self.cancer_type_values.is_empty() || self.cancer_type_values.contains(&row.cancer_type))
                    && self.matches(&row.oncogenic, &row.variant, &cross_linked)
            })
            .cloned()
            .collect()
    }

    /// Biological rows passing every active dimension. The row's own cancer
    /// type plays no part.
    pub fn filter_biological(&self, rows: &[BiologicalVariant], bar_chart: &[BarChartDatum]) -> Vec<BiologicalVariant> {
        if !self.is_active() {
            return rows.to_vec();
        }
        let cross_linked = self.cross_linked_alterations(bar_chart);
        rows.iter()
            .filter(|row| self.matches(&row.oncogenic, &row.variant, &cross_linked))
            .cloned()
            .collect()
    }
}
