//! One query context: the node graph for a gene/variant query, the table
//! filters, and memoized derived views over both.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use oncokb_client::AnnotationSource;
use oncokb_common::{
    AggregationConfig, AnnotationQuery, BiologicalVariant, CancerTypeSampleCount, ClinicalVariant,
    Evidence, EvidenceType, Gene, OncokbConfig, PortalAlteration, QueryConfig, ReferenceGenome,
    VariantAnnotation,
};
use oncokb_ordering::{highest_level, LevelOfEvidence, Oncogenicity};
use oncokb_store::{DataStore, Input, Inputs, Node, NodeId, NodeStatus, Resolved};

use crate::aggregate::{
    self, alterations_in, positions_in, BarChartDatum, MutationMapperDatum, OncogenicityCount,
};
use crate::filter::FilterState;
use crate::memo::Memo;

// ── Node producers ───────────────────────────────────────────────────────────

type Source = Arc<dyn AnnotationSource>;

/// Symbol of the resolved gene, `None` for an unknown gene.
fn resolved_symbol(inputs: &Inputs, gene: Node<Option<Gene>>) -> anyhow::Result<Option<String>> {
    let gene = inputs.get(gene)?;
    Ok(match &*gene {
        Some(gene) => Some(gene.hugo_symbol.clone()),
        None => None,
    })
}

async fn fetch_gene(source: Source, inputs: Inputs, query: Node<String>) -> anyhow::Result<Option<Gene>> {
    let symbol = inputs.get(query)?;
    if symbol.is_empty() {
        return Ok(None);
    }
    let gene = source.lookup_gene(&symbol).await?;
    if gene.is_none() {
        info!(query = %symbol, "unknown gene");
    }
    Ok(gene)
}

/// Description of the first evidence of `evidence_type` on the gene.
async fn fetch_gene_evidence(
    source: Source,
    inputs: Inputs,
    gene: Node<Option<Gene>>,
    evidence_type: EvidenceType,
) -> anyhow::Result<Option<String>> {
    let Some(symbol) = resolved_symbol(&inputs, gene)? else {
        return Ok(None);
    };
    let evidence = source.lookup_evidence(&symbol, evidence_type, None).await?;
    Ok(evidence.into_iter().next().and_then(|e| e.description))
}

async fn fetch_mutation_effect(
    source: Source,
    inputs: Inputs,
    gene: Node<Option<Gene>>,
    alteration: Node<Option<String>>,
) -> anyhow::Result<Vec<Evidence>> {
    let Some(symbol) = resolved_symbol(&inputs, gene)? else {
        return Ok(Vec::new());
    };
    let alteration = inputs.get(alteration)?;
    source
        .lookup_evidence(&symbol, EvidenceType::MutationEffect, alteration.as_deref())
        .await
}

async fn fetch_clinical(source: Source, inputs: Inputs, gene: Node<Option<Gene>>) -> anyhow::Result<Vec<ClinicalVariant>> {
    match resolved_symbol(&inputs, gene)? {
        Some(symbol) => source.search_clinical_variants(&symbol).await,
        None => Ok(Vec::new()),
    }
}

async fn fetch_biological(source: Source, inputs: Inputs, gene: Node<Option<Gene>>) -> anyhow::Result<Vec<BiologicalVariant>> {
    match resolved_symbol(&inputs, gene)? {
        Some(symbol) => source.search_biological_variants(&symbol).await,
        None => Ok(Vec::new()),
    }
}

async fn fetch_portal(source: Source, inputs: Inputs, gene: Node<Option<Gene>>) -> anyhow::Result<Vec<PortalAlteration>> {
    match resolved_symbol(&inputs, gene)? {
        Some(symbol) => source.portal_alterations(&symbol).await,
        None => Ok(Vec::new()),
    }
}

async fn fetch_sample_counts(source: Source) -> anyhow::Result<Vec<CancerTypeSampleCount>> {
    source.portal_sample_counts().await
}

struct AnnotationInputs {
    gene: Node<Option<Gene>>,
    alteration: Node<Option<String>>,
    tumor_type: Node<Option<String>>,
    reference_genome: Node<ReferenceGenome>,
}

async fn fetch_variant_annotation(
    source: Source,
    inputs: Inputs,
    nodes: AnnotationInputs,
) -> anyhow::Result<VariantAnnotation> {
    let Some(hugo_symbol) = resolved_symbol(&inputs, nodes.gene)? else {
        return Ok(VariantAnnotation::default());
    };
    let query = AnnotationQuery {
        hugo_symbol,
        alteration: (*inputs.get(nodes.alteration)?).clone(),
        tumor_type: (*inputs.get(nodes.tumor_type)?).clone(),
        reference_genome: *inputs.get(nodes.reference_genome)?,
    };
    source.variant_annotation(&query).await
}

// ── Graph wiring ─────────────────────────────────────────────────────────────

struct QueryNodes {
    hugo_symbol: Input<String>,
    alteration: Input<Option<String>>,
    tumor_type: Input<Option<String>>,
    reference_genome: Input<ReferenceGenome>,
    gene: Node<Option<Gene>>,
    gene_summary: Node<Option<String>>,
    gene_background: Node<Option<String>>,
    mutation_effect: Node<Vec<Evidence>>,
    clinical: Node<Vec<ClinicalVariant>>,
    biological: Node<Vec<BiologicalVariant>>,
    portal: Node<Vec<PortalAlteration>>,
    sample_counts: Node<Vec<CancerTypeSampleCount>>,
    variant_annotation: Node<VariantAnnotation>,
}

impl QueryNodes {
    fn wire(graph: &mut DataStore, source: &Source, query: &QueryConfig) -> Self {
        let hugo_symbol = graph.input("hugo_symbol", query.hugo_symbol.trim().to_string());
        let alteration = graph.input("alteration", non_empty(query.alteration.as_deref()));
        let tumor_type = graph.input("tumor_type", non_empty(query.tumor_type.as_deref()));
        let reference_genome = graph.input("reference_genome", query.reference_genome);

        let src = Arc::clone(source);
        let gene = graph.node("gene", None, &[hugo_symbol.id()], move |inputs| {
            fetch_gene(Arc::clone(&src), inputs, hugo_symbol.node())
        });

        let src = Arc::clone(source);
        let gene_summary = graph.node("gene_summary", None, &[gene.id()], move |inputs| {
            fetch_gene_evidence(Arc::clone(&src), inputs, gene, EvidenceType::GeneSummary)
        });

        let src = Arc::clone(source);
        let gene_background = graph.node("gene_background", None, &[gene.id()], move |inputs| {
            fetch_gene_evidence(Arc::clone(&src), inputs, gene, EvidenceType::GeneBackground)
        });

        let src = Arc::clone(source);
        let mutation_effect = graph.node(
            "mutation_effect",
            Vec::new(),
            &[gene.id(), alteration.id()],
            move |inputs| fetch_mutation_effect(Arc::clone(&src), inputs, gene, alteration.node()),
        );

        let src = Arc::clone(source);
        let clinical = graph.node("clinical_alterations", Vec::new(), &[gene.id()], move |inputs| {
            fetch_clinical(Arc::clone(&src), inputs, gene)
        });

        let src = Arc::clone(source);
        let biological = graph.node("biological_alterations", Vec::new(), &[gene.id()], move |inputs| {
            fetch_biological(Arc::clone(&src), inputs, gene)
        });

        let src = Arc::clone(source);
        let portal = graph.node("portal_alterations", Vec::new(), &[gene.id()], move |inputs| {
            fetch_portal(Arc::clone(&src), inputs, gene)
        });

        let src = Arc::clone(source);
        let sample_counts = graph.node("portal_sample_counts", Vec::new(), &[], move |_| {
            fetch_sample_counts(Arc::clone(&src))
        });

        let src = Arc::clone(source);
        let variant_annotation = graph.node(
            "variant_annotation",
            VariantAnnotation::default(),
            &[gene.id(), alteration.id(), tumor_type.id(), reference_genome.id()],
            move |inputs| {
                let nodes = AnnotationInputs {
                    gene,
                    alteration: alteration.node(),
                    tumor_type: tumor_type.node(),
                    reference_genome: reference_genome.node(),
                };
                fetch_variant_annotation(Arc::clone(&src), inputs, nodes)
            },
        );

        Self {
            hugo_symbol,
            alteration,
            tumor_type,
            reference_genome,
            gene,
            gene_summary,
            gene_background,
            mutation_effect,
            clinical,
            biological,
            portal,
            sample_counts,
            variant_annotation,
        }
    }

    /// Every fetched (non-input) node.
    fn fetched(&self) -> [NodeId; 9] {
        [
            self.gene.id(),
            self.gene_summary.id(),
            self.gene_background.id(),
            self.mutation_effect.id(),
            self.clinical.id(),
            self.biological.id(),
            self.portal.id(),
            self.sample_counts.id(),
            self.variant_annotation.id(),
        ]
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Memos {
    bar_chart: Memo<Vec<BarChartDatum>>,
    filtered_bar_chart: Memo<Vec<BarChartDatum>>,
    histogram: Memo<Vec<OncogenicityCount>>,
    mutation_mapper: Memo<Vec<MutationMapperDatum>>,
    filtered_clinical: Memo<Vec<ClinicalVariant>>,
    filtered_biological: Memo<Vec<BiologicalVariant>>,
}

/// Annotation data for one gene/variant query.
///
/// Reads never block and never fail: each returns the current value and its
/// status, and the first read of a fetched record starts its fetch. Drive
/// outstanding fetches with [`settle`](Self::settle) or [`pump`](Self::pump).
pub struct AnnotationStore {
    graph: DataStore,
    nodes: QueryNodes,
    filters: FilterState,
    config: AggregationConfig,
    memos: Memos,
}

impl AnnotationStore {
    pub fn new(source: Arc<dyn AnnotationSource>, query: &QueryConfig, config: AggregationConfig) -> Self {
        let mut graph = DataStore::new();
        let nodes = QueryNodes::wire(&mut graph, &source, query);
        debug!(nodes = graph.len(), hugo_symbol = %query.hugo_symbol, "annotation store created");
        Self {
            graph,
            nodes,
            filters: FilterState::new(),
            config,
            memos: Memos::default(),
        }
    }

    pub fn from_config(source: Arc<dyn AnnotationSource>, config: &OncokbConfig) -> Self {
        Self::new(source, &config.query, config.aggregation.clone())
    }

    // ── Query ────────────────────────────────────────────────────────────────

    /// The query as currently set (the symbol as typed, not the resolved gene).
    pub fn query(&self) -> AnnotationQuery {
        AnnotationQuery {
            hugo_symbol: (*self.graph.peek(self.nodes.hugo_symbol.node()).value).clone(),
            alteration: (*self.graph.peek(self.nodes.alteration.node()).value).clone(),
            tumor_type: (*self.graph.peek(self.nodes.tumor_type.node()).value).clone(),
            reference_genome: *self.graph.peek(self.nodes.reference_genome.node()).value,
        }
    }

    /// Change the queried gene. Everything gene-dependent is refetched and the
    /// table filters are cleared. Setting the current value is a no-op.
    pub fn set_hugo_symbol(&mut self, symbol: &str) {
        let symbol = symbol.trim().to_string();
        if *self.graph.peek(self.nodes.hugo_symbol.node()).value == symbol {
            return;
        }
        info!(hugo_symbol = %symbol, "query gene changed");
        self.graph.set_input(self.nodes.hugo_symbol, symbol);
        self.filters.clear();
    }

    pub fn set_alteration(&mut self, alteration: Option<&str>) {
        let alteration = non_empty(alteration);
        if *self.graph.peek(self.nodes.alteration.node()).value == alteration {
            return;
        }
        info!(?alteration, "query alteration changed");
        self.graph.set_input(self.nodes.alteration, alteration);
    }

    pub fn set_tumor_type(&mut self, tumor_type: Option<&str>) {
        let tumor_type = non_empty(tumor_type);
        if *self.graph.peek(self.nodes.tumor_type.node()).value == tumor_type {
            return;
        }
        info!(?tumor_type, "query tumor type changed");
        self.graph.set_input(self.nodes.tumor_type, tumor_type);
    }

    pub fn set_reference_genome(&mut self, reference_genome: ReferenceGenome) {
        if *self.graph.peek(self.nodes.reference_genome.node()).value == reference_genome {
            return;
        }
        info!(%reference_genome, "query reference genome changed");
        self.graph.set_input(self.nodes.reference_genome, reference_genome);
    }

    // ── Fetched records ──────────────────────────────────────────────────────

    /// `None` while pending, and for an unknown gene once complete.
    pub fn gene(&mut self) -> Resolved<Option<Gene>> {
        self.graph.resolve(self.nodes.gene)
    }

    pub fn gene_summary(&mut self) -> Resolved<Option<String>> {
        self.graph.resolve(self.nodes.gene_summary)
    }

    pub fn gene_background(&mut self) -> Resolved<Option<String>> {
        self.graph.resolve(self.nodes.gene_background)
    }

    pub fn mutation_effect(&mut self) -> Resolved<Vec<Evidence>> {
        self.graph.resolve(self.nodes.mutation_effect)
    }

    pub fn clinical_alterations(&mut self) -> Resolved<Vec<ClinicalVariant>> {
        self.graph.resolve(self.nodes.clinical)
    }

    pub fn biological_alterations(&mut self) -> Resolved<Vec<BiologicalVariant>> {
        self.graph.resolve(self.nodes.biological)
    }

    pub fn portal_alterations(&mut self) -> Resolved<Vec<PortalAlteration>> {
        self.graph.resolve(self.nodes.portal)
    }

    pub fn portal_sample_counts(&mut self) -> Resolved<Vec<CancerTypeSampleCount>> {
        self.graph.resolve(self.nodes.sample_counts)
    }

    pub fn variant_annotation(&mut self) -> Resolved<VariantAnnotation> {
        self.graph.resolve(self.nodes.variant_annotation)
    }

    // ── Derived views ────────────────────────────────────────────────────────

    fn revisions(&self, nodes: &[NodeId]) -> Vec<u64> {
        nodes.iter().map(|&id| self.graph.revision(id)).collect()
    }

    pub fn bar_chart_data(&mut self) -> Resolved<Vec<BarChartDatum>> {
        let portal = self.graph.resolve(self.nodes.portal);
        let counts = self.graph.resolve(self.nodes.sample_counts);
        let key = self.revisions(&[self.nodes.portal.id(), self.nodes.sample_counts.id()]);
        let config = &self.config;
        let value = self.memos.bar_chart.get_or_compute(key, || {
            debug!(portal = portal.value.len(), "computing bar chart");
            aggregate::bar_chart_data(&portal.value, &counts.value, config)
        });
        Resolved::new(value, NodeStatus::combine([portal.status, counts.status]))
    }

    /// Bars for the highlighted cancer types: the selected ones, or those hit by
    /// a selected position. The whole chart when neither filter is set.
    pub fn filtered_bar_chart_data(&mut self) -> Resolved<Vec<BarChartDatum>> {
        let chart = self.bar_chart_data();
        let mut key = self.revisions(&[self.nodes.portal.id(), self.nodes.sample_counts.id()]);
        key.push(self.filters.revision());
        let filters = &self.filters;
        let value = self.memos.filtered_bar_chart.get_or_compute(key, || {
            let highlighted = filters.highlighted_cancer_types(&chart.value);
            aggregate::filtered_bar_chart_data(&chart.value, &highlighted)
        });
        Resolved::new(value, chart.status)
    }

    /// Protein changes in the highlighted bars.
    pub fn filtered_alterations_by_bar_chart(&mut self) -> Resolved<Vec<String>> {
        let chart = self.filtered_bar_chart_data();
        Resolved::new(Arc::new(alterations_in(&chart.value).into_iter().collect()), chart.status)
    }

    /// Protein start positions in the highlighted bars.
    pub fn filtered_positions_by_bar_chart(&mut self) -> Resolved<Vec<i32>> {
        let chart = self.filtered_bar_chart_data();
        Resolved::new(Arc::new(positions_in(&chart.value).into_iter().collect()), chart.status)
    }

    pub fn oncogenicity_histogram(&mut self) -> Resolved<Vec<OncogenicityCount>> {
        let biological = self.graph.resolve(self.nodes.biological);
        let key = self.revisions(&[self.nodes.biological.id()]);
        let value = self
            .memos
            .histogram
            .get_or_compute(key, || aggregate::oncogenicity_histogram(&biological.value));
        Resolved::new(value, biological.status)
    }

    pub fn mutation_mapper_data(&mut self) -> Resolved<Vec<MutationMapperDatum>> {
        let portal = self.graph.resolve(self.nodes.portal);
        let biological = self.graph.resolve(self.nodes.biological);
        let key = self.revisions(&[self.nodes.portal.id(), self.nodes.biological.id()]);
        let value = self
            .memos
            .mutation_mapper
            .get_or_compute(key, || aggregate::mutation_mapper_data(&portal.value, &biological.value));
        Resolved::new(value, NodeStatus::combine([portal.status, biological.status]))
    }

    pub fn filtered_clinical_alterations(&mut self) -> Resolved<Vec<ClinicalVariant>> {
        let clinical = self.graph.resolve(self.nodes.clinical);
        if !self.filters.is_active() {
            return clinical;
        }
        let chart = self.bar_chart_data();
        let mut key = self.revisions(&[
            self.nodes.clinical.id(),
            self.nodes.portal.id(),
            self.nodes.sample_counts.id(),
        ]);
        key.push(self.filters.revision());
        let filters = &self.filters;
        let value = self
            .memos
            .filtered_clinical
            .get_or_compute(key, || filters.filter_clinical(&clinical.value, &chart.value));
        let status = if filters.cancer_type_values().is_empty() {
            clinical.status
        } else {
            NodeStatus::combine([clinical.status, chart.status])
        };
        Resolved::new(value, status)
    }

    pub fn filtered_biological_alterations(&mut self) -> Resolved<Vec<BiologicalVariant>> {
        let biological = self.graph.resolve(self.nodes.biological);
        if !self.filters.is_active() {
            return biological;
        }
        let chart = self.bar_chart_data();
        let mut key = self.revisions(&[
            self.nodes.biological.id(),
            self.nodes.portal.id(),
            self.nodes.sample_counts.id(),
        ]);
        key.push(self.filters.revision());
        let filters = &self.filters;
        let value = self
            .memos
            .filtered_biological
            .get_or_compute(key, || filters.filter_biological(&biological.value, &chart.value));
        let status = if filters.cancer_type_values().is_empty() {
            biological.status
        } else {
            NodeStatus::combine([biological.status, chart.status])
        };
        Resolved::new(value, status)
    }

    /// Strongest level of evidence among the clinical rows.
    pub fn highest_level(&mut self) -> Resolved<Option<LevelOfEvidence>> {
        let clinical = self.graph.resolve(self.nodes.clinical);
        let level = highest_level(clinical.value.iter().map(|row| row.level.as_str()));
        Resolved::new(Arc::new(level), clinical.status)
    }

    // ── Filters ──────────────────────────────────────────────────────────────

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_oncogenicity_filter<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = Oncogenicity>,
    {
        self.filters.set_oncogenicity(values);
    }

    pub fn set_cancer_type_filter<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.set_cancer_types(values);
    }

    pub fn set_position_filter<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = i32>,
    {
        self.filters.set_positions(values);
    }

    /// Select one bar of the chart, or clear the selection with `None`.
    pub fn select_bar_chart_cancer_type(&mut self, cancer_type: Option<&str>) {
        self.filters.select_bar_chart_cancer_type(cancer_type);
    }

    pub fn is_filtered(&self) -> bool {
        self.filters.is_active()
    }

    // ── Evaluation ───────────────────────────────────────────────────────────

    /// Wait until every started fetch has finished.
    pub async fn settle(&mut self) {
        self.graph.settle().await;
    }

    /// Wait for the next fetch to finish. `false` when none is outstanding.
    pub async fn step(&mut self) -> bool {
        self.graph.step().await
    }

    /// Apply fetches that already finished, without waiting.
    pub fn pump(&mut self) -> usize {
        self.graph.pump()
    }

    pub fn in_flight(&self) -> usize {
        self.graph.in_flight()
    }

    pub fn stale_discards(&self) -> u64 {
        self.graph.stale_discards()
    }

    /// Failed fetches by node name.
    pub fn errors(&self) -> BTreeMap<&'static str, String> {
        self.nodes
            .fetched()
            .into_iter()
            .filter_map(|id| Some((self.graph.name(id), self.graph.error(id)?.to_string())))
            .collect()
    }

    /// Read every view into one serializable snapshot.
    pub fn snapshot(&mut self) -> AnnotationSnapshot {
        AnnotationSnapshot {
            query: self.query(),
            gene: self.gene().into(),
            gene_summary: self.gene_summary().into(),
            gene_background: self.gene_background().into(),
            mutation_effect: self.mutation_effect().into(),
            variant_annotation: self.variant_annotation().into(),
            highest_level: self.highest_level().into(),
            oncogenicity_histogram: self.oncogenicity_histogram().into(),
            bar_chart_data: self.bar_chart_data().into(),
            filtered_bar_chart_data: self.filtered_bar_chart_data().into(),
            mutation_mapper_data: self.mutation_mapper_data().into(),
            filtered_clinical_alterations: self.filtered_clinical_alterations().into(),
            filtered_biological_alterations: self.filtered_biological_alterations().into(),
            filters: self.filters.clone(),
            is_filtered: self.is_filtered(),
            errors: self
                .errors()
                .into_iter()
                .map(|(node, error)| (node.to_string(), error))
                .collect(),
        }
    }

    /// Tear down the query context. Outstanding fetches are dropped unfinished;
    /// returns how many there were.
    pub fn destroy(self) -> usize {
        let abandoned = self.graph.in_flight();
        info!(abandoned, "annotation store destroyed");
        abandoned
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────────────

/// A value with its status, detached from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View<T> {
    pub status: NodeStatus,
    pub value: T,
}

impl<T: Clone> From<Resolved<T>> for View<T> {
    fn from(resolved: Resolved<T>) -> Self {
        Self {
            status: resolved.status,
            value: (*resolved.value).clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSnapshot {
    pub query: AnnotationQuery,
    pub gene: View<Option<Gene>>,
    pub gene_summary: View<Option<String>>,
    pub gene_background: View<Option<String>>,
    pub mutation_effect: View<Vec<Evidence>>,
    pub variant_annotation: View<VariantAnnotation>,
    pub highest_level: View<Option<LevelOfEvidence>>,
    pub oncogenicity_histogram: View<Vec<OncogenicityCount>>,
    pub bar_chart_data: View<Vec<BarChartDatum>>,
    pub filtered_bar_chart_data: View<Vec<BarChartDatum>>,
    pub mutation_mapper_data: View<Vec<MutationMapperDatum>>,
    pub filtered_clinical_alterations: View<Vec<ClinicalVariant>>,
    pub filtered_biological_alterations: View<Vec<BiologicalVariant>>,
    pub filters: FilterState,
    pub is_filtered: bool,
    pub errors: BTreeMap<String, String>,
}
