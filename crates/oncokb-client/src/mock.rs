//! In-memory annotation source for tests and offline runs.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::channel::oneshot;
use tracing::debug;

use oncokb_common::{
    AnnotationQuery, BiologicalVariant, CancerTypeSampleCount, ClinicalVariant, Evidence,
    EvidenceType, Gene, PortalAlteration, VariantAnnotation,
};

use crate::{AnnotationSource, Endpoint};

/// Canned records keyed by gene symbol, built up with the `with_*` methods.
///
/// Endpoints can be made to fail with [`failing`](Self::failing), and single
/// calls can be held open with [`hold`](Self::hold) to order completions by hand.
#[derive(Default)]
pub struct MockAnnotationSource {
    genes: HashMap<String, Gene>,
    evidence: HashMap<(String, EvidenceType), Vec<Evidence>>,
    clinical: HashMap<String, Vec<ClinicalVariant>>,
    biological: HashMap<String, Vec<BiologicalVariant>>,
    portal: HashMap<String, Vec<PortalAlteration>>,
    sample_counts: Vec<CancerTypeSampleCount>,
    annotations: HashMap<String, VariantAnnotation>,
    failing: HashSet<Endpoint>,
    holds: Mutex<HashMap<(Endpoint, String), Vec<oneshot::Receiver<()>>>>,
    calls: Mutex<HashMap<Endpoint, usize>>,
}

impl MockAnnotationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gene. Lookups match the symbol or any alias, ignoring case.
    pub fn with_gene(mut self, gene: Gene) -> Self {
        self.genes.insert(gene.hugo_symbol.to_uppercase(), gene);
        self
    }

    pub fn with_evidence(mut self, hugo_symbol: &str, evidence: Evidence) -> Self {
        self.evidence
            .entry((hugo_symbol.to_string(), evidence.evidence_type))
            .or_default()
            .push(evidence);
        self
    }

    pub fn with_clinical(mut self, hugo_symbol: &str, rows: Vec<ClinicalVariant>) -> Self {
        self.clinical.entry(hugo_symbol.to_string()).or_default().extend(rows);
        self
    }

    pub fn with_biological(mut self, hugo_symbol: &str, rows: Vec<BiologicalVariant>) -> Self {
        self.biological.entry(hugo_symbol.to_string()).or_default().extend(rows);
        self
    }

    pub fn with_portal(mut self, hugo_symbol: &str, rows: Vec<PortalAlteration>) -> Self {
        self.portal.entry(hugo_symbol.to_string()).or_default().extend(rows);
        self
    }

    pub fn with_sample_counts(mut self, counts: Vec<CancerTypeSampleCount>) -> Self {
        self.sample_counts.extend(counts);
        self
    }

    pub fn with_annotation(mut self, hugo_symbol: &str, annotation: VariantAnnotation) -> Self {
        self.annotations.insert(hugo_symbol.to_string(), annotation);
        self
    }

    /// Every call to `endpoint` fails.
    pub fn failing(mut self, endpoint: Endpoint) -> Self {
        self.failing.insert(endpoint);
        self
    }

    /// Hold the next call to `endpoint` for `key` (a gene symbol, or `""` for
    /// sample counts) until the returned sender fires or is dropped.
    pub fn hold(&self, endpoint: Endpoint, key: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.holds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry((endpoint, key.to_string()))
            .or_default()
            .push(rx);
        tx
    }

    /// How many times `endpoint` has been called.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&endpoint)
            .copied()
            .unwrap_or(0)
    }

    /// Count the call, wait on a pending hold, then apply failure injection.
    async fn enter(&self, endpoint: Endpoint, key: &str) -> anyhow::Result<()> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(endpoint)
            .or_default() += 1;

        let hold = {
            let mut holds = self.holds.lock().unwrap_or_else(|e| e.into_inner());
            let queue = holds.entry((endpoint, key.to_string())).or_default();
            let next = if queue.is_empty() { None } else { Some(queue.remove(0)) };
            next
        };
        if let Some(hold) = hold {
            debug!(endpoint = %endpoint, key, "call held");
            // A dropped sender releases the call too.
            let _ = hold.await;
        }

        if self.failing.contains(&endpoint) {
            anyhow::bail!("{endpoint} unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl AnnotationSource for MockAnnotationSource {
    async fn lookup_gene(&self, symbol: &str) -> anyhow::Result<Option<Gene>> {
        self.enter(Endpoint::GeneLookup, symbol).await?;
        let wanted = symbol.trim().to_uppercase();
        if let Some(gene) = self.genes.get(&wanted) {
            return Ok(Some(gene.clone()));
        }
        Ok(self
            .genes
            .values()
            .find(|gene| gene.aliases.iter().any(|alias| alias.to_uppercase() == wanted))
            .cloned())
    }

    async fn lookup_evidence(
        &self,
        hugo_symbol: &str,
        evidence_type: EvidenceType,
        _variant: Option<&str>,
    ) -> anyhow::Result<Vec<Evidence>> {
        self.enter(Endpoint::EvidenceLookup, hugo_symbol).await?;
        Ok(self
            .evidence
            .get(&(hugo_symbol.to_string(), evidence_type))
            .cloned()
            .unwrap_or_default())
    }

    async fn search_clinical_variants(&self, hugo_symbol: &str) -> anyhow::Result<Vec<ClinicalVariant>> {
        self.enter(Endpoint::ClinicalVariants, hugo_symbol).await?;
        Ok(self.clinical.get(hugo_symbol).cloned().unwrap_or_default())
    }

    async fn search_biological_variants(&self, hugo_symbol: &str) -> anyhow::Result<Vec<BiologicalVariant>> {
        self.enter(Endpoint::BiologicalVariants, hugo_symbol).await?;
        Ok(self.biological.get(hugo_symbol).cloned().unwrap_or_default())
    }

    async fn portal_alterations(&self, hugo_symbol: &str) -> anyhow::Result<Vec<PortalAlteration>> {
        self.enter(Endpoint::PortalAlterations, hugo_symbol).await?;
        Ok(self.portal.get(hugo_symbol).cloned().unwrap_or_default())
    }

    async fn portal_sample_counts(&self) -> anyhow::Result<Vec<CancerTypeSampleCount>> {
        self.enter(Endpoint::PortalSampleCounts, "").await?;
        Ok(self.sample_counts.clone())
    }

    async fn variant_annotation(&self, query: &AnnotationQuery) -> anyhow::Result<VariantAnnotation> {
        self.enter(Endpoint::VariantAnnotation, &query.hugo_symbol).await?;
        Ok(self.annotations.get(&query.hugo_symbol).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncokb_common::Alteration;

    fn braf() -> Gene {
        let mut gene = Gene::new("BRAF", 673);
        gene.aliases = vec!["BRAF1".to_string()];
        gene
    }

    #[tokio::test]
    async fn test_gene_lookup_by_symbol_or_alias() {
        let source = MockAnnotationSource::new().with_gene(braf());
        assert_eq!(source.lookup_gene("braf").await.unwrap().unwrap().entrez_gene_id, 673);
        assert_eq!(source.lookup_gene("BRAF1").await.unwrap().unwrap().hugo_symbol, "BRAF");
        assert!(source.lookup_gene("NOPE").await.unwrap().is_none());
        assert_eq!(source.calls(Endpoint::GeneLookup), 3);
    }

    #[tokio::test]
    async fn test_unknown_gene_yields_empty_lists() {
        let source = MockAnnotationSource::new();
        assert!(source.search_clinical_variants("XYZ").await.unwrap().is_empty());
        assert!(source.portal_alterations("XYZ").await.unwrap().is_empty());
        assert_eq!(source.variant_annotation(&AnnotationQuery::default()).await.unwrap(), VariantAnnotation::default());
    }

    #[tokio::test]
    async fn test_failing_endpoint_only() {
        let row = BiologicalVariant {
            variant: Alteration::new("V600E", 600, 600),
            oncogenic: "Oncogenic".to_string(),
            mutation_effect: "Gain-of-function".to_string(),
            cancer_type: None,
            citations: Default::default(),
        };
        let source = MockAnnotationSource::new()
            .with_biological("BRAF", vec![row])
            .failing(Endpoint::ClinicalVariants);

        let err = source.search_clinical_variants("BRAF").await.unwrap_err();
        assert!(err.to_string().contains("clinical_variants"));
        assert_eq!(source.search_biological_variants("BRAF").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_held_call_waits_for_release() {
        let source = std::sync::Arc::new(MockAnnotationSource::new().with_gene(braf()));
        let release = source.hold(Endpoint::GeneLookup, "BRAF");

        let held = {
            let source = std::sync::Arc::clone(&source);
            tokio::spawn(async move { source.lookup_gene("BRAF").await })
        };
        tokio::task::yield_now().await;
        assert!(!held.is_finished());

        // Only the first call is held.
        assert!(source.lookup_gene("BRAF").await.unwrap().is_some());

        release.send(()).unwrap();
        assert!(held.await.unwrap().unwrap().is_some());
    }
}
