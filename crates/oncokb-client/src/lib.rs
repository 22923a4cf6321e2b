//! oncokb-client: Remote annotation service access.
//!
//! [`AnnotationSource`] is the seam between the annotation engine and the
//! service. [`HttpAnnotationSource`] talks to a live deployment;
//! [`MockAnnotationSource`] serves canned records for tests and demos.

pub mod http;
pub mod mock;

use std::fmt;

use async_trait::async_trait;
use oncokb_common::{
    AnnotationQuery, BiologicalVariant, CancerTypeSampleCount, ClinicalVariant, Evidence,
    EvidenceType, Gene, PortalAlteration, VariantAnnotation,
};

pub use http::HttpAnnotationSource;
pub use mock::MockAnnotationSource;

/// Common interface for annotation service clients.
///
/// "Not found" is a normal empty result (`None` or an empty list), never an error.
#[async_trait]
pub trait AnnotationSource: Send + Sync {
    /// Resolve a gene symbol or alias to its canonical gene.
    async fn lookup_gene(&self, symbol: &str) -> anyhow::Result<Option<Gene>>;

    async fn lookup_evidence(
        &self,
        hugo_symbol: &str,
        evidence_type: EvidenceType,
        variant: Option<&str>,
    ) -> anyhow::Result<Vec<Evidence>>;

    async fn search_clinical_variants(&self, hugo_symbol: &str) -> anyhow::Result<Vec<ClinicalVariant>>;

    async fn search_biological_variants(&self, hugo_symbol: &str) -> anyhow::Result<Vec<BiologicalVariant>>;

    /// Observed cohort mutations in the gene.
    async fn portal_alterations(&self, hugo_symbol: &str) -> anyhow::Result<Vec<PortalAlteration>>;

    /// Sequenced sample totals per cancer type, independent of any gene.
    async fn portal_sample_counts(&self) -> anyhow::Result<Vec<CancerTypeSampleCount>>;

    async fn variant_annotation(&self, query: &AnnotationQuery) -> anyhow::Result<VariantAnnotation>;
}

/// The service endpoints the engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GeneLookup,
    EvidenceLookup,
    ClinicalVariants,
    BiologicalVariants,
    PortalAlterations,
    PortalSampleCounts,
    VariantAnnotation,
}

impl Endpoint {
    /// Path relative to the service base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::GeneLookup         => "/api/v1/genes/lookup",
            Endpoint::EvidenceLookup     => "/api/v1/evidences/lookup",
            Endpoint::ClinicalVariants   => "/api/private/search/variants/clinical",
            Endpoint::BiologicalVariants => "/api/private/search/variants/biological",
            Endpoint::PortalAlterations  => "/api/private/utils/mutationMapperData",
            Endpoint::PortalSampleCounts => "/api/private/utils/portalAlterationSampleCount",
            Endpoint::VariantAnnotation  => "/api/private/utils/variantAnnotation",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::GeneLookup         => "gene_lookup",
            Endpoint::EvidenceLookup     => "evidence_lookup",
            Endpoint::ClinicalVariants   => "clinical_variants",
            Endpoint::BiologicalVariants => "biological_variants",
            Endpoint::PortalAlterations  => "portal_alterations",
            Endpoint::PortalSampleCounts => "portal_sample_counts",
            Endpoint::VariantAnnotation  => "variant_annotation",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
