//! Core record types returned by the annotation service.
//! Field names follow the service's camelCase JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OncokbError;

// ---------------------------------------------------------------------------
// Gene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gene {
    pub hugo_symbol: String,
    pub entrez_gene_id: i64,
    #[serde(default, rename = "geneAliases")]
    pub aliases: Vec<String>,
}

impl Gene {
    pub fn new(hugo_symbol: impl Into<String>, entrez_gene_id: i64) -> Self {
        Self {
            hugo_symbol: hugo_symbol.into(),
            entrez_gene_id,
            aliases: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Alteration / variant
// ---------------------------------------------------------------------------

/// A protein-level change within a gene. `name` is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alteration {
    #[serde(rename = "alteration")]
    pub name: String,
    pub protein_start: i32,
    pub protein_end: i32,
    #[serde(default, rename = "refResidues")]
    pub reference_allele: Option<String>,
    #[serde(default, rename = "variantResidues")]
    pub variant_allele: Option<String>,
    #[serde(default)]
    pub consequence_term: String,
}

impl Alteration {
    pub fn new(name: impl Into<String>, protein_start: i32, protein_end: i32) -> Self {
        Self {
            name: name.into(),
            protein_start,
            protein_end,
            reference_allele: None,
            variant_allele: None,
            consequence_term: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abstract {
    #[serde(rename = "abstract")]
    pub text: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citations {
    #[serde(default)]
    pub pmids: Vec<String>,
    #[serde(default)]
    pub abstracts: Vec<Abstract>,
}

impl Citations {
    pub fn len(&self) -> usize {
        self.pmids.len() + self.abstracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Clinical / biological evidence rows
// ---------------------------------------------------------------------------

/// One row per (alteration, cancer type, drug set, level).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalVariant {
    pub variant: Alteration,
    pub cancer_type: String,
    #[serde(default)]
    pub drugs: Vec<String>,
    pub level: String,
    /// Oncogenicity of the alteration, as reported alongside the clinical row.
    #[serde(default)]
    pub oncogenic: String,
    #[serde(default, rename = "drugCitations")]
    pub citations: Citations,
}

/// One row per alteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiologicalVariant {
    pub variant: Alteration,
    #[serde(default)]
    pub oncogenic: String,
    #[serde(default)]
    pub mutation_effect: String,
    /// Cancer type recorded on the evidence itself. Not used for cross-filtering.
    #[serde(default)]
    pub cancer_type: Option<String>,
    #[serde(default, rename = "mutationEffectCitations")]
    pub citations: Citations,
}

// ---------------------------------------------------------------------------
// Portal (sequencing cohort) statistics
// ---------------------------------------------------------------------------

/// An observed mutation in a sequenced sample. Only used for frequency statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalAlteration {
    pub gene: Gene,
    pub protein_change: String,
    pub protein_start_position: i32,
    #[serde(default)]
    pub protein_end_position: i32,
    #[serde(default)]
    pub alteration_type: String,
    pub cancer_type: String,
    pub sample_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancerTypeSampleCount {
    pub cancer_type: String,
    pub count: u32,
}

impl CancerTypeSampleCount {
    pub fn new(cancer_type: impl Into<String>, count: u32) -> Self {
        Self { cancer_type: cancer_type.into(), count }
    }
}

// ---------------------------------------------------------------------------
// Evidence lookups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceType {
    GeneSummary,
    GeneBackground,
    MutationEffect,
    Oncogenic,
}

impl EvidenceType {
    /// Serialize to the query-string value the service expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::GeneSummary    => "GENE_SUMMARY",
            EvidenceType::GeneBackground => "GENE_BACKGROUND",
            EvidenceType::MutationEffect => "MUTATION_EFFECT",
            EvidenceType::Oncogenic      => "ONCOGENIC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub evidence_type: EvidenceType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub known_effect: Option<String>,
    #[serde(default)]
    pub level_of_evidence: Option<String>,
}

// ---------------------------------------------------------------------------
// Variant annotation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceGenome {
    #[default]
    GRCh37,
    GRCh38,
}

impl ReferenceGenome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceGenome::GRCh37 => "GRCh37",
            ReferenceGenome::GRCh38 => "GRCh38",
        }
    }
}

impl fmt::Display for ReferenceGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceGenome {
    type Err = OncokbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grch37" | "hg19" => Ok(ReferenceGenome::GRCh37),
            "grch38" | "hg38" => Ok(ReferenceGenome::GRCh38),
            other => Err(OncokbError::Config(format!("unknown reference genome: {other}"))),
        }
    }
}

/// Everything the variant annotation endpoint needs to identify a variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationQuery {
    pub hugo_symbol: String,
    pub alteration: Option<String>,
    pub tumor_type: Option<String>,
    pub reference_genome: ReferenceGenome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationEffectSummary {
    #[serde(default)]
    pub known_effect: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    #[serde(default)]
    pub drugs: Vec<String>,
    pub level: String,
    #[serde(default)]
    pub cancer_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantAnnotation {
    #[serde(default)]
    pub gene_exist: bool,
    #[serde(default)]
    pub variant_exist: bool,
    #[serde(default)]
    pub oncogenic: String,
    #[serde(default)]
    pub mutation_effect: MutationEffectSummary,
    #[serde(default)]
    pub highest_sensitive_level: Option<String>,
    #[serde(default)]
    pub highest_resistance_level: Option<String>,
    #[serde(default)]
    pub treatments: Vec<Treatment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clinical_variant_deserializes_service_json() {
        let json = r#"{
            "variant": {
                "alteration": "V600E",
                "proteinStart": 600,
                "proteinEnd": 600,
                "refResidues": "V",
                "variantResidues": "E",
                "consequenceTerm": "missense_variant"
            },
            "cancerType": "Melanoma",
            "drugs": ["Dabrafenib", "Trametinib"],
            "level": "1",
            "oncogenic": "Oncogenic",
            "drugCitations": { "pmids": ["25399551"], "abstracts": [] }
        }"#;
        let row: ClinicalVariant = serde_json::from_str(json).unwrap();
        assert_eq!(row.variant.name, "V600E");
        assert_eq!(row.variant.reference_allele.as_deref(), Some("V"));
        assert_eq!(row.drugs.len(), 2);
        assert_eq!(row.citations.len(), 1);
    }

    #[test]
    fn test_biological_variant_defaults_missing_fields() {
        let json = r#"{ "variant": { "alteration": "K601E", "proteinStart": 601, "proteinEnd": 601 } }"#;
        let row: BiologicalVariant = serde_json::from_str(json).unwrap();
        assert_eq!(row.oncogenic, "");
        assert!(row.citations.is_empty());
        assert!(row.cancer_type.is_none());
    }

    #[test]
    fn test_reference_genome_default_and_display() {
        assert_eq!(ReferenceGenome::default(), ReferenceGenome::GRCh37);
        assert_eq!(ReferenceGenome::GRCh38.to_string(), "GRCh38");
    }

    #[test]
    fn test_reference_genome_parses_aliases() {
        assert_eq!("grch38".parse::<ReferenceGenome>().unwrap(), ReferenceGenome::GRCh38);
        assert_eq!("hg19".parse::<ReferenceGenome>().unwrap(), ReferenceGenome::GRCh37);
        assert!("mm10".parse::<ReferenceGenome>().is_err());
    }

    #[test]
    fn test_evidence_type_query_value() {
        assert_eq!(EvidenceType::GeneSummary.as_str(), "GENE_SUMMARY");
        let parsed: EvidenceType = serde_json::from_str("\"MUTATION_EFFECT\"").unwrap();
        assert_eq!(parsed, EvidenceType::MutationEffect);
    }
}
