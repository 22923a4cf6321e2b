//! Configuration loading for the annotation engine.
//! Reads oncokb.toml from the current directory or the path in the ONCOKB_CONFIG env var.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::entities::ReferenceGenome;
use crate::error::{OncokbError, Result};

pub const CONFIG_ENV_VAR: &str = "ONCOKB_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "oncokb.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OncokbConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

// ── Annotation service ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token. Wrapped in a secret as soon as the client is built.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url()     -> String { "https://www.oncokb.org".to_string() }
fn default_timeout_secs() -> u64 { 30 }

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ── Initial query ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub hugo_symbol: String,
    #[serde(default)]
    pub alteration: Option<String>,
    #[serde(default)]
    pub tumor_type: Option<String>,
    #[serde(default)]
    pub reference_genome: ReferenceGenome,
}

// ── Aggregation thresholds ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Cancer types with this many sequenced samples or fewer are left out of the bar chart.
    #[serde(default = "default_min_cohort_samples")]
    pub min_cohort_samples: u32,
    #[serde(default = "default_max_bar_chart_entries")]
    pub max_bar_chart_entries: usize,
}

fn default_min_cohort_samples()    -> u32 { 50 }
fn default_max_bar_chart_entries() -> usize { 15 }

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            min_cohort_samples: default_min_cohort_samples(),
            max_bar_chart_entries: default_max_bar_chart_entries(),
        }
    }
}

impl OncokbConfig {
    /// Load from `$ONCOKB_CONFIG` or `./oncokb.toml`.
    /// A missing file falls back to defaults; a malformed one is an error.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if !Path::new(&path).exists() {
            warn!("Config file not found: {path}, using defaults");
            return Ok(Self::default());
        }

        Self::from_path(&path)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: OncokbConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.client.base_url.trim().is_empty() {
            return Err(OncokbError::Config("client.base_url must not be empty".to_string()));
        }
        if self.aggregation.max_bar_chart_entries == 0 {
            return Err(OncokbError::Config(
                "aggregation.max_bar_chart_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = OncokbConfig::from_toml_str("").unwrap();
        assert_eq!(config.client.base_url, "https://www.oncokb.org");
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(config.aggregation.min_cohort_samples, 50);
        assert_eq!(config.aggregation.max_bar_chart_entries, 15);
        assert_eq!(config.query.reference_genome, ReferenceGenome::GRCh37);
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config = OncokbConfig::from_toml_str(
            r#"
            [client]
            api_token = "abc"

            [query]
            hugo_symbol = "BRAF"
            alteration = "V600E"
            reference_genome = "GRCh38"
            "#,
        )
        .unwrap();
        assert_eq!(config.client.api_token.as_deref(), Some("abc"));
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(config.query.hugo_symbol, "BRAF");
        assert_eq!(config.query.reference_genome, ReferenceGenome::GRCh38);
    }

    #[test]
    fn test_rejects_zero_bar_chart_entries() {
        let err = OncokbConfig::from_toml_str("[aggregation]\nmax_bar_chart_entries = 0\n")
            .unwrap_err();
        assert!(matches!(err, OncokbError::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let err = OncokbConfig::from_toml_str("[client\nbase_url = ").unwrap_err();
        assert!(matches!(err, OncokbError::Toml(_)));
    }
}
