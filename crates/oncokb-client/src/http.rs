//! HTTP client for a live annotation service deployment.
//!
//! Public endpoints live under `/api/v1`, the search and portal endpoints
//! under `/api/private`. A bearer token is sent when one is configured.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use oncokb_common::{
    AnnotationQuery, BiologicalVariant, CancerTypeSampleCount, ClientConfig, ClinicalVariant,
    Evidence, EvidenceType, Gene, OncokbError, PortalAlteration, VariantAnnotation,
};

use crate::{AnnotationSource, Endpoint};

pub struct HttpAnnotationSource {
    client: Client,
    base_url: String,
    api_token: Option<SecretString>,
}

impl HttpAnnotationSource {
    pub fn new(config: &ClientConfig) -> oncokb_common::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone().map(SecretString::from),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// GET an endpoint and decode its JSON body. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> oncokb_common::Result<Option<T>> {
        let mut request = self.client.get(self.url(endpoint)).query(query);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(endpoint = %endpoint, status = status.as_u16(), "response received");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(OncokbError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(Some(response.json::<T>().await?))
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> oncokb_common::Result<Vec<T>> {
        Ok(self.get_json::<Vec<T>>(endpoint, query).await?.unwrap_or_default())
    }
}

#[async_trait]
impl AnnotationSource for HttpAnnotationSource {
    #[instrument(skip(self))]
    async fn lookup_gene(&self, symbol: &str) -> anyhow::Result<Option<Gene>> {
        let genes: Vec<Gene> = self.get_list(Endpoint::GeneLookup, &[("query", symbol)]).await?;
        debug!(symbol, matches = genes.len(), "gene lookup");
        Ok(genes.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn lookup_evidence(
        &self,
        hugo_symbol: &str,
        evidence_type: EvidenceType,
        variant: Option<&str>,
    ) -> anyhow::Result<Vec<Evidence>> {
        let mut query = vec![("hugoSymbol", hugo_symbol), ("evidenceTypes", evidence_type.as_str())];
        if let Some(variant) = variant {
            query.push(("variant", variant));
        }
        Ok(self.get_list(Endpoint::EvidenceLookup, &query).await?)
    }

    #[instrument(skip(self))]
    async fn search_clinical_variants(&self, hugo_symbol: &str) -> anyhow::Result<Vec<ClinicalVariant>> {
        Ok(self.get_list(Endpoint::ClinicalVariants, &[("hugoSymbol", hugo_symbol)]).await?)
    }

    #[instrument(skip(self))]
    async fn search_biological_variants(&self, hugo_symbol: &str) -> anyhow::Result<Vec<BiologicalVariant>> {
        Ok(self.get_list(Endpoint::BiologicalVariants, &[("hugoSymbol", hugo_symbol)]).await?)
    }

    #[instrument(skip(self))]
    async fn portal_alterations(&self, hugo_symbol: &str) -> anyhow::Result<Vec<PortalAlteration>> {
        Ok(self.get_list(Endpoint::PortalAlterations, &[("hugoSymbol", hugo_symbol)]).await?)
    }

    #[instrument(skip(self))]
    async fn portal_sample_counts(&self) -> anyhow::Result<Vec<CancerTypeSampleCount>> {
        Ok(self.get_list(Endpoint::PortalSampleCounts, &[]).await?)
    }

    #[instrument(skip(self), fields(hugo_symbol = %query.hugo_symbol))]
    async fn variant_annotation(&self, query: &AnnotationQuery) -> anyhow::Result<VariantAnnotation> {
        let mut params = vec![
            ("hugoSymbol", query.hugo_symbol.as_str()),
            ("referenceGenome", query.reference_genome.as_str()),
        ];
        if let Some(alteration) = query.alteration.as_deref() {
            params.push(("alteration", alteration));
        }
        if let Some(tumor_type) = query.tumor_type.as_deref() {
            params.push(("tumorType", tumor_type));
        }
        Ok(self
            .get_json(Endpoint::VariantAnnotation, &params)
            .await?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_and_path() {
        let config = ClientConfig {
            base_url: "https://annotations.example.org/".to_string(),
            ..ClientConfig::default()
        };
        let source = HttpAnnotationSource::new(&config).unwrap();
        assert_eq!(source.base_url(), "https://annotations.example.org");
        assert_eq!(
            source.url(Endpoint::ClinicalVariants),
            "https://annotations.example.org/api/private/search/variants/clinical"
        );
        assert!(!source.has_token());
    }

    #[test]
    fn test_token_is_kept_when_configured() {
        let config = ClientConfig {
            api_token: Some("token-123".to_string()),
            ..ClientConfig::default()
        };
        let source = HttpAnnotationSource::new(&config).unwrap();
        assert!(source.has_token());
        assert_eq!(source.url(Endpoint::GeneLookup), "https://www.oncokb.org/api/v1/genes/lookup");
    }
}
