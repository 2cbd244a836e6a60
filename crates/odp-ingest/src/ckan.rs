//! CKAN metadata client
//!
//! Queries the portal's `package_show` action for a dataset and returns its
//! downloadable resources. No retries at this layer; the caller decides what
//! a failed run means.

use odp_common::types::Resource;
use odp_common::{OdpError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for metadata requests in seconds.
pub const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct PackageShowResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Option<PackageResult>,
}

#[derive(Debug, Deserialize)]
struct PackageResult {
    #[serde(default)]
    resources: Option<Vec<Resource>>,
}

/// HTTP client for the portal's package-describe endpoint
pub struct CkanClient {
    client: Client,
    base_url: String,
}

impl CkanClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_METADATA_TIMEOUT_SECS))
            .user_agent("odp-ingest/0.1")
            .build()
            .map_err(|e| OdpError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the resource list for a dataset.
    ///
    /// `MetadataUnavailable` when the portal is unreachable or answers with
    /// a non-success status; `MalformedMetadata` when the body does not
    /// carry the expected `result.resources` shape.
    pub async fn describe(&self, dataset_id: &str) -> Result<Vec<Resource>> {
        let url = format!("{}/api/3/action/package_show", self.base_url);
        debug!(dataset_id, url = %url, "Fetching dataset metadata");

        let response = self
            .client
            .get(&url)
            .query(&[("id", dataset_id)])
            .send()
            .await
            .map_err(|e| OdpError::MetadataUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OdpError::MetadataUnavailable(format!(
                "portal returned {} for dataset {}",
                status, dataset_id
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OdpError::MetadataUnavailable(e.to_string()))?;

        let parsed: PackageShowResponse = serde_json::from_str(&body)
            .map_err(|e| OdpError::MalformedMetadata(e.to_string()))?;

        if !parsed.success {
            return Err(OdpError::MalformedMetadata(format!(
                "portal reported success=false for dataset {}",
                dataset_id
            )));
        }

        let resources = parsed
            .result
            .and_then(|r| r.resources)
            .ok_or_else(|| {
                OdpError::MalformedMetadata("response missing result.resources".to_string())
            })?;

        info!(
            dataset_id,
            resources = resources.len(),
            "Fetched dataset metadata"
        );

        Ok(resources)
    }
}
