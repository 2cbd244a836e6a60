//! Ingest orchestrator
//!
//! For each resource the filter accepts, computes the staging key, skips it
//! when the store already holds that exact key, and otherwise streams the
//! resource body into the store. Per-resource failures are recorded in the
//! run summary and never abort the run; only a metadata failure does.

use aws_sdk_s3::primitives::ByteStream;
use futures::StreamExt;
use odp_common::config::IngestConfig;
use odp_common::staging::StagingStore;
use odp_common::types::{IngestSummary, Resource};
use odp_common::{OdpError, Result};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::ckan::CkanClient;

/// Default timeout for resource downloads in seconds. Extracts can run to
/// hundreds of megabytes on slow municipal mirrors.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 600;

/// Default extension for staged objects.
pub const DEFAULT_STAGED_EXTENSION: &str = "csv";

/// Staging key for a resource: `"{dataset_id}/{resource_id}.{ext}"`.
pub fn staging_key(dataset_id: &str, resource_id: &str, extension: &str) -> String {
    format!("{}/{}.{}", dataset_id, resource_id, extension)
}

/// Configured acceptance test for portal resources.
#[derive(Debug, Clone)]
pub struct ResourceFilter {
    /// Accepted format, compared case-insensitively ("csv" matches "CSV").
    pub format: String,
    /// Optional resource-name prefix; `None` accepts any name.
    pub name_prefix: Option<String>,
}

impl ResourceFilter {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            format: config.format_filter.clone(),
            name_prefix: config.name_prefix_filter.clone(),
        }
    }

    pub fn accepts(&self, resource: &Resource) -> bool {
        if !resource.format.eq_ignore_ascii_case(&self.format) {
            return false;
        }
        match &self.name_prefix {
            Some(prefix) => resource.name.starts_with(prefix.as_str()),
            None => true,
        }
    }
}

/// Orchestrates the metadata client and the staging store for one dataset.
pub struct Ingestor {
    ckan: CkanClient,
    store: StagingStore,
    filter: ResourceFilter,
    extension: String,
    http: reqwest::Client,
}

impl Ingestor {
    pub fn new(ckan: CkanClient, store: StagingStore, filter: ResourceFilter) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
            .user_agent("odp-ingest/0.1")
            .build()
            .map_err(|e| OdpError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            ckan,
            store,
            filter,
            extension: DEFAULT_STAGED_EXTENSION.to_string(),
            http,
        })
    }

    /// Staged objects keep the source extension by default; set this when
    /// the pipeline transcodes on the way in.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Run one ingest pass over the dataset.
    ///
    /// Aborts only when the metadata fetch fails; everything after that is
    /// per-resource and lands in the summary's `failed` partition.
    pub async fn sync(&self, dataset_id: &str) -> Result<IngestSummary> {
        let resources = self.ckan.describe(dataset_id).await?;

        let mut summary = IngestSummary::default();

        for resource in &resources {
            if !self.filter.accepts(resource) {
                debug!(
                    resource_id = %resource.id,
                    format = %resource.format,
                    "Resource rejected by filter"
                );
                continue;
            }

            let key = staging_key(dataset_id, &resource.id, &self.extension);

            match self.stage_resource(resource, &key).await {
                Ok(true) => summary.staged.push(key),
                Ok(false) => {
                    debug!(key = %key, "Staged object already present, skipping");
                    summary.skipped.push(key);
                },
                Err(e) => {
                    warn!(resource_id = %resource.id, key = %key, error = %e, "Failed to stage resource");
                    summary.failed.push((resource.id.clone(), e.to_string()));
                },
            }
        }

        info!(
            dataset_id,
            staged = summary.staged.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "Ingest run complete"
        );

        Ok(summary)
    }

    /// Returns `Ok(true)` when the resource was staged, `Ok(false)` when the
    /// key already existed.
    async fn stage_resource(&self, resource: &Resource, key: &str) -> Result<bool> {
        if self.store.exists(key).await? {
            return Ok(false);
        }

        let spooled = self.fetch_to_spool(resource).await?;

        let body = ByteStream::from_path(spooled.path())
            .await
            .map_err(|e| OdpError::StoreWriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        self.store.put_stream(key, body).await?;

        Ok(true)
    }

    /// Stream the resource body into a spool file so large extracts are
    /// never buffered in memory before the store write.
    async fn fetch_to_spool(&self, resource: &Resource) -> Result<NamedTempFile> {
        let fetch_err = |reason: String| OdpError::ResourceFetchFailed {
            resource_id: resource.id.clone(),
            reason,
        };

        let response = self
            .http
            .get(&resource.url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("source returned {}", status)));
        }

        let spool = NamedTempFile::new()?;
        let mut file = tokio::fs::File::create(spool.path()).await?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| fetch_err(e.to_string()))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(spool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str, format: &str) -> Resource {
        Resource {
            id: "r1".to_string(),
            name: name.to_string(),
            format: format.to_string(),
            url: "http://example.com/r1.csv".to_string(),
        }
    }

    #[test]
    fn test_staging_key() {
        assert_eq!(staging_key("ds", "r1", "csv"), "ds/r1.csv");
    }

    #[test]
    fn test_filter_format_case_insensitive() {
        let filter = ResourceFilter {
            format: "csv".to_string(),
            name_prefix: None,
        };
        assert!(filter.accepts(&resource("counts", "CSV")));
        assert!(filter.accepts(&resource("counts", "csv")));
        assert!(!filter.accepts(&resource("counts", "XLSX")));
    }

    #[test]
    fn test_filter_name_prefix() {
        let filter = ResourceFilter {
            format: "csv".to_string(),
            name_prefix: Some("raw-data".to_string()),
        };
        assert!(filter.accepts(&resource("raw-data-2024", "csv")));
        assert!(!filter.accepts(&resource("summary-2024", "csv")));
    }
}
