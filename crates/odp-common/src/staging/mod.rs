//! S3-backed staging store
//!
//! The durable handoff between the ingest and sync stages. Keys follow
//! `"{dataset_id}/{resource_id}.{ext}"`; an existing key is the sole dedup
//! signal at the ingestion layer, so writes never overwrite and existence
//! checks match the exact key. A prefix-based check would falsely skip a key
//! that happens to prefix another key.

use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use tracing::{debug, info, instrument};

use crate::error::{OdpError, Result};

pub mod config;

pub use config::StagingConfig;

#[derive(Clone)]
pub struct StagingStore {
    client: Client,
    bucket: String,
}

impl StagingStore {
    pub fn new(config: StagingConfig) -> Self {
        debug!("Initializing staging store with config: {:?}", config);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "odp-staging",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        Self {
            client,
            bucket: config.bucket,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Exact-key existence check via HeadObject.
    #[instrument(skip(self))]
    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                if not_found {
                    Ok(false)
                } else {
                    Err(OdpError::StagingStore(format!(
                        "existence check failed for {}: {}",
                        key, e
                    )))
                }
            },
        }
    }

    /// Write a staged object. The store is atomic on success: either the
    /// complete object lands under `key` or nothing does.
    #[instrument(skip(self, body))]
    pub async fn put_stream(&self, key: &str, body: ByteStream) -> Result<()> {
        debug!("Uploading stream to s3://{}/{}", self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| OdpError::StoreWriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        info!("Staged s3://{}/{}", self.bucket, key);

        Ok(())
    }

    /// Read a staged object in full. Staged CSVs are bounded by the portal's
    /// extract sizes, so buffering one object per run is acceptable here.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        debug!("Downloading s3://{}/{}", self.bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                OdpError::StagingStore(format!("failed to fetch {}: {}", key, e))
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| {
                OdpError::StagingStore(format!("failed to read body of {}: {}", key, e))
            })?
            .into_bytes()
            .to_vec();

        debug!(
            "Downloaded {} bytes from s3://{}/{}",
            data.len(),
            self.bucket,
            key
        );

        Ok(data)
    }
}
