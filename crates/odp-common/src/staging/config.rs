use serde::{Deserialize, Serialize};
use std::env;

/// Connection settings for the staging object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack); `None`
    /// targets AWS proper.
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Path-style addressing, required by most local S3 stand-ins.
    pub path_style: bool,
}

impl StagingConfig {
    /// Connection settings from the environment. The bucket defaults to
    /// `STAGING_BUCKET` but callers that learn the bucket at run time (the
    /// sync stage reads it from the storage event) override it with
    /// [`StagingConfig::with_bucket`].
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("S3_ENDPOINT").ok(),
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bucket: env::var("STAGING_BUCKET").unwrap_or_default(),
            access_key: env::var("S3_ACCESS_KEY")
                .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                .unwrap_or_default(),
            secret_key: env::var("S3_SECRET_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .unwrap_or_default(),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Config for an S3-compatible endpoint with static credentials, used
    /// for local stacks and tests.
    pub fn for_endpoint(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            bucket: bucket.into(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
        }
    }

    /// Same connection settings, different bucket. The sync stage resolves
    /// the bucket from the storage event rather than configuration.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }
}
