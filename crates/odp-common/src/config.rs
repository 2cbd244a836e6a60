//! Environment-based configuration for both pipeline stages
//!
//! Each stage reads only the variables it needs, mirroring the environments
//! the two deployed functions run with. Required variables produce
//! `OdpError::Config` when absent so startup failures name the missing key.

use crate::error::{OdpError, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Default insert batch size, sized to stay under the downstream API's
/// payload and row limits.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default identifier column for CKAN datastore extracts.
pub const DEFAULT_IDENTIFIER_COLUMN: &str = "_id";

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| OdpError::Config(format!("{} must be set", key)))
}

/// Configuration for the ingest stage (portal to staging store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Base URL of the CKAN portal, e.g. `https://ckan0.cf.opendata.inter.prod-toronto.ca`.
    pub source_api_base_url: String,
    /// Bucket staged objects are written to.
    pub staging_bucket: String,
    /// CKAN package identifier to ingest.
    pub dataset_id: String,
    /// Resource format accepted for staging (case-insensitive), e.g. `csv`.
    pub format_filter: String,
    /// Optional resource-name prefix filter; `None` accepts any name.
    pub name_prefix_filter: Option<String>,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            source_api_base_url: required("SOURCE_API_BASE_URL")?,
            staging_bucket: required("STAGING_BUCKET")?,
            dataset_id: required("DATASET_ID")?,
            format_filter: env::var("FORMAT_FILTER").unwrap_or_else(|_| "csv".to_string()),
            name_prefix_filter: env::var("NAME_PREFIX_FILTER").ok(),
        })
    }
}

/// Configuration for the sync stage (staging store to sync table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the downstream REST data API.
    pub sync_table_url: String,
    /// Table (collection) name under `/rest/v1/`.
    pub sync_table_name: String,
    /// Bearer token, also sent as the `apikey` header.
    pub sync_auth_token: String,
    /// Maximum records per insert batch.
    pub batch_size: usize,
    /// Column holding the unique record identifier.
    pub identifier_column: String,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self> {
        let batch_size = match env::var("BATCH_SIZE") {
            Ok(v) => v
                .parse()
                .map_err(|_| OdpError::Config(format!("invalid BATCH_SIZE: {}", v)))?,
            Err(_) => DEFAULT_BATCH_SIZE,
        };
        if batch_size == 0 {
            return Err(OdpError::Config("BATCH_SIZE must be positive".to_string()));
        }

        Ok(Self {
            sync_table_url: required("SYNC_TABLE_URL")?,
            sync_table_name: required("SYNC_TABLE_NAME")?,
            sync_auth_token: required("SYNC_AUTH_TOKEN")?,
            batch_size,
            identifier_column: env::var("IDENTIFIER_COLUMN")
                .unwrap_or_else(|_| DEFAULT_IDENTIFIER_COLUMN.to_string()),
        })
    }
}
