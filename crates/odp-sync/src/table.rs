//! Dedup sync table client
//!
//! REST-style collection endpoint in the Supabase shape: identifiers are
//! read with a `select` query, inserts are a JSON array POST. Auth is a
//! bearer token doubled as the `apikey` header.

use odp_common::config::SyncConfig;
use odp_common::types::{identifier_of, Record};
use odp_common::{OdpError, Result};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for sync table requests in seconds.
pub const DEFAULT_TABLE_TIMEOUT_SECS: u64 = 120;

/// Result of one insert batch. Partial failure is data, not an error.
#[derive(Debug, Default)]
pub struct InsertResult {
    pub accepted: usize,
    /// Rejected records with the downstream reason.
    pub rejected: Vec<(Record, String)>,
}

pub struct SyncTable {
    client: Client,
    base_url: String,
    table: String,
    token: String,
}

impl SyncTable {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TABLE_TIMEOUT_SECS))
            .user_agent("odp-sync/0.1")
            .build()
            .map_err(|e| OdpError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.sync_table_url.trim_end_matches('/').to_string(),
            table: config.sync_table_name.clone(),
            token: config.sync_auth_token.clone(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Snapshot the full set of identifiers currently present downstream.
    ///
    /// One call per run; per-record existence checks would cost a network
    /// round trip per row.
    pub async fn existing_ids(&self, id_column: &str) -> Result<HashSet<String>> {
        let url = self.collection_url();
        debug!(url = %url, id_column, "Fetching existing identifiers");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("apikey", &self.token)
            .query(&[("select", id_column)])
            .send()
            .await
            .map_err(|e| OdpError::SyncTableUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OdpError::SyncTableUnavailable(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        let rows: Vec<Record> = response
            .json()
            .await
            .map_err(|e| OdpError::SyncTableUnavailable(e.to_string()))?;

        let ids: HashSet<String> = rows
            .iter()
            .filter_map(|row| identifier_of(row, id_column))
            .collect();

        info!(existing = ids.len(), "Fetched existing identifier set");

        Ok(ids)
    }

    /// Insert one batch of records.
    ///
    /// Transport and auth failures are `SyncTableUnavailable`; a non-success
    /// response body is reported per record in `rejected`, never raised.
    /// Most stores reject a conflicting batch whole, so every record shares
    /// the downstream reason.
    pub async fn insert_batch(&self, records: &[Record]) -> Result<InsertResult> {
        if records.is_empty() {
            return Ok(InsertResult::default());
        }

        let url = self.collection_url();
        debug!(url = %url, records = records.len(), "Inserting batch");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("apikey", &self.token)
            .header("Prefer", "return=minimal")
            .json(records)
            .send()
            .await
            .map_err(|e| OdpError::SyncTableUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(InsertResult {
                accepted: records.len(),
                rejected: Vec::new(),
            });
        }

        let reason = format!(
            "{}: {}",
            status,
            response.text().await.unwrap_or_default()
        );

        Ok(InsertResult {
            accepted: 0,
            rejected: records
                .iter()
                .map(|record| (record.clone(), reason.clone()))
                .collect(),
        })
    }
}
