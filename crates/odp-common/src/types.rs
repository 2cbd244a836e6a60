//! Shared domain types for the ODP pipeline

use serde::{Deserialize, Serialize};

/// One downloadable file entry in the source portal's dataset metadata.
///
/// Identity is `id`; produced by the metadata client and consumed once per
/// ingest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub url: String,
}

/// A single row read from a staged object: column name to JSON value.
///
/// Empty CSV values are normalized to an explicit JSON null, never omitted.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Extract a record's identifier as a string, if present and non-empty.
///
/// The identifier column usually holds a string, but CKAN extracts often
/// export `_id` as a number, and the downstream table may echo it back as
/// one. Both forms are accepted.
pub fn identifier_of(record: &Record, column: &str) -> Option<String> {
    match record.get(column)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Outcome of one ingest run, suitable for structured logging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Keys written to the staging store during this run.
    pub staged: Vec<String>,
    /// Keys that already existed and were left untouched.
    pub skipped: Vec<String>,
    /// Resources that failed to fetch or write, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Outcome of one sync run, suitable for structured logging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Records pushed downstream during this run.
    pub pushed: usize,
    /// Records skipped as duplicates or for a missing identifier value.
    pub skipped: usize,
    /// Batch-level failures, with enough context to diagnose.
    pub errors: Vec<String>,
}
