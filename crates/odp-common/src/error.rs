//! Error types for the ODP pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, OdpError>;

/// Main error type for the pipeline.
///
/// Errors tied to a whole run's precondition (metadata fetch, missing
/// identifier column) abort the run; errors tied to a single resource or
/// batch are caught by the orchestrators and reported in the run summary.
#[derive(Error, Debug)]
pub enum OdpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Staging store error: {0}")]
    StagingStore(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Metadata endpoint unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Malformed metadata response: {0}")]
    MalformedMetadata(String),

    #[error("Failed to fetch resource {resource_id}: {reason}")]
    ResourceFetchFailed { resource_id: String, reason: String },

    #[error("Failed to write staged object {key}: {reason}")]
    StoreWriteFailed { key: String, reason: String },

    #[error("Identifier column '{column}' missing from header")]
    MissingIdentifierColumn { column: String },

    #[error("Sync table unavailable: {0}")]
    SyncTableUnavailable(String),

    #[error("Insert batch partially failed: {rejected} record(s) rejected")]
    InsertBatchPartialFailure { rejected: usize },
}
