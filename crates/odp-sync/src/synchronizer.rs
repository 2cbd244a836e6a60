//! Sync orchestrator
//!
//! One run per staged object: read the records, snapshot the downstream
//! identifier set once, partition into new and duplicate, and push the new
//! ones in bounded batches. A failed batch is recorded and the remaining
//! batches are still attempted.

use odp_common::config::SyncConfig;
use odp_common::staging::StagingStore;
use odp_common::types::{identifier_of, Record, SyncSummary};
use odp_common::{OdpError, Result};
use tracing::{debug, info, warn};

use crate::reader::CsvRecordReader;
use crate::table::SyncTable;

pub struct Synchronizer {
    store: StagingStore,
    table: SyncTable,
    reader: CsvRecordReader,
    identifier_column: String,
    batch_size: usize,
}

impl Synchronizer {
    pub fn new(store: StagingStore, table: SyncTable, config: &SyncConfig) -> Self {
        Self {
            store,
            table,
            reader: CsvRecordReader::new(&config.identifier_column),
            identifier_column: config.identifier_column.clone(),
            batch_size: config.batch_size,
        }
    }

    /// Run one sync pass over the staged object at `key`.
    ///
    /// Run-precondition failures (object unreadable, identifier column
    /// missing, identifier snapshot unavailable) abort the run; batch-level
    /// failures land in the summary's `errors`.
    pub async fn sync(&self, key: &str) -> Result<SyncSummary> {
        let bytes = self.store.get(key).await?;
        let outcome = self.reader.read(&bytes)?;

        // Snapshot once per run. Concurrent runs can both miss each other's
        // in-flight inserts; the downstream unique constraint arbitrates.
        let existing = self.table.existing_ids(&self.identifier_column).await?;

        let mut summary = SyncSummary {
            skipped: outcome.missing_identifier,
            ..SyncSummary::default()
        };

        let mut fresh: Vec<Record> = Vec::new();
        for record in outcome.records {
            match identifier_of(&record, &self.identifier_column) {
                Some(id) if existing.contains(&id) => summary.skipped += 1,
                Some(_) => fresh.push(record),
                None => summary.skipped += 1,
            }
        }

        debug!(
            key,
            new = fresh.len(),
            duplicates = summary.skipped,
            "Partitioned records"
        );

        for (index, batch) in fresh.chunks(self.batch_size).enumerate() {
            match self.table.insert_batch(batch).await {
                Ok(result) => {
                    summary.pushed += result.accepted;
                    if !result.rejected.is_empty() {
                        let err = OdpError::InsertBatchPartialFailure {
                            rejected: result.rejected.len(),
                        };
                        warn!(
                            key,
                            batch = index,
                            reason = %result.rejected[0].1,
                            "{}", err
                        );
                        summary
                            .errors
                            .push(format!("batch {}: {} ({})", index, err, result.rejected[0].1));
                    }
                },
                Err(e) => {
                    warn!(key, batch = index, error = %e, "Batch insert failed");
                    summary.errors.push(format!("batch {}: {}", index, e));
                },
            }
        }

        info!(
            key,
            pushed = summary.pushed,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "Sync run complete"
        );

        Ok(summary)
    }
}
