//! ODP Sync Library
//!
//! Second stage of the pipeline: triggered once per newly staged object,
//! reads its records, and pushes the ones the downstream sync table has not
//! seen into bounded insert batches.
//!
//! Dedup is best-effort: the existing-id set is snapshotted once per run, so
//! two concurrent runs over overlapping identifier spaces can both miss each
//! other's in-flight inserts. The downstream unique constraint surfaces
//! those as rejected records, which the run tolerates and reports.

pub mod event;
pub mod reader;
pub mod synchronizer;
pub mod table;
