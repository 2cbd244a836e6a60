//! ODP Ingest Library
//!
//! First stage of the pipeline: discovers downloadable resources for a CKAN
//! dataset and stages newly-seen ones into the object store. Staging is
//! idempotent; a key that already exists is skipped, never overwritten.
//!
//! # Example
//!
//! ```no_run
//! use odp_common::config::IngestConfig;
//! use odp_common::staging::{StagingConfig, StagingStore};
//! use odp_ingest::{ckan::CkanClient, ingestor::{Ingestor, ResourceFilter}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let ckan = CkanClient::new(&config.source_api_base_url)?;
//!     let store = StagingStore::new(
//!         StagingConfig::from_env().with_bucket(&config.staging_bucket),
//!     );
//!     let filter = ResourceFilter::from_config(&config);
//!     let summary = Ingestor::new(ckan, store, filter)?.sync(&config.dataset_id).await?;
//!     println!("staged {} objects", summary.staged.len());
//!     Ok(())
//! }
//! ```

pub mod ckan;
pub mod ingestor;
