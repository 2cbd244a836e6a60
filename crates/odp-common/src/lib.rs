//! ODP Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, configuration, and error handling for the ODP pipeline.
//!
//! # Overview
//!
//! This crate provides common functionality used by both pipeline stages:
//!
//! - **Error Handling**: the pipeline error taxonomy and result type
//! - **Types**: records, resources, and run summaries
//! - **Staging**: the S3-backed staging store shared by ingest and sync
//! - **Configuration**: environment-based configuration for each stage
//!
//! # Example
//!
//! ```no_run
//! use odp_common::{Result, OdpError};
//! use odp_common::config::IngestConfig;
//!
//! fn load() -> Result<IngestConfig> {
//!     IngestConfig::from_env()
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod staging;
pub mod types;

// Re-export commonly used types
pub use error::{OdpError, Result};
