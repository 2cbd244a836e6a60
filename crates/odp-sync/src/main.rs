//! ODP Sync - staging store to sync table

use anyhow::{bail, Result};
use clap::Parser;
use odp_common::config::SyncConfig;
use odp_common::logging::{init_logging, LogConfig, LogLevel};
use odp_common::staging::{StagingConfig, StagingStore};
use odp_sync::event::{ObjectRef, StorageEvent};
use odp_sync::synchronizer::Synchronizer;
use odp_sync::table::SyncTable;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "odp-sync")]
#[command(author, version, about = "Load new records from staged objects into the sync table")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run one sync pass
    Run {
        /// Storage event payload (S3 notification JSON) naming the staged
        /// objects to sync
        #[arg(long, conflicts_with_all = ["bucket", "key"])]
        event_file: Option<PathBuf>,

        /// Bucket of a single staged object
        #[arg(long, requires = "key")]
        bucket: Option<String>,

        /// Key of a single staged object
        #[arg(long, requires = "bucket")]
        key: Option<String>,
    },
}

fn resolve_refs(
    event_file: Option<PathBuf>,
    bucket: Option<String>,
    key: Option<String>,
) -> Result<Vec<ObjectRef>> {
    if let Some(path) = event_file {
        let payload = std::fs::read_to_string(&path)?;
        let event = StorageEvent::from_json(&payload)?;
        let refs = event.object_refs();
        if refs.is_empty() {
            bail!("event payload names no objects");
        }
        return Ok(refs);
    }

    match (bucket, key) {
        (Some(bucket), Some(key)) => Ok(vec![ObjectRef { bucket, key }]),
        _ => bail!("either --event-file or --bucket and --key are required"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()?;
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }
    init_logging(&log_config)?;

    match cli.command {
        Command::Run {
            event_file,
            bucket,
            key,
        } => {
            let config = SyncConfig::from_env()?;
            let refs = resolve_refs(event_file, bucket, key)?;

            let mut failed = 0usize;
            for object in refs {
                let store = StagingStore::new(
                    StagingConfig::from_env().with_bucket(&object.bucket),
                );
                let table = SyncTable::new(&config)?;
                let synchronizer = Synchronizer::new(store, table, &config);

                match synchronizer.sync(&object.key).await {
                    Ok(summary) => {
                        info!(
                            bucket = %object.bucket,
                            key = %object.key,
                            summary = %serde_json::to_string(&summary)?,
                            "Sync summary"
                        );
                    },
                    Err(e) => {
                        error!(bucket = %object.bucket, key = %object.key, error = %e, "Sync run failed");
                        failed += 1;
                    },
                }
            }

            if failed > 0 {
                bail!("{} sync run(s) failed", failed);
            }
        },
    }

    Ok(())
}
