//! ODP Ingest - portal to staging store

use anyhow::Result;
use clap::Parser;
use odp_common::config::IngestConfig;
use odp_common::logging::{init_logging, LogConfig, LogLevel};
use odp_common::staging::{StagingConfig, StagingStore};
use odp_ingest::ckan::CkanClient;
use odp_ingest::ingestor::{Ingestor, ResourceFilter};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "odp-ingest")]
#[command(author, version, about = "Stage new dataset resources from the open-data portal")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run one ingest pass
    Run {
        /// Dataset to ingest; defaults to DATASET_ID from the environment
        #[arg(long)]
        dataset: Option<String>,
    },
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
        Command::Run { dataset } => {
            let config = IngestConfig::from_env()?;
            let dataset_id = dataset.unwrap_or_else(|| config.dataset_id.clone());

            let ckan = CkanClient::new(&config.source_api_base_url)?;
            let store = StagingStore::new(
                StagingConfig::from_env().with_bucket(&config.staging_bucket),
            );
            let filter = ResourceFilter::from_config(&config);

            let summary = Ingestor::new(ckan, store, filter)?.sync(&dataset_id).await?;

            info!(summary = %serde_json::to_string(&summary)?, "Ingest summary");
        },
    }

    Ok(())
}
