//! Batch job entry point.
//!
//! Reads compressed CSV transaction records from object storage, applies the
//! column mapping, and upserts the result into OpenSearch. The process exit
//! code reports the run's outcome.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transactions_indexer::{Dependencies, JobArgs, JobError};
use transactions_indexer_pipeline::orchestrator::JobStats;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = JobArgs::parse();

    match run(&args).await {
        Ok(stats) => {
            // Both lines report the post-mapping record count.
            println!("Moved records: {}", stats.records_mapped);
            println!("Total records: {}", stats.records_mapped);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(job_name = %args.job_name, error = %e, "Job failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &JobArgs) -> Result<JobStats, JobError> {
    info!(job_name = %args.job_name, "Starting job");

    let mut dependencies = Dependencies::new(args).await?;
    let stats = dependencies.orchestrator.run().await?;

    info!(
        job_name = %args.job_name,
        records_read = stats.records_read,
        records_indexed = stats.records_indexed,
        "Job complete"
    );
    Ok(stats)
}
