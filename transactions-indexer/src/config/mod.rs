//! Job configuration and dependency wiring.

mod dependencies;

pub use dependencies::Dependencies;

use clap::Parser;
use transactions_indexer_repository::DEFAULT_RESOURCE;

/// Invocation parameters for one job run.
///
/// All parameters are mandatory and resolved before any data is touched; a
/// missing parameter fails the run up front. Credentials are held only for
/// the duration of the process.
#[derive(Parser, Debug)]
#[command(
    name = "transactions-indexer",
    about = "Indexes transaction records from object storage into OpenSearch"
)]
pub struct JobArgs {
    /// Job identifier, used to tag the run's logs.
    #[arg(long)]
    pub job_name: String,

    /// Basic-auth username for the search endpoint.
    #[arg(long)]
    pub es_user: String,

    /// Basic-auth password for the search endpoint.
    #[arg(long)]
    pub es_pass: String,

    /// HTTPS endpoint of the search cluster.
    #[arg(long)]
    pub es_endpoint: String,

    /// Object-storage URL holding the compressed CSV input,
    /// e.g. s3://bucket/prefix/.
    #[arg(long)]
    pub input_bucket: String,

    /// Target index resource in index/type form.
    #[arg(long, default_value = DEFAULT_RESOURCE)]
    pub index: String,
}
