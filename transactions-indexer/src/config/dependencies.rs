//! Dependency initialization and wiring for the indexing job.

use std::sync::Arc;
use tracing::info;

use crate::config::JobArgs;
use crate::JobError;
use transactions_indexer_pipeline::{
    loader::SearchLoader, mapper::RecordMapper, orchestrator::Orchestrator, reader::StorageReader,
};
use transactions_indexer_repository::{
    ConnectionConfig, IndexResource, OpenSearchWriter, SearchIndexWriter,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from the resolved job arguments.
    ///
    /// The search endpoint is verified up front so an unreachable or
    /// unauthenticated cluster fails the run before any data is read.
    pub async fn new(args: &JobArgs) -> Result<Self, JobError> {
        let resource: IndexResource = args.index.parse()?;

        info!(
            endpoint = %args.es_endpoint,
            input = %args.input_bucket,
            resource = %resource,
            "Initializing dependencies"
        );

        let connection = ConnectionConfig::new(
            args.es_endpoint.as_str(),
            args.es_user.as_str(),
            args.es_pass.as_str(),
            resource,
        );
        let writer = OpenSearchWriter::new(&connection)?;

        let healthy = writer.health_check().await?;
        if !healthy {
            return Err(JobError::config("search endpoint is unhealthy"));
        }
        info!("Search endpoint connection verified");

        let reader = StorageReader::from_url(&args.input_bucket)?;
        let mapper = RecordMapper::new();
        let loader = SearchLoader::new(Arc::new(writer));

        Ok(Self {
            orchestrator: Orchestrator::new(reader, mapper, loader),
        })
    }
}
