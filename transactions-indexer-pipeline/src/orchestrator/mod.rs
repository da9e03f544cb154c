//! Orchestrator module for the transactions indexer pipeline.
//!
//! Coordinates the reader, mapper, and loader stages.

use tracing::{info, instrument};

use crate::errors::PipelineError;
use crate::loader::SearchLoader;
use crate::mapper::RecordMapper;
use crate::reader::StorageReader;

/// Record counts observed during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobStats {
    /// Rows yielded by the reader.
    pub records_read: usize,
    /// Documents produced by the mapper.
    pub records_mapped: usize,
    /// Documents written to the index.
    pub records_indexed: usize,
}

/// Orchestrator that runs the pipeline stages in order.
///
/// Each stage completes before the next one starts: the whole input is read,
/// then the whole input is mapped, and only then does the first write go
/// out. A run has exactly one outcome — it either returns stats or fails as
/// a whole; there is no cancellation and no partial-result reporting in this
/// layer. Failed runs are safe to repeat because every write is an upsert
/// keyed on the document id.
pub struct Orchestrator {
    reader: StorageReader,
    mapper: RecordMapper,
    loader: SearchLoader,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(reader: StorageReader, mapper: RecordMapper, loader: SearchLoader) -> Self {
        Self {
            reader,
            mapper,
            loader,
        }
    }

    /// Run the pipeline to completion.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<JobStats, PipelineError> {
        info!("Starting transactions indexing run");

        self.loader.ensure_index().await?;

        let tables = self.reader.read_all().await?;
        let records_read = tables.iter().map(|t| t.rows.len()).sum();
        info!(records_read, "Read stage complete");

        let documents = self.mapper.map_tables(&tables)?;
        let records_mapped = documents.len();
        info!(records_mapped, "Mapping stage complete");

        let indexed_before = self.loader.indexed();
        self.loader.load(documents).await?;
        self.loader.flush().await?;
        let records_indexed = self.loader.indexed() - indexed_before;
        info!(records_indexed, "Load stage complete");

        Ok(JobStats {
            records_read,
            records_mapped,
            records_indexed,
        })
    }
}
