//! Loader module for the transactions indexer pipeline.
//!
//! Loads mapped documents into the search index.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::PipelineError;
use transactions_indexer_repository::{SearchError, SearchIndexWriter};
use transactions_indexer_shared::TransactionDocument;

/// Configuration for the search loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of documents sent per bulk request.
    pub batch_size: usize,
    /// Maximum number of retry attempts for failed write operations.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_retry_delay_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_retries: 3,
            initial_retry_delay_ms: 100,
            max_retry_delay_ms: 5000,
        }
    }
}

/// Loader that upserts documents into the search engine.
///
/// The loader is responsible for:
/// - Batching documents for efficient bulk upserts
/// - Retrying transient failures with exponential backoff
/// - Falling back to individual upserts when a bulk request keeps failing
pub struct SearchLoader {
    client: Arc<dyn SearchIndexWriter>,
    config: LoaderConfig,
    pending: Vec<TransactionDocument>,
    indexed: usize,
}

impl SearchLoader {
    /// Create a new search loader with the given writer.
    pub fn new(client: Arc<dyn SearchIndexWriter>) -> Self {
        Self::with_config(client, LoaderConfig::default())
    }

    /// Create a new search loader with custom configuration.
    pub fn with_config(client: Arc<dyn SearchIndexWriter>, config: LoaderConfig) -> Self {
        let batch_size = config.batch_size;
        Self {
            client,
            config,
            pending: Vec::with_capacity(batch_size),
            indexed: 0,
        }
    }

    /// Number of documents successfully written so far.
    pub fn indexed(&self) -> usize {
        self.indexed
    }

    /// Queue documents for upserting.
    ///
    /// Full batches are flushed as they accumulate; call
    /// [`flush`](Self::flush) once at the end of the run for the remainder.
    #[instrument(skip(self, documents), fields(document_count = documents.len()))]
    pub async fn load(
        &mut self,
        documents: Vec<TransactionDocument>,
    ) -> Result<(), PipelineError> {
        for document in documents {
            self.pending.push(document);

            if self.pending.len() >= self.config.batch_size {
                self.flush().await?;
            }
        }

        Ok(())
    }

    /// Flush all pending documents to the search index.
    #[instrument(skip(self))]
    pub async fn flush(&mut self) -> Result<(), PipelineError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let documents: Vec<TransactionDocument> = self.pending.drain(..).collect();
        let count = documents.len();

        debug!(count = count, "Flushing documents to search index");

        match self.bulk_upsert_with_retry(&documents).await {
            Ok(()) => {
                self.indexed += count;
                debug!(count = count, "Successfully upserted documents");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, count = count, "Bulk upsert failed after retries");

                // On bulk failure, try upserting individually
                warn!("Attempting individual document upserts");
                let mut success_count = 0;
                let mut error_count = 0;

                for document in &documents {
                    match self.upsert_document_with_retry(document).await {
                        Ok(()) => success_count += 1,
                        Err(e) => {
                            error!(
                                sequence_number = document.sequence_number,
                                error = %e,
                                "Failed to upsert individual document after retries"
                            );
                            error_count += 1;
                        }
                    }
                }

                self.indexed += success_count;
                info!(
                    success = success_count,
                    errors = error_count,
                    "Individual upserts completed"
                );

                if error_count > 0 {
                    Err(PipelineError::loader(format!(
                        "failed to upsert {} documents after retries",
                        error_count
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Bulk upsert with exponential backoff on transient failures.
    async fn bulk_upsert_with_retry(
        &self,
        documents: &[TransactionDocument],
    ) -> Result<(), SearchError> {
        let mut delay_ms = self.config.initial_retry_delay_ms;
        let mut last_error: Option<SearchError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.client.bulk_upsert(documents).await {
                Ok(()) => {
                    if attempt > 0 {
                        info!(
                            attempt = attempt,
                            count = documents.len(),
                            "Bulk upsert succeeded after retry"
                        );
                    }
                    return Ok(());
                }
                Err(e) => {
                    if !Self::is_retryable_error(&e) {
                        debug!(error = %e, "Non-retryable error encountered");
                        return Err(e);
                    }

                    last_error = Some(e.clone());

                    if attempt < self.config.max_retries {
                        warn!(
                            attempt = attempt + 1,
                            max_retries = self.config.max_retries,
                            delay_ms = delay_ms,
                            error = %e,
                            "Bulk upsert failed, retrying"
                        );

                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = std::cmp::min(delay_ms * 2, self.config.max_retry_delay_ms);
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| SearchError::bulk_index("unknown error after retries")))
    }

    /// Upsert a single document with exponential backoff on transient
    /// failures.
    async fn upsert_document_with_retry(
        &self,
        document: &TransactionDocument,
    ) -> Result<(), SearchError> {
        let mut delay_ms = self.config.initial_retry_delay_ms;
        let mut last_error: Option<SearchError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.client.upsert_document(document).await {
                Ok(()) => {
                    if attempt > 0 {
                        debug!(
                            attempt = attempt,
                            sequence_number = document.sequence_number,
                            "Document upsert succeeded after retry"
                        );
                    }
                    return Ok(());
                }
                Err(e) => {
                    if !Self::is_retryable_error(&e) {
                        debug!(error = %e, "Non-retryable error encountered");
                        return Err(e);
                    }

                    last_error = Some(e.clone());

                    if attempt < self.config.max_retries {
                        debug!(
                            attempt = attempt + 1,
                            max_retries = self.config.max_retries,
                            delay_ms = delay_ms,
                            sequence_number = document.sequence_number,
                            error = %e,
                            "Document upsert failed, retrying"
                        );

                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = std::cmp::min(delay_ms * 2, self.config.max_retry_delay_ms);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SearchError::update("unknown error after retries")))
    }

    /// Determine if an error is retryable (transient failures).
    fn is_retryable_error(error: &SearchError) -> bool {
        match error {
            // Connection errors are retryable
            SearchError::ConnectionError(_) => true,
            // Parse errors might be transient (e.g. server temporarily unavailable)
            SearchError::ParseError(_) => true,
            // Write rejections might be rate limiting or timeouts
            SearchError::BulkIndexError(msg) | SearchError::UpdateError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("rate limit")
                    || msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("503")
                    || msg_lower.contains("429")
            }
            // Non-retryable errors
            SearchError::IndexCreationError(_)
            | SearchError::SerializationError(_)
            | SearchError::InvalidResource(_) => false,
        }
    }

    /// Ensure the search index exists.
    pub async fn ensure_index(&self) -> Result<(), PipelineError> {
        self.client
            .ensure_index_exists()
            .await
            .map_err(PipelineError::from)
    }

    /// Check if the search engine is healthy.
    pub async fn health_check(&self) -> Result<bool, PipelineError> {
        self.client.health_check().await.map_err(PipelineError::from)
    }
}
