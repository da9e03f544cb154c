//! Search index writer trait definition.
//!
//! This module defines the abstract interface for write operations against
//! the search engine, allowing for different backend implementations
//! (OpenSearch, mocks for testing, etc.).

use async_trait::async_trait;

use crate::errors::SearchError;
use transactions_indexer_shared::TransactionDocument;

/// Abstract interface for writing transaction documents to a search engine.
///
/// All writes are upserts keyed on the document's `sequence_number`:
/// a document that already exists under the same id is overwritten, never
/// duplicated. This is what makes whole-job reruns safe.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so they can be shared across async
/// tasks behind an `Arc`.
#[async_trait]
pub trait SearchIndexWriter: Send + Sync {
    /// Ensure the target index exists with proper mappings.
    ///
    /// If the index does not exist it is created with the appropriate
    /// settings; a pre-existing index is left untouched. Called once before
    /// the pipeline starts writing.
    async fn ensure_index_exists(&self) -> Result<(), SearchError>;

    /// Upsert a single document.
    ///
    /// Creates the document if its id is unseen, overwrites it otherwise.
    async fn upsert_document(&self, document: &TransactionDocument) -> Result<(), SearchError>;

    /// Upsert multiple documents in a single bulk request.
    ///
    /// More efficient than calling [`upsert_document`](Self::upsert_document)
    /// per record. Returns `Err(SearchError::BulkIndexError)` if any
    /// operation in the batch is rejected.
    async fn bulk_upsert(&self, documents: &[TransactionDocument]) -> Result<(), SearchError>;

    /// Check if the search engine is reachable and healthy.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - the engine answered and is healthy
    /// * `Ok(false)` - the engine answered but reports itself unhealthy
    /// * `Err(SearchError)` - the check could not be executed
    async fn health_check(&self) -> Result<bool, SearchError>;
}
