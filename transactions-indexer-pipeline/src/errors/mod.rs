//! Error types for the transactions indexer pipeline.

use thiserror::Error;
use transactions_indexer_repository::SearchError;

/// Errors that can occur in the transactions indexer pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error listing or fetching objects from storage.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Error decompressing or parsing a source CSV object.
    #[error("Csv error: {0}")]
    CsvError(String),

    /// A column declared in the mapping is absent from a source header.
    ///
    /// This is fatal before any document is written.
    #[error("Missing column {column:?} in {path}")]
    MissingColumn { column: String, path: String },

    /// A source value could not be cast to its declared target type.
    #[error("Invalid value for column {column:?} in {path}: {message}")]
    InvalidValue {
        column: String,
        path: String,
        message: String,
    },

    /// Error from the loader component.
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// Error from the search engine.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),
}

impl PipelineError {
    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    /// Create a CSV error.
    pub fn csv(msg: impl Into<String>) -> Self {
        Self::CsvError(msg.into())
    }

    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }
}
