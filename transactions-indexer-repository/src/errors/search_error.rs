//! Search error types.
//!
//! This module defines the error types that can occur while writing to the
//! search engine.

use thiserror::Error;

/// Errors that can occur during search engine operations.
#[derive(Error, Debug, Clone)]
pub enum SearchError {
    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to upsert a single document.
    #[error("Update error: {0}")]
    UpdateError(String),

    /// Bulk upsert operation had failures.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to parse a response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The configured index resource is malformed.
    #[error("Invalid index resource: {0}")]
    InvalidResource(String),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an update error.
    pub fn update(msg: impl Into<String>) -> Self {
        Self::UpdateError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an invalid resource error.
    pub fn invalid_resource(msg: impl Into<String>) -> Self {
        Self::InvalidResource(msg.into())
    }
}
