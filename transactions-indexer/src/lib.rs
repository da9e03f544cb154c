//! # Transactions Indexer
//!
//! Main library for the transactions search indexing job.
//!
//! This crate provides the entry point and configuration for running the
//! pipeline that moves compressed CSV transaction records from object
//! storage into OpenSearch.

pub mod config;

pub use config::{Dependencies, JobArgs};

use thiserror::Error;

/// Errors that can occur during job initialization or execution.
#[derive(Error, Debug)]
pub enum JobError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] transactions_indexer_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] transactions_indexer_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl JobError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
