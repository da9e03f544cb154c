//! Error types for the transactions indexer repository.

mod search_error;

pub use search_error::SearchError;
