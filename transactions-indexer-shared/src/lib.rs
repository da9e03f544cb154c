//! # Transactions Indexer Shared
//!
//! Shared types and data structures for the transactions indexer system:
//! the indexed document and the declarative column mapping that produces it.

pub mod document;
pub mod mapping;

pub use document::TransactionDocument;
pub use mapping::{FieldMapping, FieldType, DOCUMENT_ID_COLUMN, FIELD_MAPPINGS};
