//! Mapper module for the transactions indexer pipeline.
//!
//! Projects source CSV rows into transaction documents.

mod record_mapper;

pub use record_mapper::RecordMapper;
