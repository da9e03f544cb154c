//! OpenSearch implementation of the search index writer.

mod client;
mod index_config;

pub use client::OpenSearchWriter;
pub use index_config::index_settings;
