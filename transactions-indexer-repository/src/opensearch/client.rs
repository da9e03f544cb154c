//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchIndexWriter`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, OpenSearch, UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::config::{ConnectionConfig, IndexResource};
use crate::errors::SearchError;
use crate::interfaces::SearchIndexWriter;
use crate::opensearch::index_config::index_settings;
use transactions_indexer_shared::TransactionDocument;

/// OpenSearch implementation of the search index writer.
///
/// The client talks to a single HTTPS endpoint through a single-node
/// connection pool: no sniffing, no node discovery, which keeps it safe
/// behind load balancers and across WAN links. Authentication is HTTP basic
/// auth with the per-run credentials from [`ConnectionConfig`].
///
/// # Example
///
/// ```ignore
/// use transactions_indexer_repository::{ConnectionConfig, OpenSearchWriter};
///
/// let config = ConnectionConfig::new(
///     "search.example.com",
///     "indexer",
///     "secret",
///     "main-index/transactions".parse()?,
/// );
/// let writer = OpenSearchWriter::new(&config)?;
/// writer.ensure_index_exists().await?;
/// writer.bulk_upsert(&documents).await?;
/// ```
pub struct OpenSearchWriter {
    client: OpenSearch,
    resource: IndexResource,
}

impl OpenSearchWriter {
    /// Create a new writer connected to the configured endpoint.
    pub fn new(config: &ConnectionConfig) -> Result<Self, SearchError> {
        let url = Self::endpoint_url(&config.endpoint)?;

        let conn_pool = SingleNodeConnectionPool::new(url.clone());
        let transport = TransportBuilder::new(conn_pool)
            .auth(Credentials::Basic(
                config.username.clone(),
                config.password.clone(),
            ))
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            endpoint = %url,
            resource = %config.resource,
            "Created OpenSearch writer"
        );

        Ok(Self {
            client,
            resource: config.resource.clone(),
        })
    }

    /// Normalize the configured endpoint into a URL.
    ///
    /// A bare hostname gets the https scheme, which puts the connection on
    /// port 443 unless the endpoint names a port explicitly.
    fn endpoint_url(endpoint: &str) -> Result<Url, SearchError> {
        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            return Err(SearchError::connection("endpoint must not be empty"));
        }

        let raw = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        Url::parse(&raw).map_err(|e| SearchError::connection(e.to_string()))
    }

    /// Build the NDJSON action/source pairs for a bulk upsert request.
    ///
    /// Each document becomes an `update` action addressed by its
    /// `sequence_number` with `doc_as_upsert` set, so unseen ids are created
    /// and repeated ids are overwritten in place.
    fn bulk_body(documents: &[TransactionDocument]) -> Result<Vec<Value>, SearchError> {
        let mut body = Vec::with_capacity(documents.len() * 2);

        for document in documents {
            let source = serde_json::to_value(document)
                .map_err(|e| SearchError::SerializationError(e.to_string()))?;

            body.push(json!({ "update": { "_id": document.document_id() } }));
            body.push(json!({ "doc": source, "doc_as_upsert": true }));
        }

        Ok(body)
    }

    /// Summarize the failed operations of a bulk response, if any.
    fn bulk_error_summary(response: &Value) -> Option<String> {
        if !response["errors"].as_bool().unwrap_or(false) {
            return None;
        }

        let items = response["items"].as_array()?;
        let failures: Vec<&Value> = items
            .iter()
            .filter_map(|item| {
                let op = &item["update"];
                let status = op["status"].as_u64().unwrap_or(0);
                (status >= 300).then_some(op)
            })
            .collect();

        let first_reason = failures
            .first()
            .and_then(|op| op["error"]["reason"].as_str())
            .unwrap_or("unknown reason");

        Some(format!(
            "{} of {} operations failed, first: {}",
            failures.len(),
            items.len(),
            first_reason
        ))
    }
}

#[async_trait]
impl SearchIndexWriter for OpenSearchWriter {
    /// Create the target index if it is missing.
    ///
    /// A pre-existing index is left untouched, so repeated runs against the
    /// same cluster never fail here.
    async fn ensure_index_exists(&self) -> Result<(), SearchError> {
        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.resource.index.as_str()]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(index = %self.resource.index, "Index already exists");
            return Ok(());
        }

        if exists.status_code().as_u16() != 404 {
            return Err(SearchError::index_creation(format!(
                "unexpected status {} checking index {}",
                exists.status_code(),
                self.resource.index
            )));
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.resource.index))
            .body(index_settings())
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another writer may have created the index in between; that is
            // not a failure.
            if error_body.contains("resource_already_exists_exception") {
                debug!(index = %self.resource.index, "Index created concurrently");
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchError::index_creation(format!(
                "creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %self.resource.index, "Created index");
        Ok(())
    }

    /// Upsert a single document, creating it if it doesn't exist.
    async fn upsert_document(&self, document: &TransactionDocument) -> Result<(), SearchError> {
        let doc_id = document.document_id();
        let source = serde_json::to_value(document)
            .map_err(|e| SearchError::SerializationError(e.to_string()))?;

        let response = self
            .client
            .update(UpdateParts::IndexId(&self.resource.index, &doc_id))
            .body(json!({
                "doc": source,
                "doc_as_upsert": true
            }))
            .send()
            .await
            .map_err(|e| SearchError::update(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Update request failed");
            return Err(SearchError::update(format!(
                "update failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document upserted");
        Ok(())
    }

    /// Upsert a batch of documents in one bulk request.
    async fn bulk_upsert(&self, documents: &[TransactionDocument]) -> Result<(), SearchError> {
        if documents.is_empty() {
            return Ok(());
        }

        let body: Vec<JsonBody<Value>> = Self::bulk_body(documents)?
            .into_iter()
            .map(JsonBody::new)
            .collect();

        let response = self
            .client
            .bulk(BulkParts::Index(&self.resource.index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::bulk_index(format!(
                "bulk failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        if let Some(summary) = Self::bulk_error_summary(&response_body) {
            error!(summary = %summary, "Bulk response contains failures");
            return Err(SearchError::bulk_index(summary));
        }

        debug!(count = documents.len(), "Bulk upsert complete");
        Ok(())
    }

    /// Ping the cluster to verify it is reachable and credentials work.
    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }
}
