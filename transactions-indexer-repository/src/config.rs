//! Connection configuration for the search index writer.

use std::fmt;
use std::str::FromStr;

use crate::errors::SearchError;

/// Default index resource the job writes to, in the legacy `index/type`
/// addressing scheme.
pub const DEFAULT_RESOURCE: &str = "main-index/transactions";

/// Per-run connection parameters for the search engine.
///
/// Credentials are supplied at invocation time and held only for the
/// lifetime of the run.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// HTTPS endpoint of the search cluster (scheme optional, defaults to
    /// https).
    pub endpoint: String,
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Target index resource.
    pub resource: IndexResource,
}

impl ConnectionConfig {
    /// Create a new connection configuration.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        resource: IndexResource,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            resource,
        }
    }
}

/// A search index addressed in the legacy `index/type` scheme.
///
/// Modern engines ignore the type segment; it is accepted syntactically and
/// carried for display only. All requests address the index by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexResource {
    /// The index name.
    pub index: String,
    /// The informational type segment, if present.
    pub doc_type: Option<String>,
}

impl FromStr for IndexResource {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SearchError::invalid_resource("resource must not be empty"));
        }

        let mut parts = trimmed.splitn(2, '/');
        let index = parts.next().unwrap_or_default();
        if index.is_empty() {
            return Err(SearchError::invalid_resource(format!(
                "missing index name in {:?}",
                trimmed
            )));
        }

        let doc_type = match parts.next() {
            Some("") => {
                return Err(SearchError::invalid_resource(format!(
                    "empty type segment in {:?}",
                    trimmed
                )))
            }
            Some(t) if t.contains('/') => {
                return Err(SearchError::invalid_resource(format!(
                    "too many segments in {:?}",
                    trimmed
                )))
            }
            other => other.map(str::to_string),
        };

        Ok(Self {
            index: index.to_string(),
            doc_type,
        })
    }
}

impl fmt::Display for IndexResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.doc_type {
            Some(doc_type) => write!(f, "{}/{}", self.index, doc_type),
            None => write!(f, "{}", self.index),
        }
    }
}
