//! OpenSearch index configuration and mappings.
//!
//! This module defines the settings and field mappings used when the writer
//! auto-creates the transactions index.

use serde_json::{json, Value};

/// Get the index settings and mappings for the transactions index.
///
/// Integer columns map to `long`, labels and the opaque date string map to
/// `keyword`, and the two monetary fields map to `double` (values arrive in
/// decimal-string form and rely on the engine's numeric coercion, so no
/// precision is lost on the wire).
pub fn index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "sequence_number": {
                    "type": "long"
                },
                "account_id": {
                    "type": "long"
                },
                "date": {
                    "type": "keyword"
                },
                "year": {
                    "type": "long"
                },
                "type": {
                    "type": "keyword"
                },
                "operation": {
                    "type": "keyword"
                },
                "transaction_amount": {
                    "type": "double"
                },
                "account_balance": {
                    "type": "double"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use transactions_indexer_shared::FIELD_MAPPINGS;

    #[test]
    fn test_index_settings_structure() {
        let settings = index_settings();

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert!(settings["settings"]["number_of_replicas"].is_number());

        assert_eq!(
            settings["mappings"]["properties"]["sequence_number"]["type"],
            "long"
        );
        assert_eq!(
            settings["mappings"]["properties"]["transaction_amount"]["type"],
            "double"
        );
        assert_eq!(
            settings["mappings"]["properties"]["account_balance"]["type"],
            "double"
        );
    }

    #[test]
    fn test_every_mapped_target_field_has_a_mapping() {
        let settings = index_settings();
        let properties = settings["mappings"]["properties"].as_object().unwrap();

        assert_eq!(properties.len(), FIELD_MAPPINGS.len());
        for mapping in FIELD_MAPPINGS {
            assert!(
                properties.contains_key(mapping.target),
                "no index mapping for {}",
                mapping.target
            );
        }
    }
}
