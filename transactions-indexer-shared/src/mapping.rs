//! Declarative column mapping from source CSV to indexed document.
//!
//! The projection is kept as a literal table so it stays auditable and
//! diffable. Source columns not listed here are dropped.

/// Target type a mapped value is cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 64-bit signed integer.
    Long,
    /// Opaque UTF-8 string, passed through as-is.
    Text,
    /// Fixed-precision decimal.
    Decimal,
}

/// One (source column, target field) entry of the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    /// Column name in the source CSV header.
    pub source: &'static str,
    /// Field name in the indexed document.
    pub target: &'static str,
    /// Type the value is cast to.
    pub field_type: FieldType,
}

/// The source column the upsert document id is taken from.
pub const DOCUMENT_ID_COLUMN: &str = "sequence_number";

/// The full projection applied to every source row.
pub const FIELD_MAPPINGS: [FieldMapping; 8] = [
    FieldMapping {
        source: "sequence_number",
        target: "sequence_number",
        field_type: FieldType::Long,
    },
    FieldMapping {
        source: "account_id",
        target: "account_id",
        field_type: FieldType::Long,
    },
    FieldMapping {
        source: "date",
        target: "date",
        field_type: FieldType::Text,
    },
    FieldMapping {
        source: "year",
        target: "year",
        field_type: FieldType::Long,
    },
    FieldMapping {
        source: "type",
        target: "type",
        field_type: FieldType::Text,
    },
    FieldMapping {
        source: "operation",
        target: "operation",
        field_type: FieldType::Text,
    },
    FieldMapping {
        source: "amount",
        target: "transaction_amount",
        field_type: FieldType::Decimal,
    },
    FieldMapping {
        source: "balance",
        target: "account_balance",
        field_type: FieldType::Decimal,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mapping_covers_eight_columns() {
        assert_eq!(FIELD_MAPPINGS.len(), 8);
    }

    #[test]
    fn test_sources_and_targets_are_unique() {
        let sources: HashSet<_> = FIELD_MAPPINGS.iter().map(|m| m.source).collect();
        let targets: HashSet<_> = FIELD_MAPPINGS.iter().map(|m| m.target).collect();

        assert_eq!(sources.len(), FIELD_MAPPINGS.len());
        assert_eq!(targets.len(), FIELD_MAPPINGS.len());
    }

    #[test]
    fn test_renamed_columns() {
        let amount = FIELD_MAPPINGS.iter().find(|m| m.source == "amount").unwrap();
        assert_eq!(amount.target, "transaction_amount");
        assert_eq!(amount.field_type, FieldType::Decimal);

        let balance = FIELD_MAPPINGS.iter().find(|m| m.source == "balance").unwrap();
        assert_eq!(balance.target, "account_balance");
        assert_eq!(balance.field_type, FieldType::Decimal);
    }

    #[test]
    fn test_document_id_column_is_mapped() {
        let id = FIELD_MAPPINGS
            .iter()
            .find(|m| m.source == DOCUMENT_ID_COLUMN)
            .unwrap();
        assert_eq!(id.target, DOCUMENT_ID_COLUMN);
        assert_eq!(id.field_type, FieldType::Long);
    }
}
