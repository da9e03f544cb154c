//! Record mapper implementation.
//!
//! Applies the declarative column mapping to source tables, producing
//! `TransactionDocument`s.

use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use tracing::{debug, instrument};

use crate::errors::PipelineError;
use crate::reader::SourceTable;
use transactions_indexer_shared::{FieldMapping, FieldType, TransactionDocument, FIELD_MAPPINGS};

/// Mapper that applies the column projection to every source row.
///
/// The mapper is responsible for:
/// - Resolving each mapped source column against a table's header
/// - Casting values to their declared target types
/// - Dropping every column the mapping does not list
///
/// Cardinality is preserved exactly: one document per source row, no row
/// added, removed, or split.
pub struct RecordMapper;

impl RecordMapper {
    /// Create a new record mapper.
    pub fn new() -> Self {
        Self
    }

    /// Map every table into documents.
    ///
    /// All projections are resolved before the first row is mapped, so a
    /// table missing a declared source column fails the whole stage up
    /// front. This keeps schema mismatches strictly ahead of any write.
    #[instrument(skip(self, tables), fields(table_count = tables.len()))]
    pub fn map_tables(
        &self,
        tables: &[SourceTable],
    ) -> Result<Vec<TransactionDocument>, PipelineError> {
        let projections = tables
            .iter()
            .map(Projection::resolve)
            .collect::<Result<Vec<_>, _>>()?;

        let total: usize = tables.iter().map(|t| t.rows.len()).sum();
        let mut documents = Vec::with_capacity(total);

        for projection in &projections {
            for row in &projection.table.rows {
                documents.push(projection.project(row)?);
            }
        }

        debug!(document_count = documents.len(), "Mapped source rows");
        Ok(documents)
    }
}

impl Default for RecordMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved source-column indices for one table, in mapping order.
struct Projection<'a> {
    table: &'a SourceTable,
    indices: Vec<usize>,
}

impl<'a> Projection<'a> {
    /// Locate every mapped source column in the table's header.
    fn resolve(table: &'a SourceTable) -> Result<Self, PipelineError> {
        let indices = FIELD_MAPPINGS
            .iter()
            .map(|mapping| {
                table
                    .headers
                    .iter()
                    .position(|header| header == mapping.source)
                    .ok_or_else(|| PipelineError::MissingColumn {
                        column: mapping.source.to_string(),
                        path: table.path.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { table, indices })
    }

    /// Project one row into a document.
    ///
    /// The document is assembled under the mapping's target names, so the
    /// projection stays driven by the mapping table rather than per-field
    /// code.
    fn project(&self, row: &[String]) -> Result<TransactionDocument, PipelineError> {
        let mut fields = Map::with_capacity(FIELD_MAPPINGS.len());

        for (mapping, &index) in FIELD_MAPPINGS.iter().zip(&self.indices) {
            let raw = row.get(index).map(String::as_str).unwrap_or_default();
            fields.insert(
                mapping.target.to_string(),
                self.typed_value(mapping, raw)?,
            );
        }

        serde_json::from_value(Value::Object(fields)).map_err(|e| PipelineError::InvalidValue {
            column: "<document>".to_string(),
            path: self.table.path.clone(),
            message: e.to_string(),
        })
    }

    /// Cast a raw value to the mapping's declared target type.
    fn typed_value(&self, mapping: &FieldMapping, raw: &str) -> Result<Value, PipelineError> {
        let trimmed = raw.trim();
        match mapping.field_type {
            FieldType::Long => trimmed
                .parse::<i64>()
                .map(|n| Value::Number(Number::from(n)))
                .map_err(|_| self.invalid(mapping, raw)),
            FieldType::Text => Ok(Value::String(raw.to_string())),
            // Decimal values stay in string form here; the document type
            // parses them into a fixed-precision decimal on deserialization.
            FieldType::Decimal => match trimmed.parse::<Decimal>() {
                Ok(_) => Ok(Value::String(trimmed.to_string())),
                Err(_) => Err(self.invalid(mapping, raw)),
            },
        }
    }

    fn invalid(&self, mapping: &FieldMapping, raw: &str) -> PipelineError {
        PipelineError::InvalidValue {
            column: mapping.source.to_string(),
            path: self.table.path.clone(),
            message: format!("cannot cast {:?} to {:?}", raw, mapping.field_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn table(headers: &[&str], rows: &[&[&str]]) -> SourceTable {
        SourceTable {
            path: "input/transactions.csv.gz".to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    fn full_headers() -> Vec<&'static str> {
        vec![
            "sequence_number",
            "account_id",
            "date",
            "year",
            "type",
            "operation",
            "amount",
            "balance",
        ]
    }

    #[test]
    fn test_maps_example_row() {
        let headers = full_headers();
        let table = table(
            &headers,
            &[&[
                "100",
                "55",
                "2024-01-01",
                "2024",
                "debit",
                "purchase",
                "12.50",
                "87.50",
            ]],
        );

        let documents = RecordMapper::new().map_tables(&[table]).unwrap();

        assert_eq!(documents.len(), 1);
        let doc = &documents[0];
        assert_eq!(doc.sequence_number, 100);
        assert_eq!(doc.account_id, 55);
        assert_eq!(doc.date, "2024-01-01");
        assert_eq!(doc.year, 2024);
        assert_eq!(doc.kind, "debit");
        assert_eq!(doc.operation, "purchase");
        assert_eq!(doc.transaction_amount, Decimal::from_str("12.50").unwrap());
        assert_eq!(doc.account_balance, Decimal::from_str("87.50").unwrap());
    }

    #[test]
    fn test_unmapped_columns_are_dropped_and_order_ignored() {
        // Extra column plus shuffled header order relative to the mapping.
        let table = table(
            &[
                "branch", "balance", "amount", "operation", "type", "year", "date",
                "account_id", "sequence_number",
            ],
            &[&[
                "downtown",
                "87.50",
                "12.50",
                "purchase",
                "debit",
                "2024",
                "2024-01-01",
                "55",
                "100",
            ]],
        );

        let documents = RecordMapper::new().map_tables(&[table]).unwrap();

        let value = serde_json::to_value(&documents[0]).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 8);
        assert!(!object.contains_key("branch"));
        assert_eq!(documents[0].sequence_number, 100);
        assert_eq!(documents[0].account_balance, Decimal::from_str("87.50").unwrap());
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let headers: Vec<&str> = full_headers()
            .into_iter()
            .filter(|h| *h != "balance")
            .collect();
        let table = table(
            &headers,
            &[&["100", "55", "2024-01-01", "2024", "debit", "purchase", "12.50"]],
        );

        let result = RecordMapper::new().map_tables(&[table]);

        match result {
            Err(PipelineError::MissingColumn { column, .. }) => assert_eq!(column, "balance"),
            other => panic!("expected MissingColumn, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_missing_column_in_any_table_fails_before_mapping() {
        let headers = full_headers();
        let good = table(
            &headers,
            &[&[
                "100",
                "55",
                "2024-01-01",
                "2024",
                "debit",
                "purchase",
                "12.50",
                "87.50",
            ]],
        );
        let bad = table(&["sequence_number"], &[&["101"]]);

        let result = RecordMapper::new().map_tables(&[good, bad]);

        assert!(matches!(result, Err(PipelineError::MissingColumn { .. })));
    }

    #[test]
    fn test_unparseable_long_is_fatal() {
        let headers = full_headers();
        let table = table(
            &headers,
            &[&[
                "not-a-number",
                "55",
                "2024-01-01",
                "2024",
                "debit",
                "purchase",
                "12.50",
                "87.50",
            ]],
        );

        let result = RecordMapper::new().map_tables(&[table]);

        match result {
            Err(PipelineError::InvalidValue { column, .. }) => {
                assert_eq!(column, "sequence_number")
            }
            other => panic!("expected InvalidValue, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_cardinality_preserved_across_tables() {
        let headers = full_headers();
        let row: &[&str] = &[
            "100",
            "55",
            "2024-01-01",
            "2024",
            "debit",
            "purchase",
            "12.50",
            "87.50",
        ];
        let rows: Vec<&[&str]> = vec![row; 3];
        let first = table(&headers, &rows);
        let second = table(&headers, &rows[..2]);

        let documents = RecordMapper::new().map_tables(&[first, second]).unwrap();

        assert_eq!(documents.len(), 5);
    }

    #[test]
    fn test_duplicate_sequence_numbers_both_survive_mapping() {
        // De-duplication is not this stage's job; upsert-by-id handles it.
        let headers = full_headers();
        let table = table(
            &headers,
            &[
                &[
                    "100", "55", "2024-01-01", "2024", "debit", "purchase", "12.50", "87.50",
                ],
                &[
                    "100", "55", "2024-01-02", "2024", "credit", "refund", "12.50", "100.00",
                ],
            ],
        );

        let documents = RecordMapper::new().map_tables(&[table]).unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].sequence_number, documents[1].sequence_number);
    }
}
