//! The transaction document stored in the search index.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single bank transaction as indexed into the search engine.
///
/// Field names are the *target* names of the column mapping; a document
/// carries exactly these eight fields and nothing else. `sequence_number`
/// doubles as the index document id, which is what makes re-indexing the
/// same input idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDocument {
    /// Unique per logical transaction; used as the upsert document id.
    pub sequence_number: i64,
    /// Account the transaction belongs to.
    pub account_id: i64,
    /// Opaque date string, passed through unparsed.
    pub date: String,
    /// Calendar year of the transaction.
    pub year: i64,
    /// Transaction type, e.g. "debit" or "credit".
    #[serde(rename = "type")]
    pub kind: String,
    /// Operation label, e.g. "purchase" or "withdrawal".
    pub operation: String,
    /// Amount moved by the transaction.
    pub transaction_amount: Decimal,
    /// Account balance after the transaction.
    pub account_balance: Decimal,
}

impl TransactionDocument {
    /// The id addressing this record in the index key-space.
    pub fn document_id(&self) -> String {
        self.sequence_number.to_string()
    }
}
