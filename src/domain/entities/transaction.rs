//! # Transaction Entity
//!
//! Immutable financial transaction record reported by a source.
//!
//! A [`Transaction`] is never mutated after construction. Two transactions are
//! equal when they share both `id` and `source_id`; the remaining fields are
//! payload. `amount` is kept as text because the engine performs no arithmetic.
//!
//! # Wire Shape
//!
//! ```json
//! {
//!   "id": "7f0c...",
//!   "serverId": "server-1",
//!   "account": "033",
//!   "amount": "125",
//!   "timestamp": "2024-05-01T10:15:30.123456"
//! }
//! ```

use crate::domain::value_objects::{AccountId, SourceId, Timestamp, TransactionId};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shared, immutable list of transactions as produced by a merge.
pub type TransactionList = Arc<Vec<Transaction>>;

/// A transaction record.
///
/// # Examples
///
/// ```
/// use txn_aggregator::domain::entities::transaction::Transaction;
/// use txn_aggregator::domain::value_objects::{AccountId, SourceId, Timestamp, TransactionId};
///
/// let tx = Transaction::new(
///     TransactionId::new("1"),
///     SourceId::new("server-1"),
///     AccountId::new("033"),
///     "125",
///     Timestamp::parse("2024-05-01T10:15:30").unwrap(),
/// );
///
/// assert_eq!(tx.amount(), "125");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    #[serde(rename = "serverId")]
    source_id: SourceId,
    account: AccountId,
    amount: String,
    timestamp: Timestamp,
}

impl Transaction {
    /// Creates a new transaction.
    #[must_use]
    pub fn new(
        id: TransactionId,
        source_id: SourceId,
        account: AccountId,
        amount: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            source_id,
            account,
            amount: amount.into(),
            timestamp,
        }
    }

    /// Returns the transaction ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Returns the ID of the source that produced this transaction.
    #[inline]
    #[must_use]
    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    /// Returns the account.
    #[inline]
    #[must_use]
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Returns the amount as reported by the source.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Returns the timestamp.
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.source_id == other.source_id
    }
}

impl Eq for Transaction {}

impl Hash for Transaction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.source_id.hash(state);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tx(id: &str, source: &str, amount: &str) -> Transaction {
        Transaction::new(
            TransactionId::new(id),
            SourceId::new(source),
            AccountId::new("033"),
            amount,
            Timestamp::parse("2024-05-01T10:15:30.000001").unwrap(),
        )
    }

    #[test]
    fn equality_ignores_payload() {
        assert_eq!(tx("1", "server-1", "10"), tx("1", "server-1", "99"));
    }

    #[test]
    fn equality_requires_same_source() {
        assert_ne!(tx("1", "server-1", "10"), tx("1", "server-2", "10"));
    }

    #[test]
    fn serializes_with_server_id_field() {
        let json = serde_json::to_value(tx("1", "server-1", "10")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "1",
                "serverId": "server-1",
                "account": "033",
                "amount": "10",
                "timestamp": "2024-05-01T10:15:30.000001",
            })
        );
    }

    #[test]
    fn deserializes_wire_shape() {
        let json = r#"{"id":"9","serverId":"s","account":"128","amount":"5","timestamp":"2024-05-01T10:15"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.id().as_str(), "9");
        assert_eq!(tx.source_id().as_str(), "s");
        assert_eq!(tx.timestamp().to_string(), "2024-05-01T10:15:00.000000");
    }
}
