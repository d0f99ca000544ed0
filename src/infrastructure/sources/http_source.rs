//! # HTTP Transaction Source
//!
//! [`TransactionSource`] backed by a JSON-over-HTTP endpoint.
//!
//! The endpoint answers `GET <endpoint>?account=<account>` with a JSON array
//! of transaction objects. Decoding is tolerant of what real backends send:
//! `amount` may be a string or a number, `serverId` and `account` may be
//! missing (they default to this source's id and the requested account), and
//! timestamps may carry fewer than six fractional digits.

use crate::domain::entities::{SourceDescriptor, Transaction};
use crate::domain::value_objects::{AccountId, SourceId, Timestamp, TransactionId};
use crate::infrastructure::sources::error::SourceResult;
use crate::infrastructure::sources::http_client::HttpClient;
use crate::infrastructure::sources::traits::TransactionSource;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Transaction as reported on the wire by a backend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceTransactionDto {
    id: String,
    #[serde(default, alias = "sourceId")]
    server_id: Option<String>,
    #[serde(default)]
    account: Option<String>,
    #[serde(deserialize_with = "amount_as_text")]
    amount: String,
    timestamp: Timestamp,
}

impl SourceTransactionDto {
    fn into_transaction(self, source_id: &SourceId, account: &AccountId) -> Transaction {
        Transaction::new(
            TransactionId::new(self.id),
            self.server_id
                .map(SourceId::new)
                .unwrap_or_else(|| source_id.clone()),
            self.account
                .map(AccountId::new)
                .unwrap_or_else(|| account.clone()),
            self.amount,
            self.timestamp,
        )
    }
}

fn amount_as_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "amount must be a string or number, got {other}"
        ))),
    }
}

/// Source that fetches transactions over HTTP.
pub struct HttpTransactionSource {
    descriptor: SourceDescriptor,
    http_client: HttpClient,
}

impl HttpTransactionSource {
    /// Creates a source for the given descriptor.
    ///
    /// `timeout_ms` bounds each request at the HTTP layer; callers apply their
    /// own, possibly shorter, per-attempt timeout on top.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Configuration` if the HTTP client cannot be built.
    pub fn new(descriptor: SourceDescriptor, timeout_ms: u64) -> SourceResult<Self> {
        Ok(Self {
            descriptor,
            http_client: HttpClient::new(timeout_ms)?,
        })
    }

    /// Returns the descriptor.
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }
}

impl fmt::Debug for HttpTransactionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransactionSource")
            .field("source_id", self.descriptor.id())
            .field("endpoint", &self.descriptor.endpoint())
            .field("timeout_ms", &self.http_client.timeout_ms())
            .finish()
    }
}

#[async_trait]
impl TransactionSource for HttpTransactionSource {
    fn source_id(&self) -> &SourceId {
        self.descriptor.id()
    }

    async fn fetch_transactions(&self, account: &AccountId) -> SourceResult<Vec<Transaction>> {
        let url = self.descriptor.url_for(account);
        let records: Vec<SourceTransactionDto> = self.http_client.get_json(&url).await?;

        tracing::debug!(
            source = %self.descriptor.id(),
            account = %account,
            records = records.len(),
            "Source responded"
        );

        let source_id = self.descriptor.id();
        Ok(records
            .into_iter()
            .map(|dto| dto.into_transaction(source_id, account))
            .collect())
    }
}
