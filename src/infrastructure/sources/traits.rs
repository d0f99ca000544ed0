//! # Source Traits
//!
//! The seam between the aggregation engine and backend services.
//!
//! A [`TransactionSource`] performs exactly one attempt. Retries, per-attempt
//! timeouts and deadlines belong to the caller, so implementations stay free
//! of policy and are easy to fake in tests.

use crate::domain::entities::Transaction;
use crate::domain::value_objects::{AccountId, SourceId};
use crate::infrastructure::sources::error::SourceResult;
use async_trait::async_trait;
use std::fmt;

/// One backend able to answer "transactions for account X".
#[async_trait]
pub trait TransactionSource: Send + Sync + fmt::Debug {
    /// Returns the source identifier.
    fn source_id(&self) -> &SourceId;

    /// Performs a single fetch attempt.
    ///
    /// An empty list is a valid success.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`](crate::infrastructure::sources::error::SourceError)
    /// describing why the attempt failed.
    async fn fetch_transactions(&self, account: &AccountId) -> SourceResult<Vec<Transaction>>;
}
