//! # Aggregation Cache
//!
//! Memoization of merged aggregation results, keyed by account.
//!
//! The [`AggregationCache`] trait is the seam the aggregation facade depends
//! on; [`ShardedCache`] is the in-memory implementation. Entries are only ever
//! replaced whole, so readers never observe a partially updated list.

pub mod sharded;

pub use sharded::ShardedCache;

use crate::domain::entities::TransactionList;
use crate::domain::value_objects::AccountId;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Cache infrastructure failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A shard lock was poisoned by a panicking writer.
    #[error("cache shard {shard} is poisoned")]
    Poisoned {
        /// Index of the poisoned shard.
        shard: usize,
    },
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// A stored aggregation result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    transactions: TransactionList,
    created_at: Instant,
}

impl CacheEntry {
    /// Creates an entry stamped with the current instant.
    #[must_use]
    pub fn new(transactions: TransactionList) -> Self {
        Self {
            transactions,
            created_at: Instant::now(),
        }
    }

    /// Returns the stored transactions.
    #[inline]
    #[must_use]
    pub fn transactions(&self) -> &TransactionList {
        &self.transactions
    }

    /// Returns when the entry was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Returns true if the entry has outlived `ttl`. `None` never expires.
    #[must_use]
    pub fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.saturating_duration_since(self.created_at) >= ttl)
    }
}

/// Storage for merged aggregation results.
pub trait AggregationCache: Send + Sync + fmt::Debug {
    /// Returns the cached list for an account if present and not expired.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the cache is corrupted.
    fn get(&self, account: &AccountId) -> CacheResult<Option<TransactionList>>;

    /// Stores the list for an account, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the cache is corrupted.
    fn put(&self, account: &AccountId, transactions: TransactionList) -> CacheResult<()>;

    /// Removes the entry for an account. Returns true if one was present.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the cache is corrupted.
    fn invalidate(&self, account: &AccountId) -> CacheResult<bool>;
}
