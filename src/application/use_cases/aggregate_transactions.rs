//! # Aggregate Transactions Use Case
//!
//! The single externally visible operation: the merged, time-ordered
//! transactions of one account.
//!
//! A cache hit is answered without touching any source. On a miss the
//! account is fanned out to every source under the overall deadline, the
//! outcomes are merged, and the merged list is stored before it is returned.
//! Concurrent misses for the same account share one fan-out when single-flight
//! is enabled.
//!
//! Unavailable or slow sources never fail the call. The only errors a caller
//! sees are a bad account or a corrupted cache.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::merger::merge;
use crate::application::services::single_flight::{FlightRole, SingleFlight};
use crate::application::use_cases::collect_transactions::CollectTransactionsUseCase;
use crate::domain::entities::TransactionList;
use crate::domain::value_objects::AccountId;
use crate::infrastructure::cache::{AggregationCache, CacheError};
use std::sync::Arc;
use tracing::instrument;

/// Configuration for the aggregation facade.
#[derive(Debug, Clone)]
pub struct AggregateTransactionsConfig {
    /// Collapse concurrent misses for the same account into one fan-out.
    pub single_flight: bool,
    /// Store results even when some sources failed.
    pub cache_partial_results: bool,
}

impl Default for AggregateTransactionsConfig {
    fn default() -> Self {
        Self {
            single_flight: true,
            cache_partial_results: true,
        }
    }
}

/// Use case answering account aggregation requests.
#[derive(Debug)]
pub struct AggregateTransactionsUseCase {
    collector: Arc<CollectTransactionsUseCase>,
    cache: Arc<dyn AggregationCache>,
    flights: SingleFlight<AccountId, TransactionList, ApplicationError>,
    config: AggregateTransactionsConfig,
}

impl AggregateTransactionsUseCase {
    /// Creates a new AggregateTransactionsUseCase.
    #[must_use]
    pub fn new(
        collector: Arc<CollectTransactionsUseCase>,
        cache: Arc<dyn AggregationCache>,
        config: AggregateTransactionsConfig,
    ) -> Self {
        Self {
            collector,
            cache,
            flights: SingleFlight::new(),
            config,
        }
    }

    /// Creates a new AggregateTransactionsUseCase with default configuration.
    #[must_use]
    pub fn with_defaults(
        collector: Arc<CollectTransactionsUseCase>,
        cache: Arc<dyn AggregationCache>,
    ) -> Self {
        Self::new(collector, cache, AggregateTransactionsConfig::default())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AggregateTransactionsConfig {
        &self.config
    }

    /// Returns the merged transactions for `account`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::CacheError` if the cache is corrupted.
    #[instrument(skip_all, fields(account = %account))]
    pub async fn execute(&self, account: &AccountId) -> ApplicationResult<TransactionList> {
        if let Some(cached) = lookup(self.cache.as_ref(), account)? {
            tracing::debug!(records = cached.len(), "Cache hit");
            return Ok(cached);
        }

        let collector = Arc::clone(&self.collector);
        let cache = Arc::clone(&self.cache);
        let key = account.clone();
        let cache_partial = self.config.cache_partial_results;
        let load = move || load_and_store(collector, cache, key, cache_partial);

        if !self.config.single_flight {
            return load().await;
        }

        let (result, role) = self.flights.run(account.clone(), load).await;
        if role == FlightRole::Follower {
            tracing::debug!("Joined in-flight aggregation");
        }
        result
    }

    /// Parses `account` and aggregates it.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::DomainError` for a blank account, otherwise
    /// as [`execute`](Self::execute).
    pub async fn execute_raw(&self, account: &str) -> ApplicationResult<TransactionList> {
        let account = AccountId::parse(account)?;
        self.execute(&account).await
    }

    /// Drops the cached result for `account`. Returns true if one was stored.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::CacheError` if the cache is corrupted.
    pub fn invalidate(&self, account: &AccountId) -> ApplicationResult<bool> {
        self.cache.invalidate(account).map_err(cache_failure)
    }
}

fn lookup(
    cache: &dyn AggregationCache,
    account: &AccountId,
) -> ApplicationResult<Option<TransactionList>> {
    cache.get(account).map_err(cache_failure)
}

fn cache_failure(error: CacheError) -> ApplicationError {
    tracing::error!(error = %error, "Aggregation cache failure");
    ApplicationError::from(error)
}

async fn load_and_store(
    collector: Arc<CollectTransactionsUseCase>,
    cache: Arc<dyn AggregationCache>,
    account: AccountId,
    cache_partial: bool,
) -> ApplicationResult<TransactionList> {
    // A flight that finished just before this one started may have stored it.
    if let Some(cached) = lookup(cache.as_ref(), &account)? {
        return Ok(cached);
    }

    let response = collector.execute(&account).await;
    let merged: TransactionList = Arc::new(merge(&response.outcomes));

    if response.all_failed() {
        tracing::debug!(account = %account, "No source succeeded, result not cached");
    } else if cache_partial || !response.is_degraded() {
        cache
            .put(&account, Arc::clone(&merged))
            .map_err(cache_failure)?;
    } else {
        tracing::debug!(account = %account, "Degraded result not cached");
    }

    tracing::info!(
        account = %account,
        sources = response.sources_queried(),
        succeeded = response.success_count(),
        failed = response.failure_count(),
        records = merged.len(),
        elapsed_ms = response.elapsed.as_millis() as u64,
        "Aggregation complete"
    );

    Ok(merged)
}
