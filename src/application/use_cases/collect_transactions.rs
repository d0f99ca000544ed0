//! # Collect Transactions Use Case
//!
//! Fans one account query out to every configured source.
//!
//! One task is spawned per source, all sharing a single absolute deadline.
//! Outcomes are returned in source-declaration order. A source that has not
//! settled when the deadline passes is aborted and reported as
//! [`FetchFailure::DeadlineExceeded`], so the wall-clock time of a fan-out is
//! bounded by the deadline however many sources or retries are involved.

use crate::application::services::source_client::{FetchFailure, FetchOutcome, SourceClient};
use crate::domain::value_objects::AccountId;
use crate::infrastructure::sources::registry::SourceRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};

/// Response from the collect transactions use case.
#[derive(Debug, Clone)]
pub struct CollectTransactionsResponse {
    /// The account queried.
    pub account: AccountId,
    /// One outcome per source, in declaration order.
    pub outcomes: Vec<FetchOutcome>,
    /// Wall-clock time of the fan-out.
    pub elapsed: Duration,
}

impl CollectTransactionsResponse {
    /// Returns the number of sources queried.
    #[must_use]
    pub fn sources_queried(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns the number of sources that succeeded.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Returns the number of sources that contributed nothing.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.sources_queried() - self.success_count()
    }

    /// Returns true if at least one source failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.failure_count() > 0
    }

    /// Returns true if sources were queried and none of them succeeded.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.sources_queried() > 0 && self.success_count() == 0
    }

    /// Returns the total number of records collected.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.transactions().len()).sum()
    }
}

/// Configuration for transaction collection.
#[derive(Debug, Clone)]
pub struct CollectTransactionsConfig {
    /// Overall deadline for one fan-out in milliseconds.
    pub overall_deadline_ms: u64,
}

impl Default for CollectTransactionsConfig {
    fn default() -> Self {
        Self {
            overall_deadline_ms: 3000,
        }
    }
}

impl CollectTransactionsConfig {
    /// Creates a configuration with the given overall deadline.
    #[must_use]
    pub fn with_deadline(overall_deadline_ms: u64) -> Self {
        Self {
            overall_deadline_ms,
        }
    }

    /// Returns the overall deadline as a duration.
    #[must_use]
    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }
}

/// Use case for collecting transactions from every source concurrently.
#[derive(Debug)]
pub struct CollectTransactionsUseCase {
    registry: Arc<SourceRegistry>,
    client: Arc<SourceClient>,
    config: CollectTransactionsConfig,
}

impl CollectTransactionsUseCase {
    /// Creates a new CollectTransactionsUseCase.
    #[must_use]
    pub fn new(
        registry: Arc<SourceRegistry>,
        client: Arc<SourceClient>,
        config: CollectTransactionsConfig,
    ) -> Self {
        Self {
            registry,
            client,
            config,
        }
    }

    /// Returns the source registry.
    #[must_use]
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CollectTransactionsConfig {
        &self.config
    }

    /// Queries every source for `account` and waits until all settle or the
    /// overall deadline passes.
    pub async fn execute(&self, account: &AccountId) -> CollectTransactionsResponse {
        let started = Instant::now();
        let deadline = started + self.config.overall_deadline();

        let handles: Vec<_> = self
            .registry
            .sources()
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let client = Arc::clone(&self.client);
                let account = account.clone();
                let source_id = source.source_id().clone();

                let handle = tokio::spawn(async move {
                    client.fetch(source.as_ref(), &account, deadline).await
                });
                (source_id, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (source_id, mut handle) in handles {
            let outcome = match timeout_at(deadline, &mut handle).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    tracing::error!(source = %source_id, "Fetch task failed: {}", e);
                    FetchOutcome::failed(source_id, FetchFailure::Aborted, 0, started.elapsed())
                }
                Err(_) => {
                    handle.abort();
                    tracing::warn!(
                        source = %source_id,
                        account = %account,
                        deadline_ms = self.config.overall_deadline_ms,
                        "Source did not settle before the deadline"
                    );
                    FetchOutcome::failed(
                        source_id,
                        FetchFailure::DeadlineExceeded { last_error: None },
                        0,
                        started.elapsed(),
                    )
                }
            };
            outcomes.push(outcome);
        }

        let response = CollectTransactionsResponse {
            account: account.clone(),
            outcomes,
            elapsed: started.elapsed(),
        };

        tracing::debug!(
            account = %account,
            sources = response.sources_queried(),
            succeeded = response.success_count(),
            elapsed_ms = response.elapsed.as_millis() as u64,
            "Fan-out settled"
        );

        response
    }
}
