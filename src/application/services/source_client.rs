//! # Source Client
//!
//! One logical "fetch transactions for account X" call against one source.
//!
//! [`SourceClient::fetch`] wraps single attempts from a [`TransactionSource`]
//! in a per-attempt timeout and the retry policy, and always settles to a
//! [`FetchOutcome`] value. Nothing is raised to the caller: a source that keeps
//! failing is reported as data so it cannot abort the other sources of the same
//! aggregation.
//!
//! Timeouts compose: each attempt is bounded by
//! `min(attempt_timeout, deadline - now)`.

use crate::application::services::retry::{RetryError, RetryPolicy, Retryable, execute_with_retry};
use crate::domain::entities::Transaction;
use crate::domain::value_objects::{AccountId, SourceId};
use crate::infrastructure::sources::error::{SourceError, SourceErrorKind};
use crate::infrastructure::sources::traits::TransactionSource;
use std::fmt;
use std::time::Duration;
use tokio::time::{Instant, timeout};
use tracing::Instrument;

/// Why a source contributed nothing to an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// Every allowed attempt failed.
    SourceUnavailable {
        /// Kind of the last error observed.
        last_error: SourceErrorKind,
        /// Attempts made.
        attempts: u32,
    },
    /// The overall deadline passed before the source settled.
    DeadlineExceeded {
        /// Kind of the last completed attempt's error, if any.
        last_error: Option<SourceErrorKind>,
    },
    /// The task running the fetch panicked or was cancelled.
    Aborted,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable {
                last_error,
                attempts,
            } => write!(f, "source unavailable after {attempts} attempts ({last_error})"),
            Self::DeadlineExceeded {
                last_error: Some(kind),
            } => write!(f, "deadline exceeded ({kind})"),
            Self::DeadlineExceeded { last_error: None } => write!(f, "deadline exceeded"),
            Self::Aborted => write!(f, "fetch aborted"),
        }
    }
}

/// Settled state of one source's fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// The source returned its full list (possibly empty).
    Success(Vec<Transaction>),
    /// The source contributes nothing.
    Failed(FetchFailure),
}

/// Per-source result of one aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    source_id: SourceId,
    status: FetchStatus,
    attempts: u32,
    elapsed: Duration,
}

impl FetchOutcome {
    /// Creates a successful outcome.
    #[must_use]
    pub fn success(
        source_id: SourceId,
        transactions: Vec<Transaction>,
        attempts: u32,
        elapsed: Duration,
    ) -> Self {
        Self {
            source_id,
            status: FetchStatus::Success(transactions),
            attempts,
            elapsed,
        }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub fn failed(
        source_id: SourceId,
        failure: FetchFailure,
        attempts: u32,
        elapsed: Duration,
    ) -> Self {
        Self {
            source_id,
            status: FetchStatus::Failed(failure),
            attempts,
            elapsed,
        }
    }

    /// Returns the source this outcome belongs to.
    #[inline]
    #[must_use]
    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    /// Returns the settled status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    /// Returns true if the source succeeded.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, FetchStatus::Success(_))
    }

    /// Returns the transactions, empty for a failed source.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        match &self.status {
            FetchStatus::Success(transactions) => transactions,
            FetchStatus::Failed(_) => &[],
        }
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&FetchFailure> {
        match &self.status {
            FetchStatus::Success(_) => None,
            FetchStatus::Failed(failure) => Some(failure),
        }
    }

    /// Returns the number of attempts made.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the time the source took to settle.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Every fetch-time failure is transient; only a source that could not be
/// set up is given up on immediately.
impl Retryable for SourceError {
    fn is_retryable(&self) -> bool {
        !matches!(self, Self::Configuration { .. })
    }
}

/// Retrying client for a single source.
#[derive(Debug, Clone)]
pub struct SourceClient {
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl SourceClient {
    /// Creates a client with the given retry policy and per-attempt timeout.
    #[must_use]
    pub fn new(policy: RetryPolicy, attempt_timeout: Duration) -> Self {
        Self {
            policy,
            attempt_timeout,
        }
    }

    /// Returns the retry policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns the per-attempt timeout.
    #[inline]
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Fetches the account's transactions from `source`, retrying transient
    /// failures until success, exhaustion, or `deadline`.
    pub async fn fetch(
        &self,
        source: &dyn TransactionSource,
        account: &AccountId,
        deadline: Instant,
    ) -> FetchOutcome {
        let started = Instant::now();
        let source_id = source.source_id().clone();
        let attempt_timeout = self.attempt_timeout;
        let timeout_ms = u64::try_from(attempt_timeout.as_millis()).unwrap_or(u64::MAX);

        let mut attempts_made = 0u32;
        let span = tracing::debug_span!("source_fetch", source = %source_id, account = %account);
        let result = execute_with_retry(&self.policy, deadline, |attempt_number| {
            attempts_made = attempt_number;
            let attempt = source.fetch_transactions(account);
            async move {
                match timeout(attempt_timeout, attempt).await {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::Timeout { timeout_ms }),
                }
            }
        })
        .instrument(span)
        .await;

        let elapsed = started.elapsed();
        match result {
            Ok(transactions) => {
                tracing::debug!(
                    source = %source_id,
                    account = %account,
                    attempts = attempts_made,
                    records = transactions.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Source fetch succeeded"
                );
                FetchOutcome::success(source_id, transactions, attempts_made, elapsed)
            }
            Err(error) => Self::failed_outcome(source_id, account, error, elapsed),
        }
    }

    fn failed_outcome(
        source_id: SourceId,
        account: &AccountId,
        error: RetryError<SourceError>,
        elapsed: Duration,
    ) -> FetchOutcome {
        let attempts = error.attempts();
        let failure = match &error {
            RetryError::MaxRetriesExceeded { last_error, .. }
            | RetryError::NonRetryable {
                error: last_error, ..
            } => FetchFailure::SourceUnavailable {
                last_error: last_error.kind(),
                attempts,
            },
            RetryError::DeadlineExceeded { last_error, .. } => FetchFailure::DeadlineExceeded {
                last_error: last_error.as_ref().map(SourceError::kind),
            },
        };

        tracing::warn!(
            source = %source_id,
            account = %account,
            attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error,
            "Source contributed no records"
        );

        FetchOutcome::failed(source_id, failure, attempts, elapsed)
    }
}
