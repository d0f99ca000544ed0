//! # Retry Policy
//!
//! Bounded retry with exponential backoff under an absolute deadline.
//!
//! [`RetryPolicy`] describes how many times to retry and how long to wait in
//! between. [`execute_with_retry`] drives an operation under that policy and
//! never runs past the supplied deadline: an in-flight attempt is dropped when
//! the deadline passes, and a backoff that would end after the deadline is not
//! taken.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use txn_aggregator::application::services::retry::{RetryPolicy, Retryable, execute_with_retry};
//!
//! #[derive(Debug)]
//! struct Overloaded;
//!
//! impl std::fmt::Display for Overloaded {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         f.write_str("overloaded")
//!     }
//! }
//!
//! impl Retryable for Overloaded {
//!     fn is_retryable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! # async fn example() {
//! let policy = RetryPolicy::new(5, 10, 100, 2.0, 0.1);
//! let deadline = Instant::now() + Duration::from_secs(3);
//!
//! let result = execute_with_retry(&policy, deadline, |attempt| async move {
//!     if attempt < 3 { Err(Overloaded) } else { Ok("done") }
//! })
//! .await;
//! # }
//! ```

use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};

/// Trait for errors that can indicate whether they are retryable.
pub trait Retryable {
    /// Returns true if the error is transient and the operation should be retried.
    fn is_retryable(&self) -> bool;
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt. Total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay cap, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0-1.0) applied to each delay.
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 25,
            max_delay_ms: 500,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom parameters.
    #[must_use]
    pub fn new(
        max_retries: u32,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        backoff_multiplier: f64,
        jitter_factor: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay_ms,
            max_delay_ms: max_delay_ms.max(initial_delay_ms),
            backoff_multiplier: backoff_multiplier.max(1.0),
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
        }
    }

    /// Creates a policy with no retries (fail fast).
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Total number of attempts this policy allows.
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Calculates the delay before retry number `retry` (0-indexed).
    ///
    /// `min(initial_delay * multiplier ^ retry, max_delay)`
    #[must_use]
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let base_delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped_delay = base_delay.min(self.max_delay_ms as f64);
        Duration::from_millis(capped_delay as u64)
    }

    /// Calculates the delay with jitter applied.
    ///
    /// Jitter only shortens the delay: `delay * (1 - jitter_factor * random())`.
    #[must_use]
    pub fn calculate_delay_with_jitter(&self, retry: u32) -> Duration {
        let base_delay = self.calculate_delay(retry);
        if self.jitter_factor <= 0.0 || base_delay.is_zero() {
            return base_delay;
        }

        let jitter: f64 = rand::rng().random();
        let jittered_ms = base_delay.as_millis() as f64 * (1.0 - self.jitter_factor * jitter);
        Duration::from_millis(jittered_ms.max(1.0) as u64)
    }

    /// Returns true if another attempt is allowed after `attempts_made`.
    #[must_use]
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts()
    }
}

/// Error returned when retry execution fails.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryError<E> {
    /// All attempts were used.
    MaxRetriesExceeded {
        /// The last error encountered.
        last_error: E,
        /// Total number of attempts made.
        attempts: u32,
    },
    /// The error was marked as non-retryable.
    NonRetryable {
        /// The non-retryable error.
        error: E,
        /// Number of attempts made.
        attempts: u32,
    },
    /// The deadline passed during an attempt or would pass during backoff.
    DeadlineExceeded {
        /// Error of the last completed attempt, if any completed.
        last_error: Option<E>,
        /// Number of attempts started.
        attempts: u32,
    },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxRetriesExceeded {
                last_error,
                attempts,
            } => write!(f, "max retries exceeded after {attempts} attempts: {last_error}"),
            Self::NonRetryable { error, attempts } => {
                write!(f, "non-retryable error after {attempts} attempts: {error}")
            }
            Self::DeadlineExceeded {
                last_error: Some(last_error),
                attempts,
            } => write!(f, "deadline exceeded after {attempts} attempts: {last_error}"),
            Self::DeadlineExceeded {
                last_error: None,
                attempts,
            } => write!(f, "deadline exceeded after {attempts} attempts"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

impl<E> RetryError<E> {
    /// Returns the underlying error, if an attempt completed with one.
    #[must_use]
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::MaxRetriesExceeded { last_error, .. } => Some(last_error),
            Self::NonRetryable { error, .. } => Some(error),
            Self::DeadlineExceeded { last_error, .. } => last_error,
        }
    }

    /// Returns a reference to the underlying error, if any.
    #[must_use]
    pub fn inner(&self) -> Option<&E> {
        match self {
            Self::MaxRetriesExceeded { last_error, .. } => Some(last_error),
            Self::NonRetryable { error, .. } => Some(error),
            Self::DeadlineExceeded { last_error, .. } => last_error.as_ref(),
        }
    }

    /// Returns the number of attempts made.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::MaxRetriesExceeded { attempts, .. }
            | Self::NonRetryable { attempts, .. }
            | Self::DeadlineExceeded { attempts, .. } => *attempts,
        }
    }

    /// Returns true if the deadline ended execution.
    #[must_use]
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }
}

/// Result type for retry operations.
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Executes an async operation with retries until it succeeds, fails
/// permanently, runs out of attempts, or reaches `deadline`.
///
/// The operation receives the 1-based attempt number.
///
/// # Errors
///
/// - `RetryError::NonRetryable` on an error that is not retryable.
/// - `RetryError::MaxRetriesExceeded` when every attempt failed.
/// - `RetryError::DeadlineExceeded` when the deadline cut execution short.
pub async fn execute_with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    deadline: Instant,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let mut attempts = 0u32;
    let mut last_error: Option<E> = None;

    loop {
        if Instant::now() >= deadline {
            return Err(RetryError::DeadlineExceeded {
                last_error,
                attempts,
            });
        }

        attempts = attempts.saturating_add(1);

        let error = match timeout_at(deadline, operation(attempts)).await {
            Ok(Ok(result)) => return Ok(result),
            Ok(Err(error)) => error,
            Err(_) => {
                return Err(RetryError::DeadlineExceeded {
                    last_error,
                    attempts,
                });
            }
        };

        if !error.is_retryable() {
            return Err(RetryError::NonRetryable { error, attempts });
        }

        if !policy.should_retry(attempts) {
            return Err(RetryError::MaxRetriesExceeded {
                last_error: error,
                attempts,
            });
        }

        let delay = policy.calculate_delay_with_jitter(attempts.saturating_sub(1));
        if Instant::now() + delay >= deadline {
            return Err(RetryError::DeadlineExceeded {
                last_error: Some(error),
                attempts,
            });
        }

        tracing::debug!(
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Attempt failed, backing off"
        );
        last_error = Some(error);
        sleep(delay).await;
    }
}
