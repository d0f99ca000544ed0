//! # Application Services
//!
//! Building blocks of the aggregation engine:
//! - [`retry`]: bounded, deadline-aware retry with backoff
//! - [`source_client`]: one logical fetch against one source
//! - [`merger`]: ordering of records from many sources
//! - [`single_flight`]: collapsing concurrent work per key

pub mod merger;
pub mod retry;
pub mod single_flight;
pub mod source_client;

pub use merger::{merge, merge_order};
pub use retry::{RetryError, RetryPolicy, RetryResult, Retryable, execute_with_retry};
pub use single_flight::{FlightRole, SingleFlight};
pub use source_client::{FetchFailure, FetchOutcome, FetchStatus, SourceClient};
