//! # Application Layer
//!
//! Use case orchestration and application services.
//!
//! ## Use Cases
//!
//! - [`AggregateTransactionsUseCase`]: cache, fan-out, merge, store
//! - [`CollectTransactionsUseCase`]: concurrent fan-out under one deadline
//!
//! ## Services
//!
//! - [`SourceClient`]: retrying fetch against one source
//! - [`merge`]: deterministic ordering of collected records
//! - [`SingleFlight`]: per-key collapsing of concurrent work

pub mod error;
pub mod services;
pub mod use_cases;

pub use error::{ApplicationError, ApplicationResult};
pub use services::{
    FetchFailure, FetchOutcome, FetchStatus, FlightRole, RetryError, RetryPolicy, RetryResult,
    Retryable, SingleFlight, SourceClient, execute_with_retry, merge,
};
pub use use_cases::{
    AggregateTransactionsConfig, AggregateTransactionsUseCase, CollectTransactionsConfig,
    CollectTransactionsResponse, CollectTransactionsUseCase,
};
