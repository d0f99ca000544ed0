//! # Use Cases
//!
//! Application use cases implementing the aggregation workflow.

pub mod aggregate_transactions;
pub mod collect_transactions;

#[cfg(test)]
pub(crate) mod tests;

pub use aggregate_transactions::{AggregateTransactionsConfig, AggregateTransactionsUseCase};
pub use collect_transactions::{
    CollectTransactionsConfig, CollectTransactionsResponse, CollectTransactionsUseCase,
};
