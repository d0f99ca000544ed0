//! # Transaction Aggregator
//!
//! Aggregates an account's transactions from several slow, intermittently
//! failing backend services into one time-ordered list within a bounded
//! latency budget.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Domain Layer** (`domain`): transactions, source descriptors, identifiers
//! - **Application Layer** (`application`): retrying source client, fan-out,
//!   merge, and the aggregation facade
//! - **Infrastructure Layer** (`infrastructure`): HTTP sources and the sharded cache
//! - **API Layer** (`api`): REST front end
//!
//! ## Example
//!
//! ```rust,ignore
//! use txn_aggregator::application::use_cases::AggregateTransactionsUseCase;
//! use txn_aggregator::domain::value_objects::AccountId;
//!
//! let transactions = aggregator.execute(&AccountId::new("033")).await?;
//! for tx in transactions.iter() {
//!     println!("{} {} {}", tx.timestamp(), tx.id(), tx.amount());
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
