//! # Domain Layer
//!
//! Core types of the aggregation engine.
//!
//! This layer contains:
//! - **Entities**: [`Transaction`](entities::Transaction) records and
//!   [`SourceDescriptor`](entities::SourceDescriptor) configuration
//! - **Value Objects**: Identifiers and microsecond timestamps
//! - **Errors**: Domain-specific error types

pub mod entities;
pub mod errors;
pub mod value_objects;
