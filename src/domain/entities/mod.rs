//! # Domain Entities
//!
//! - [`Transaction`]: Immutable transaction record from a source
//! - [`SourceDescriptor`]: Static backend source configuration

pub mod source;
pub mod transaction;

pub use source::SourceDescriptor;
pub use transaction::{Transaction, TransactionList};
