//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`SourceId`]: Backend source identifier
//! - [`AccountId`]: Aggregation key
//! - [`TransactionId`]: Transaction identifier within a source
//!
//! ## Time
//!
//! - [`Timestamp`]: Microsecond-resolution point in time

pub mod ids;
pub mod timestamp;

pub use ids::{AccountId, SourceId, TransactionId};
pub use timestamp::Timestamp;
