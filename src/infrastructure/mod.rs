//! # Infrastructure Layer
//!
//! External adapters used by the application layer.
//!
//! ## Sources
//!
//! Single-attempt access to backend transaction services over HTTP, error
//! classification, and the static source registry.
//!
//! ## Cache
//!
//! In-memory, sharded storage of merged aggregation results.

pub mod cache;
pub mod sources;
