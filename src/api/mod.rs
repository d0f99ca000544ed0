//! # API Layer
//!
//! External interfaces of the transaction aggregator.
//!
//! - **REST**: `GET /aggregate?account=` and `GET /health`, with request
//!   tracing and permissive CORS

pub mod rest;
