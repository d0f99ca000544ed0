//! # REST API
//!
//! HTTP front end over the aggregation facade.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, ErrorResponse, HealthResponse};
pub use routes::create_router;
