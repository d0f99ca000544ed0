//! # REST Routes
//!
//! Route definitions for the REST API.
//!
//! # Route Structure
//!
//! ```text
//! /
//! ├── /aggregate   GET - Merged transactions (?account=X)
//! └── /health      GET - Health check
//! ```
//!
//! # Examples
//!
//! ```ignore
//! use txn_aggregator::api::rest::routes::create_router;
//! use txn_aggregator::api::rest::handlers::AppState;
//!
//! let state = Arc::new(AppState { aggregator });
//! let router = create_router(state, true);
//!
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, router).await?;
//! ```

use crate::api::rest::handlers::{AppState, aggregate, health_check};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/aggregate", get(aggregate))
        .route("/health", get(health_check))
}

/// Creates the REST API router with all endpoints and middleware.
pub fn create_router(state: Arc<AppState>, enable_cors: bool) -> Router {
    let router = routes().layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

/// Creates a minimal router for testing without middleware.
#[cfg(test)]
pub fn create_test_router(state: Arc<AppState>) -> Router {
    routes().with_state(state)
}
