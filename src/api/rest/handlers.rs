//! # REST Handlers
//!
//! Request handlers for the REST API.
//!
//! # Endpoints
//!
//! - `GET /aggregate?account=X`: merged transactions of an account, newest first
//! - `GET /health`: liveness and version

use crate::application::error::ApplicationError;
use crate::application::use_cases::aggregate_transactions::AggregateTransactionsUseCase;
use crate::domain::entities::TransactionList;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for REST handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Aggregation facade.
    pub aggregator: Arc<AggregateTransactionsUseCase>,
}

// ============================================================================
// Error Response
// ============================================================================

/// Standard error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<ApplicationError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: ApplicationError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let code = match &err {
            ApplicationError::ValidationError(_) => "VALIDATION_ERROR",
            ApplicationError::DomainError(e) if e.is_validation_error() => "VALIDATION_ERROR",
            ApplicationError::DomainError(_) => "CONFIGURATION_ERROR",
            ApplicationError::CacheError(_) => "CACHE_ERROR",
        };
        (status, Json(ErrorResponse::new(code, err.to_string())))
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Query parameters of `GET /aggregate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateQuery {
    /// Account to aggregate.
    pub account: Option<String>,
}

/// Returns the merged transactions of an account.
///
/// # Errors
///
/// - 400 if `account` is missing or blank.
/// - 500 if the aggregation cache is corrupted.
#[instrument(skip_all, fields(account = query.account.as_deref().unwrap_or_default()))]
pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AggregateQuery>,
) -> Result<Json<TransactionList>, (StatusCode, Json<ErrorResponse>)> {
    let Some(account) = query.account else {
        return Err(ApplicationError::validation("query parameter 'account' is required").into());
    };

    let transactions = state.aggregator.execute_raw(&account).await?;
    debug!(records = transactions.len(), "Aggregation served");

    Ok(Json(transactions))
}

// ============================================================================
// Health Check
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
