//! # Application Errors
//!
//! Error types for the application layer.
//!
//! Only failures of the engine's own infrastructure reach a caller. Sources
//! that are unavailable or too slow are not errors here; they degrade to an
//! empty contribution inside the aggregation result.

use crate::domain::errors::DomainError;
use crate::infrastructure::cache::CacheError;
use thiserror::Error;

/// Application layer error.
///
/// `Clone` so one failed aggregation can be handed to every caller that joined
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    /// Request validation failed.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Domain error.
    #[error("domain error: {0}")]
    DomainError(#[from] DomainError),

    /// The aggregation cache is corrupted.
    #[error("cache error: {0}")]
    CacheError(#[from] CacheError),
}

impl ApplicationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Returns true if the caller sent a bad request.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::ValidationError(_) => true,
            Self::DomainError(e) => e.is_validation_error(),
            Self::CacheError(_) => false,
        }
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_is_client_error() {
        let err = ApplicationError::validation("account is required");
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "validation error: account is required");
    }

    #[test]
    fn invalid_id_is_client_error() {
        let err = ApplicationError::from(DomainError::InvalidId("blank".to_string()));
        assert!(err.is_client_error());
    }

    #[test]
    fn cache_error_is_server_error() {
        let err = ApplicationError::from(CacheError::Poisoned { shard: 3 });
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("shard 3"));
    }
}
