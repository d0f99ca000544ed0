//! # Domain Errors
//!
//! Typed domain error definitions.
//!
//! This module provides the [`DomainError`] enum for representing
//! domain-level errors with numeric error codes.
//!
//! # Error Code Ranges
//!
//! - **1000-1999**: Validation errors
//! - **2000-2999**: Configuration errors
//!
//! # Examples
//!
//! ```
//! use txn_aggregator::domain::errors::DomainError;
//!
//! let error = DomainError::InvalidTimestamp("not a date".to_string());
//! assert_eq!(error.code(), 1002);
//! ```

use thiserror::Error;

/// Domain-level error with numeric error codes.
///
/// | Range | Category |
/// |-------|----------|
/// | 1000-1999 | Validation errors |
/// | 2000-2999 | Configuration errors |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (1000-1999)
    // ========================================================================
    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Invalid timestamp.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    // ========================================================================
    // Configuration Errors (2000-2999)
    // ========================================================================
    /// Source descriptor is malformed.
    #[error("invalid source descriptor: {0}")]
    InvalidSourceDescriptor(String),

    /// Two descriptors share an identifier.
    #[error("duplicate source: {0}")]
    DuplicateSource(String),
}

impl DomainError {
    /// Returns the numeric error code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::InvalidId(_) => 1001,
            Self::InvalidTimestamp(_) => 1002,

            Self::InvalidSourceDescriptor(_) => 2001,
            Self::DuplicateSource(_) => 2002,
        }
    }

    /// Returns the error category name.
    ///
    /// # Examples
    ///
    /// ```
    /// use txn_aggregator::domain::errors::DomainError;
    ///
    /// assert_eq!(DomainError::InvalidId("x".to_string()).category(), "validation");
    /// assert_eq!(DomainError::DuplicateSource("a".to_string()).category(), "configuration");
    /// ```
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.code() {
            1000..=1999 => "validation",
            2000..=2999 => "configuration",
            _ => "unknown",
        }
    }

    /// Returns true if this is a validation error.
    #[inline]
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self.code(), 1000..=1999)
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
