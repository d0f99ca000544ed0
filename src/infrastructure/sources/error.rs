//! # Source Errors
//!
//! Failure taxonomy for a single attempt against a backend source.
//!
//! Every fetch-time variant is retryable: backends are read-only and are
//! expected to fail only transiently. [`SourceErrorKind`] is the copyable tag
//! that survives into a terminal failure outcome once retries are exhausted.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// HTTP statuses a backend uses to signal overload or throttling.
pub const OVERLOAD_STATUSES: [u16; 5] = [429, 502, 503, 504, 529];

/// Returns true if the status signals overload or throttling.
#[must_use]
pub fn is_overload_status(status: u16) -> bool {
    OVERLOAD_STATUSES.contains(&status)
}

/// Error from one attempt against a source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Connection could not be established or was interrupted.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The attempt did not complete within its timeout.
    #[error("attempt timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout applied to the attempt.
        timeout_ms: u64,
    },

    /// The source signalled overload.
    #[error("source throttled with status {status}")]
    Throttled {
        /// HTTP status returned.
        status: u16,
    },

    /// The source returned a non-success status outside the overload set.
    #[error("unexpected status {status}")]
    UnexpectedStatus {
        /// HTTP status returned.
        status: u16,
    },

    /// The success body could not be decoded.
    #[error("malformed response body: {message}")]
    Decode {
        /// Error message.
        message: String,
    },

    /// The source could not be set up.
    #[error("source configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },
}

impl SourceError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Classifies a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        if is_overload_status(status) {
            Self::Throttled { status }
        } else {
            Self::UnexpectedStatus { status }
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => SourceErrorKind::Transport,
            Self::Throttled { .. } => SourceErrorKind::Throttled,
            Self::UnexpectedStatus { .. } => SourceErrorKind::UnexpectedStatus,
            Self::Decode { .. } => SourceErrorKind::Decode,
            Self::Configuration { .. } => SourceErrorKind::Configuration,
        }
    }
}

/// Copyable classification of a [`SourceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceErrorKind {
    /// Connection failure or attempt timeout.
    Transport,
    /// Overload / throttling status.
    Throttled,
    /// Non-success status outside the overload set.
    UnexpectedStatus,
    /// Malformed success body.
    Decode,
    /// Source setup failure.
    Configuration,
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transport => "TRANSPORT",
            Self::Throttled => "THROTTLED",
            Self::UnexpectedStatus => "UNEXPECTED_STATUS",
            Self::Decode => "DECODE",
            Self::Configuration => "CONFIGURATION",
        };
        write!(f, "{}", s)
    }
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;
