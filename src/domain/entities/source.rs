//! # Source Descriptor
//!
//! Static description of one backend source: an identifier and the endpoint
//! that answers "transactions for account X".
//!
//! The endpoint may contain an `{account}` placeholder; otherwise the account
//! is appended as the `account` query parameter.
//!
//! # Examples
//!
//! ```
//! use txn_aggregator::domain::entities::source::SourceDescriptor;
//! use txn_aggregator::domain::value_objects::AccountId;
//!
//! let descriptor =
//!     SourceDescriptor::new("server-1", "http://localhost:8888/transactions").unwrap();
//! assert_eq!(
//!     descriptor.url_for(&AccountId::new("033")),
//!     "http://localhost:8888/transactions?account=033"
//! );
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{AccountId, SourceId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder substituted with the URL-encoded account.
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// Backend source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Source identifier.
    id: SourceId,
    /// Endpoint URL or URL template.
    endpoint: String,
}

impl SourceDescriptor {
    /// Creates a validated descriptor.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSourceDescriptor` if the id is blank or the
    /// endpoint is not an `http://` or `https://` URL.
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>) -> DomainResult<Self> {
        let descriptor = Self {
            id: SourceId::new(id.into().trim()),
            endpoint: endpoint.into().trim().to_string(),
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Checks the descriptor invariants.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSourceDescriptor` on a blank id or a
    /// non-HTTP endpoint.
    pub fn validate(&self) -> DomainResult<()> {
        if self.id.as_str().is_empty() {
            return Err(DomainError::InvalidSourceDescriptor(
                "source id cannot be empty".to_string(),
            ));
        }
        let scheme_ok =
            self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://");
        if !scheme_ok {
            return Err(DomainError::InvalidSourceDescriptor(format!(
                "endpoint for {} must be an http(s) URL, got '{}'",
                self.id, self.endpoint
            )));
        }
        Ok(())
    }

    /// Returns the source identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// Returns the endpoint as configured.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Builds the request URL for an account.
    #[must_use]
    pub fn url_for(&self, account: &AccountId) -> String {
        let encoded = urlencoding::encode(account.as_str());
        if self.endpoint.contains(ACCOUNT_PLACEHOLDER) {
            return self.endpoint.replace(ACCOUNT_PLACEHOLDER, &encoded);
        }
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}account={}", self.endpoint, separator, encoded)
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.id, self.endpoint)
    }
}

/// Parses the `id=endpoint` form used by environment overrides.
impl FromStr for SourceDescriptor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, endpoint) = s.split_once('=').ok_or_else(|| {
            DomainError::InvalidSourceDescriptor(format!("expected id=endpoint, got '{s}'"))
        })?;
        Self::new(id, endpoint)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn url_for_appends_query_parameter() {
        let d = SourceDescriptor::new("a", "http://host/tx?limit=5").unwrap();
        assert_eq!(
            d.url_for(&AccountId::new("033")),
            "http://host/tx?limit=5&account=033"
        );
    }

    #[test]
    fn url_for_substitutes_placeholder() {
        let d = SourceDescriptor::new("a", "https://host/accounts/{account}/tx").unwrap();
        assert_eq!(
            d.url_for(&AccountId::new("a b")),
            "https://host/accounts/a%20b/tx"
        );
    }

    #[test]
    fn url_for_encodes_account() {
        let d = SourceDescriptor::new("a", "http://host/tx").unwrap();
        assert_eq!(
            d.url_for(&AccountId::new("x&y=z")),
            "http://host/tx?account=x%26y%3Dz"
        );
    }

    #[test]
    fn new_rejects_blank_id() {
        let err = SourceDescriptor::new("  ", "http://host").unwrap_err();
        assert!(matches!(err, DomainError::InvalidSourceDescriptor(_)));
    }

    #[test]
    fn new_rejects_non_http_endpoint() {
        assert!(SourceDescriptor::new("a", "ftp://host").is_err());
        assert!(SourceDescriptor::new("a", "").is_err());
    }

    #[test]
    fn from_str_parses_pair() {
        let d: SourceDescriptor = "server-2=http://localhost:8889/transactions"
            .parse()
            .unwrap();
        assert_eq!(d.id().as_str(), "server-2");
        assert_eq!(d.endpoint(), "http://localhost:8889/transactions");
    }

    #[test]
    fn from_str_requires_separator() {
        assert!("server-2".parse::<SourceDescriptor>().is_err());
    }
}
