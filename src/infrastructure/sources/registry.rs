//! # Source Registry
//!
//! The configured set of backend sources.
//!
//! The registry is built once at startup and is immutable afterwards. It
//! preserves declaration order, which is the order fan-out outcomes are
//! reported in, and rejects duplicate source identifiers.
//!
//! # Examples
//!
//! ```ignore
//! use txn_aggregator::infrastructure::sources::registry::SourceRegistry;
//!
//! let registry = SourceRegistry::from_descriptors(&config.aggregation.sources, 2000)?;
//! for source in registry.sources() {
//!     println!("{}", source.source_id());
//! }
//! ```

use crate::domain::entities::SourceDescriptor;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::SourceId;
use crate::infrastructure::sources::error::SourceError;
use crate::infrastructure::sources::http_source::HttpTransactionSource;
use crate::infrastructure::sources::traits::TransactionSource;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A descriptor is invalid or duplicated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A source could not be constructed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Ordered, immutable set of transaction sources.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn TransactionSource>>,
}

impl SourceRegistry {
    /// Creates a registry from already-built sources, in the given order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateSource` if two sources share an id.
    pub fn new(sources: Vec<Arc<dyn TransactionSource>>) -> Result<Self, DomainError> {
        let mut seen = HashSet::with_capacity(sources.len());
        for source in &sources {
            if !seen.insert(source.source_id().clone()) {
                return Err(DomainError::DuplicateSource(
                    source.source_id().to_string(),
                ));
            }
        }
        Ok(Self { sources })
    }

    /// Builds HTTP sources for each descriptor.
    ///
    /// `timeout_ms` is the HTTP-layer timeout of every request.
    ///
    /// # Errors
    ///
    /// Returns an error if a descriptor is invalid, duplicated, or its HTTP
    /// client cannot be built.
    pub fn from_descriptors(
        descriptors: &[SourceDescriptor],
        timeout_ms: u64,
    ) -> Result<Self, RegistryError> {
        let mut sources: Vec<Arc<dyn TransactionSource>> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            descriptor.validate()?;
            sources.push(Arc::new(HttpTransactionSource::new(
                descriptor.clone(),
                timeout_ms,
            )?));
        }
        Ok(Self::new(sources)?)
    }

    /// Returns all sources in declaration order.
    #[must_use]
    pub fn sources(&self) -> &[Arc<dyn TransactionSource>] {
        &self.sources
    }

    /// Gets a source by ID.
    #[must_use]
    pub fn get(&self, source_id: &SourceId) -> Option<Arc<dyn TransactionSource>> {
        self.sources
            .iter()
            .find(|s| s.source_id() == source_id)
            .map(Arc::clone)
    }

    /// Returns the IDs of all sources in declaration order.
    #[must_use]
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.source_id().clone()).collect()
    }

    /// Returns the number of sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if no sources are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
