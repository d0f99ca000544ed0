//! # Transaction Sources
//!
//! Backend access for the aggregation engine.
//!
//! - [`traits::TransactionSource`]: one-attempt fetch contract
//! - [`http_source::HttpTransactionSource`]: JSON-over-HTTP implementation
//! - [`registry::SourceRegistry`]: configured sources in declaration order
//! - [`error::SourceError`]: per-attempt failure taxonomy

pub mod error;
pub mod http_client;
pub mod http_source;
pub mod registry;
pub mod traits;

pub use error::{SourceError, SourceErrorKind, SourceResult};
pub use http_client::HttpClient;
pub use http_source::HttpTransactionSource;
pub use registry::{RegistryError, SourceRegistry};
pub use traits::TransactionSource;
