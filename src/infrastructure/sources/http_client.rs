//! # HTTP Client
//!
//! Thin wrapper over [`reqwest::Client`] that maps every failure onto
//! [`SourceError`].
//!
//! Classification of a single GET:
//!
//! | Outcome | Error |
//! |---------|-------|
//! | connect / send failure | `Transport` |
//! | client timeout | `Timeout` |
//! | 429, 502, 503, 504, 529 | `Throttled` |
//! | any other non-2xx | `UnexpectedStatus` |
//! | 2xx with undecodable body | `Decode` |

use crate::infrastructure::sources::error::{SourceError, SourceResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for source requests.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout_ms: u64,
}

impl HttpClient {
    /// Creates a client whose requests time out after `timeout_ms`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Configuration` if the underlying client cannot be
    /// built.
    pub fn new(timeout_ms: u64) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| SourceError::configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout_ms })
    }

    /// Returns the request timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Issues a GET and decodes a JSON success body.
    ///
    /// # Errors
    ///
    /// Returns the classified [`SourceError`] for the failure.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> SourceResult<T> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::from_status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        serde_json::from_slice(&body).map_err(|e| SourceError::decode(e.to_string()))
    }

    fn map_reqwest_error(&self, error: reqwest::Error) -> SourceError {
        if error.is_timeout() {
            SourceError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            SourceError::transport(error.to_string())
        }
    }
}
