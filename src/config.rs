//! # Configuration
//!
//! Application configuration loading and management.
//!
//! # Configuration Sources
//!
//! Configuration is loaded in the following order (later sources override earlier):
//! 1. Default values
//! 2. Configuration file (`TXN_AGG_CONFIG_FILE`, default `config.toml`, if it exists)
//! 3. Environment variables (prefixed with `TXN_AGG_`)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TXN_AGG_REST_HOST` | REST server host | `0.0.0.0` |
//! | `TXN_AGG_REST_PORT` | REST server port | `8080` |
//! | `TXN_AGG_LOG_LEVEL` | Log level | `info` |
//! | `TXN_AGG_LOG_FORMAT` | Log format (json/pretty) | `json` |
//! | `TXN_AGG_SOURCES` | Sources as `id=url,id=url` | two local servers |
//! | `TXN_AGG_ATTEMPT_TIMEOUT_MS` | Per-attempt timeout | `2000` |
//! | `TXN_AGG_MAX_RETRIES` | Retries after the first attempt | `5` |
//! | `TXN_AGG_OVERALL_DEADLINE_MS` | Deadline of one aggregation | `3000` |
//! | `TXN_AGG_CACHE_TTL_SECS` | Cache TTL (`0`/`none` = no expiry) | no expiry |
//! | `TXN_AGG_SINGLE_FLIGHT` | Collapse concurrent misses | `true` |
//! | `TXN_AGG_CACHE_PARTIAL_RESULTS` | Cache results with failed sources | `true` |
//!
//! # File Format
//!
//! ```toml
//! [rest]
//! port = 8080
//!
//! [aggregation]
//! overall_deadline_ms = 3000
//! cache_ttl_secs = 60
//!
//! [[aggregation.sources]]
//! id = "server-1"
//! endpoint = "http://localhost:8888/transactions"
//! ```

use crate::application::services::retry::RetryPolicy;
use crate::domain::entities::SourceDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "TXN_AGG_";

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("invalid config value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// REST/HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Server host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_rest_port")]
    pub port: u16,

    /// Enable CORS.
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_rest_port(),
            enable_cors: true,
        }
    }
}

impl RestConfig {
    /// Returns the socket address for the REST server.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::invalid("rest.host:port", format!("{e}")))
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (structured logging).
    #[default]
    Json,
    /// Pretty format (human-readable).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include target (module path) in logs.
    #[serde(default = "default_true")]
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Json,
            include_target: true,
        }
    }
}

// ============================================================================
// Aggregation Configuration
// ============================================================================

/// Aggregation engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Backend sources, in declaration order.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceDescriptor>,

    /// Timeout of a single attempt in milliseconds.
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_ms: u64,

    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry in milliseconds.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Backoff cap in milliseconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Deadline of one aggregation in milliseconds.
    #[serde(default = "default_overall_deadline")]
    pub overall_deadline_ms: u64,

    /// Cache entry lifetime in seconds. `None` or `0` never expires.
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,

    /// Number of cache shards.
    #[serde(default = "default_cache_shards")]
    pub cache_shards: usize,

    /// Collapse concurrent misses for one account.
    #[serde(default = "default_true")]
    pub single_flight: bool,

    /// Cache results in which some sources failed.
    #[serde(default = "default_true")]
    pub cache_partial_results: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            attempt_timeout_ms: default_attempt_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            overall_deadline_ms: default_overall_deadline(),
            cache_ttl_secs: None,
            cache_shards: default_cache_shards(),
            single_flight: true,
            cache_partial_results: true,
        }
    }
}

impl AggregationConfig {
    /// Returns the retry policy described by this configuration.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.initial_backoff_ms,
            self.max_backoff_ms,
            2.0,
            0.1,
        )
    }

    /// Returns the per-attempt timeout.
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// Returns the cache TTL; `None` means entries never expire.
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// REST server configuration.
    #[serde(default)]
    pub rest: RestConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Aggregation engine configuration.
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables and optional config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// environment override is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let config_path = std::env::var(format!("{ENV_PREFIX}CONFIG_FILE"))
            .unwrap_or_else(|_| "config.toml".to_string());

        if Path::new(&config_path).exists() {
            config = Self::from_file(&config_path)?;
        }

        config.apply_env_overrides(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies overrides read through `lookup` (unprefixed key names are
    /// prefixed with [`ENV_PREFIX`]).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the variable if any override
    /// cannot be parsed.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        // REST configuration
        if let Some(host) = var("REST_HOST") {
            self.rest.host = host;
        }
        if let Some(port) = var("REST_PORT") {
            self.rest.port = parse_env("REST_PORT", &port)?;
        }

        // Logging configuration
        if let Some(level) = var("LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.log.format = match format.trim().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::invalid(
                        &format!("{ENV_PREFIX}LOG_FORMAT"),
                        format!("'{format}' is not one of: json, pretty"),
                    ));
                }
            };
        }

        // Aggregation configuration
        if let Some(sources) = var("SOURCES") {
            self.aggregation.sources = parse_sources(&sources)?;
        }
        if let Some(ms) = var("ATTEMPT_TIMEOUT_MS") {
            self.aggregation.attempt_timeout_ms = parse_env("ATTEMPT_TIMEOUT_MS", &ms)?;
        }
        if let Some(retries) = var("MAX_RETRIES") {
            self.aggregation.max_retries = parse_env("MAX_RETRIES", &retries)?;
        }
        if let Some(ms) = var("OVERALL_DEADLINE_MS") {
            self.aggregation.overall_deadline_ms = parse_env("OVERALL_DEADLINE_MS", &ms)?;
        }
        if let Some(ttl) = var("CACHE_TTL_SECS") {
            let normalized = ttl.trim().to_lowercase();
            self.aggregation.cache_ttl_secs = if normalized == "none" || normalized.is_empty() {
                None
            } else {
                Some(parse_env("CACHE_TTL_SECS", &normalized)?)
            };
        }
        if let Some(flag) = var("SINGLE_FLIGHT") {
            self.aggregation.single_flight = parse_env("SINGLE_FLIGHT", &flag)?;
        }
        if let Some(flag) = var("CACHE_PARTIAL_RESULTS") {
            self.aggregation.cache_partial_results = parse_env("CACHE_PARTIAL_RESULTS", &flag)?;
        }

        Ok(())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rest.socket_addr()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "log.level",
                format!(
                    "invalid log level '{}', must be one of: {:?}",
                    self.log.level, valid_levels
                ),
            ));
        }

        let aggregation = &self.aggregation;
        if aggregation.sources.is_empty() {
            return Err(ConfigError::invalid(
                "aggregation.sources",
                "at least one source is required",
            ));
        }
        let mut seen = HashSet::with_capacity(aggregation.sources.len());
        for source in &aggregation.sources {
            source
                .validate()
                .map_err(|e| ConfigError::invalid("aggregation.sources", e.to_string()))?;
            if !seen.insert(source.id()) {
                return Err(ConfigError::invalid(
                    "aggregation.sources",
                    format!("duplicate source id '{}'", source.id()),
                ));
            }
        }

        if aggregation.overall_deadline_ms == 0 {
            return Err(ConfigError::invalid(
                "aggregation.overall_deadline_ms",
                "must be greater than zero",
            ));
        }
        if aggregation.attempt_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "aggregation.attempt_timeout_ms",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

/// Parses the override `name`, reporting the prefixed variable on failure.
fn parse_env<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        ConfigError::invalid(&format!("{ENV_PREFIX}{name}"), format!("'{raw}': {e}"))
    })
}

fn parse_sources(value: &str) -> Result<Vec<SourceDescriptor>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<SourceDescriptor>()
                .map_err(|e| ConfigError::invalid("TXN_AGG_SOURCES", e.to_string()))
        })
        .collect()
}

// ============================================================================
// Default Value Functions
// ============================================================================

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_rest_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sources() -> Vec<SourceDescriptor> {
    [
        ("server-1", "http://localhost:8888/transactions"),
        ("server-2", "http://localhost:8889/transactions"),
    ]
    .into_iter()
    .filter_map(|(id, endpoint)| SourceDescriptor::new(id, endpoint).ok())
    .collect()
}

fn default_attempt_timeout() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_backoff() -> u64 {
    25
}

fn default_max_backoff() -> u64 {
    500
}

fn default_overall_deadline() -> u64 {
    3000
}

fn default_cache_shards() -> usize {
    16
}
