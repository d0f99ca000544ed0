//! # Timestamp Value Object
//!
//! Point in time with microsecond resolution.
//!
//! Sources report local date-times without an offset, so [`Timestamp`] wraps a
//! [`NaiveDateTime`] truncated to whole microseconds. The canonical text form
//! is `yyyy-MM-ddTHH:mm:ss.SSSSSS`, which sorts the same way as the value.
//!
//! Parsing is lenient about what backends send:
//!
//! - `2024-05-01T10:15:30.123456` (canonical)
//! - `2024-05-01T10:15:30.5` / `2024-05-01T10:15:30` (fewer fractional digits)
//! - `2024-05-01T10:15` (seconds omitted when zero)
//! - `2024-05-01T10:15:30.123Z` (RFC 3339, converted to UTC)
//!
//! # Examples
//!
//! ```
//! use txn_aggregator::domain::value_objects::timestamp::Timestamp;
//!
//! let ts = Timestamp::parse("2024-05-01T10:15").unwrap();
//! assert_eq!(ts.to_string(), "2024-05-01T10:15:00.000000");
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Canonical output format.
const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Accepted input formats, tried in order.
const INPUT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// A point in time with microsecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Creates a timestamp, truncating anything finer than a microsecond.
    #[must_use]
    pub fn new(value: NaiveDateTime) -> Self {
        let nanos = value.nanosecond();
        let truncated = value
            .with_nanosecond(nanos - nanos % 1_000)
            .unwrap_or(value);
        Self(truncated)
    }

    /// Parses a timestamp from any of the accepted input formats.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTimestamp` if no format matches.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let input = input.trim();
        for format in INPUT_FORMATS {
            if let Ok(value) = NaiveDateTime::parse_from_str(input, format) {
                return Ok(Self::new(value));
            }
        }
        DateTime::parse_from_rfc3339(input)
            .map(|value| Self::new(value.naive_utc()))
            .map_err(|e| DomainError::InvalidTimestamp(format!("'{input}': {e}")))
    }

    /// Returns the inner date-time.
    #[inline]
    #[must_use]
    pub fn get(&self) -> NaiveDateTime {
        self.0
    }

    /// Returns a new timestamp shifted by the given number of seconds.
    #[must_use]
    pub fn add_secs(&self, secs: i64) -> Self {
        Self(self.0 + TimeDelta::seconds(secs))
    }

    /// Returns a new timestamp shifted by the given number of microseconds.
    #[must_use]
    pub fn add_micros(&self, micros: i64) -> Self {
        Self(self.0 + TimeDelta::microseconds(micros))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self::new(value)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_canonical_roundtrips_text() {
        let text = "2024-05-01T10:15:30.123456";
        assert_eq!(Timestamp::parse(text).unwrap().to_string(), text);
    }

    #[test]
    fn parse_pads_short_fraction() {
        let ts = Timestamp::parse("2024-05-01T10:15:30.5").unwrap();
        assert_eq!(ts.to_string(), "2024-05-01T10:15:30.500000");
    }

    #[test]
    fn parse_without_fraction() {
        let ts = Timestamp::parse("2024-05-01T10:15:30").unwrap();
        assert_eq!(ts.to_string(), "2024-05-01T10:15:30.000000");
    }

    #[test]
    fn parse_without_seconds() {
        let ts = Timestamp::parse("2024-05-01T10:15").unwrap();
        assert_eq!(ts.to_string(), "2024-05-01T10:15:00.000000");
    }

    #[test]
    fn parse_rfc3339_converts_to_utc() {
        let ts = Timestamp::parse("2024-05-01T12:15:30+02:00").unwrap();
        assert_eq!(ts.to_string(), "2024-05-01T10:15:30.000000");
    }

    #[test]
    fn parse_truncates_nanoseconds() {
        let ts = Timestamp::parse("2024-05-01T10:15:30.123456789").unwrap();
        assert_eq!(ts.to_string(), "2024-05-01T10:15:30.123456");
        assert_eq!(ts, Timestamp::parse("2024-05-01T10:15:30.123456").unwrap());
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = Timestamp::parse("yesterday").unwrap_err();
        assert!(matches!(err, DomainError::InvalidTimestamp(_)));
    }

    #[test]
    fn ordering_follows_time() {
        let base = Timestamp::parse("2024-05-01T10:15:30").unwrap();
        assert!(base.add_micros(1) > base);
        assert!(base.add_secs(-1) < base);
    }

    #[test]
    fn serde_uses_canonical_text() {
        let ts = Timestamp::parse("2024-05-01T10:15").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-05-01T10:15:00.000000\"");

        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }
}
