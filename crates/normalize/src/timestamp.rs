//! Timestamp normalization.
//!
//! Parses the timestamp layouts emitted by supported sources into
//! `DateTime<Utc>`. Malformed input fails with
//! [`TimestampError::InvalidTimestamp`], which parsers treat as a soft failure.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use thiserror::Error;

/// Fluentd's default `time_format` for syslog input (`2006-01-02 15:04:05 -0700`)
const FLUENTD_LAYOUT: &str = "%Y-%m-%d %H:%M:%S %z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// RFC 3339 / ISO-8601 with offset (`2003-10-11T22:14:15.003Z`)
    Rfc3339,
    /// Fluentd record time (`2020-01-06 19:41:37 +0000`)
    Fluentd,
}

impl TimestampFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampFormat::Rfc3339 => "rfc3339",
            TimestampFormat::Fluentd => "fluentd",
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("invalid {format} timestamp: {value:?}")]
    InvalidTimestamp {
        value: String,
        format: TimestampFormat,
    },
}

impl TimestampError {
    fn invalid(value: &str, format: TimestampFormat) -> Self {
        TimestampError::InvalidTimestamp {
            value: value.to_string(),
            format,
        }
    }
}

/// Parse `value` in the given layout and normalize it to UTC.
pub fn parse(value: &str, format: TimestampFormat) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = value.trim();
    match format {
        TimestampFormat::Rfc3339 => DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| TimestampError::invalid(value, format)),
        TimestampFormat::Fluentd => DateTime::parse_from_str(trimmed, FLUENTD_LAYOUT)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                // Some fluentd configs drop the offset; those times are UTC
                NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
                    .map(|naive| Utc.from_utc_datetime(&naive))
            })
            .map_err(|_| TimestampError::invalid(value, format)),
    }
}

fn deserialize_opt<'de, D>(
    deserializer: D,
    format: TimestampFormat,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse(&s, format)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Serde adapter for optional RFC 3339 fields
pub mod rfc3339 {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_opt(deserializer, TimestampFormat::Rfc3339)
    }
}

/// Serde adapter for optional fluentd record times.
///
/// Writes back the same layout it reads, normalized to `+0000`.
pub mod fluentd {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.collect_str(&ts.format(FLUENTD_LAYOUT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_opt(deserializer, TimestampFormat::Fluentd)
    }
}
