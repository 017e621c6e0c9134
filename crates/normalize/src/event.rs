//! Core record and canonical event.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::formats::Record;
use crate::indicator::{IndicatorClass, Indicators};

/// Fields every canonical event carries regardless of its source format.
///
/// Only [`CoreRecord::finalize`] builds one, so `log_type` and `event_time`
/// are always set and cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreRecord {
    #[serde(rename = "p_log_type")]
    log_type: &'static str,
    #[serde(rename = "p_event_time")]
    event_time: DateTime<Utc>,
    #[serde(rename = "p_parse_time")]
    parse_time: DateTime<Utc>,
    #[serde(flatten)]
    indicators: Indicators,
}

impl CoreRecord {
    /// Seal the record once all format-specific fields have been mapped.
    ///
    /// Takes ownership of the indicator accumulator. When the source carries
    /// no event time, the parse time is used instead.
    pub fn finalize(
        log_type: &'static str,
        event_time: Option<DateTime<Utc>>,
        indicators: Indicators,
    ) -> Self {
        let parse_time = Utc::now();
        Self {
            log_type,
            event_time: event_time.unwrap_or(parse_time),
            parse_time,
            indicators,
        }
    }

    pub fn log_type(&self) -> &'static str {
        self.log_type
    }

    pub fn event_time(&self) -> DateTime<Utc> {
        self.event_time
    }

    pub fn parse_time(&self) -> DateTime<Utc> {
        self.parse_time
    }

    pub fn indicators(&self) -> &Indicators {
        &self.indicators
    }
}

/// A normalized, validated log entry: the format record plus its core fields.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(flatten)]
    record: Record,
    #[serde(flatten)]
    core: CoreRecord,
}

impl Event {
    pub fn new(core: CoreRecord, record: impl Into<Record>) -> Self {
        Self {
            record: record.into(),
            core,
        }
    }

    pub fn core(&self) -> &CoreRecord {
        &self.core
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn log_type(&self) -> &'static str {
        self.core.log_type
    }

    pub fn event_time(&self) -> DateTime<Utc> {
        self.core.event_time
    }

    pub fn indicators(&self) -> &Indicators {
        &self.core.indicators
    }

    /// Shorthand for checking a single indicator value
    pub fn has_indicator(&self, class: IndicatorClass, value: &str) -> bool {
        self.core.indicators.contains(class, value)
    }
}
