//! Syslog records as emitted by fluentd's syslog parser plugin.
//!
//! Fluentd parses the wire format and forwards one JSON object per message;
//! these parsers map that object, not the raw syslog line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{CoreRecord, Event};
use crate::formats::append_host;
use crate::indicator::Indicators;
use crate::timestamp;
use crate::traits::{LogParser, ParseError};
use crate::validate::{self, Fields, Validate};

pub const LOG_TYPE_3164: &str = "Fluentd.Syslog3164";
pub const LOG_TYPE_5424: &str = "Fluentd.Syslog5424";

/// Highest valid PRI value (facility 23, severity 7)
const MAX_PRIORITY: &str = "max=191";

/// RFC 3164 (BSD syslog) message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rfc3164 {
    /// Facility * 8 + Severity
    #[serde(rename = "pri", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Machine that originally sent the message
    #[serde(rename = "host", default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Device or application that originated the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ident: Option<String>,
    #[serde(rename = "pid", default, skip_serializing_if = "Option::is_none")]
    pub proc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        rename = "time",
        default,
        with = "timestamp::fluentd",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Validate for Rfc3164 {
    fn type_name(&self) -> &'static str {
        "RFC3164"
    }

    fn visit_fields(&self, fields: &mut Fields<'_>) {
        fields.field("Priority", &self.priority, &["required", MAX_PRIORITY]);
    }
}

/// RFC 5424 message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rfc5424 {
    /// Facility * 8 + Severity
    #[serde(rename = "pri", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(rename = "host", default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ident: Option<String>,
    #[serde(rename = "pid", default, skip_serializing_if = "Option::is_none")]
    pub proc_id: Option<String>,
    /// Type of message, e.g. `TCPIN` for incoming firewall traffic
    #[serde(rename = "msgid", default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<String>,
    /// Structured data, kept as the raw string
    #[serde(rename = "extradata", default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        rename = "time",
        default,
        with = "timestamp::fluentd",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Validate for Rfc5424 {
    fn type_name(&self) -> &'static str {
        "RFC5424"
    }

    fn visit_fields(&self, fields: &mut Fields<'_>) {
        fields.field("Priority", &self.priority, &["required", MAX_PRIORITY]);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Rfc3164Parser;

impl LogParser for Rfc3164Parser {
    fn log_type(&self) -> &'static str {
        LOG_TYPE_3164
    }

    fn parse_events(&self, raw: &str) -> Result<Vec<Event>, ParseError> {
        let record: Rfc3164 = serde_json::from_str(raw)?;

        let mut indicators = Indicators::new();
        // Should be an FQDN but may be an IP address (RFC 3164 §6.2.4)
        if let Some(host) = &record.hostname {
            append_host(&mut indicators, host);
        }
        let core = CoreRecord::finalize(self.log_type(), record.timestamp, indicators);

        validate::global().validate(&record)?;
        Ok(vec![Event::new(core, record)])
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Rfc5424Parser;

impl LogParser for Rfc5424Parser {
    fn log_type(&self) -> &'static str {
        LOG_TYPE_5424
    }

    fn parse_events(&self, raw: &str) -> Result<Vec<Event>, ParseError> {
        let record: Rfc5424 = serde_json::from_str(raw)?;

        let mut indicators = Indicators::new();
        if let Some(host) = &record.hostname {
            append_host(&mut indicators, host);
        }
        let core = CoreRecord::finalize(self.log_type(), record.timestamp, indicators);

        validate::global().validate(&record)?;
        Ok(vec![Event::new(core, record)])
    }
}
