use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::{CoreRecord, Event};
use crate::formats::append_host;
use crate::indicator::Indicators;
use crate::timestamp::{self, TimestampFormat};
use crate::traits::{LogParser, ParseError};
use crate::validate::{self, Fields, Validate};

pub const LOG_TYPE: &str = "Syslog.RFC5424";

/// RFC 5424 nil value
const NIL: &str = "-";

/// Syslog severity levels (RFC 5424 §6.2.1)
const SYSLOG_SEVERITIES: [&str; 8] = [
    "emergency", "alert", "critical", "error",
    "warning", "notice", "info", "debug",
];

/// Syslog facility names (RFC 5424 §6.2.1)
const SYSLOG_FACILITIES: [&str; 24] = [
    "kern", "user", "mail", "daemon", "auth", "syslog", "lpr", "news",
    "uucp", "cron", "authpriv", "ftp", "ntp", "audit", "alert2", "clock",
    "local0", "local1", "local2", "local3", "local4", "local5", "local6", "local7",
];

/// A raw RFC 5424 syslog line, split into its header parts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyslogRfc5424 {
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<&'static str>,
    pub version: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msgid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Validate for SyslogRfc5424 {
    fn type_name(&self) -> &'static str {
        "SyslogRFC5424"
    }

    fn visit_fields(&self, fields: &mut Fields<'_>) {
        fields.field("Priority", &self.priority, &["required", "max=191"]);
        fields.field("Version", &self.version, &["required", "oneof=1"]);
        fields.field("Hostname", &self.hostname, &["max=255"]);
        fields.field("Appname", &self.appname, &["max=48"]);
        fields.field("Procid", &self.procid, &["max=128"]);
        fields.field("Msgid", &self.msgid, &["max=32"]);
    }
}

/// Parser for raw RFC 5424 lines:
/// `<PRI>VERSION TIMESTAMP HOSTNAME APP-NAME PROCID MSGID SD [MSG]`
#[derive(Debug, Default, Clone, Copy)]
pub struct SyslogRfc5424Parser;

impl LogParser for SyslogRfc5424Parser {
    fn log_type(&self) -> &'static str {
        LOG_TYPE
    }

    fn parse_events(&self, raw: &str) -> Result<Vec<Event>, ParseError> {
        let record = parse_line(raw.trim_end_matches(['\r', '\n']))?;

        let mut indicators = Indicators::new();
        if let Some(host) = &record.hostname {
            append_host(&mut indicators, host);
        }
        let core = CoreRecord::finalize(self.log_type(), record.timestamp, indicators);

        validate::global().validate(&record)?;
        Ok(vec![Event::new(core, record)])
    }
}

fn parse_line(text: &str) -> Result<SyslogRfc5424, ParseError> {
    // Must start with <PRI>
    if !text.starts_with('<') {
        return Err(ParseError::InvalidFormat("Missing syslog priority".into()));
    }

    let pri_end = text
        .find('>')
        .ok_or_else(|| ParseError::InvalidFormat("Unterminated priority".into()))?;

    let pri_val: u8 = text[1..pri_end]
        .parse()
        .map_err(|_| ParseError::InvalidFormat("Invalid priority value".into()))?;

    let facility = SYSLOG_FACILITIES.get(usize::from(pri_val >> 3)).copied();
    let severity = SYSLOG_SEVERITIES.get(usize::from(pri_val & 0x07)).copied();

    // parts: [version, timestamp, hostname, app-name, procid, msgid, sd-and-msg]
    let parts: Vec<&str> = text[pri_end + 1..].splitn(7, ' ').collect();
    if parts.len() < 7 {
        return Err(ParseError::InvalidFormat("Truncated syslog header".into()));
    }

    let version: u16 = parts[0]
        .parse()
        .map_err(|_| ParseError::InvalidFormat("Invalid syslog version".into()))?;

    let timestamp = match parts[1] {
        NIL => None,
        ts => Some(timestamp::parse(ts, TimestampFormat::Rfc3339)?),
    };

    let (structured_data, message) = split_structured_data(parts[6])?;

    Ok(SyslogRfc5424 {
        priority: Some(pri_val),
        facility,
        severity,
        version: Some(version),
        timestamp,
        hostname: nil_to_none(parts[2]),
        appname: nil_to_none(parts[3]),
        procid: nil_to_none(parts[4]),
        msgid: nil_to_none(parts[5]),
        structured_data,
        message,
    })
}

fn nil_to_none(value: &str) -> Option<String> {
    if value == NIL || value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Split `SD [SP MSG]` into the structured data and the message.
///
/// Structured data is `-` or one or more `[...]` elements; `\]` and quoted
/// values may contain `]`.
fn split_structured_data(text: &str) -> Result<(Option<String>, Option<String>), ParseError> {
    let (sd, rest) = if let Some(rest) = text.strip_prefix(NIL) {
        (None, rest)
    } else if text.starts_with('[') {
        let end = structured_data_end(text)
            .ok_or_else(|| ParseError::InvalidFormat("Unterminated structured data".into()))?;
        (Some(text[..end].to_string()), &text[end..])
    } else {
        return Err(ParseError::InvalidFormat("Missing structured data".into()));
    };

    if !rest.is_empty() && !rest.starts_with(' ') {
        return Err(ParseError::InvalidFormat("Malformed structured data".into()));
    }

    // MSG may start with a UTF-8 BOM
    let message = rest
        .strip_prefix(' ')
        .map(|m| m.trim_start_matches('\u{feff}'))
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    Ok((sd, message))
}

/// Byte offset just past the last `]` of the structured data elements
fn structured_data_end(text: &str) -> Option<usize> {
    let mut in_element = false;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' if in_element => in_quotes = !in_quotes,
            '[' if !in_element => in_element = true,
            ']' if in_element && !in_quotes => {
                in_element = false;
                // Another element may follow immediately
                if !text[i + 1..].starts_with('[') {
                    return Some(i + 1);
                }
            }
            _ if !in_element => return None,
            _ => {}
        }
    }
    None
}
