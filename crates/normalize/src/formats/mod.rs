/// Individual log format parsers

pub mod cloudtrail;
pub mod fluentd_syslog;
pub mod syslog;

use std::net::IpAddr;

use serde::Serialize;

use crate::indicator::{IndicatorClass, Indicators};
use crate::traits::{factory, ParserFactory};

// Re-export parser implementations
pub use cloudtrail::{CloudTrail, CloudTrailParser};
pub use fluentd_syslog::{Rfc3164, Rfc3164Parser, Rfc5424, Rfc5424Parser};
pub use syslog::{SyslogRfc5424, SyslogRfc5424Parser};

/// Format-specific part of a canonical event
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Record {
    FluentdSyslog3164(Rfc3164),
    FluentdSyslog5424(Rfc5424),
    SyslogRfc5424(SyslogRfc5424),
    CloudTrail(Box<CloudTrail>),
}

impl From<Rfc3164> for Record {
    fn from(record: Rfc3164) -> Self {
        Record::FluentdSyslog3164(record)
    }
}

impl From<Rfc5424> for Record {
    fn from(record: Rfc5424) -> Self {
        Record::FluentdSyslog5424(record)
    }
}

impl From<SyslogRfc5424> for Record {
    fn from(record: SyslogRfc5424) -> Self {
        Record::SyslogRfc5424(record)
    }
}

impl From<CloudTrail> for Record {
    fn from(record: CloudTrail) -> Self {
        Record::CloudTrail(Box::new(record))
    }
}

/// Factories for every shipped format
pub fn builtin() -> [ParserFactory; 4] {
    [
        factory::<Rfc3164Parser>,
        factory::<Rfc5424Parser>,
        factory::<SyslogRfc5424Parser>,
        factory::<CloudTrailParser>,
    ]
}

/// Route a host value to the IP or domain class.
///
/// A strict IP literal parse wins; anything else is a domain name. Every
/// parser goes through here so host indicators compare across formats.
pub fn append_host(indicators: &mut Indicators, host: &str) {
    if host.parse::<IpAddr>().is_ok() {
        indicators.add(IndicatorClass::IpAddress, host);
    } else {
        indicators.add(IndicatorClass::DomainName, host);
    }
}
