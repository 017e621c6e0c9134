//! AWS CloudTrail log files.
//!
//! One raw record is a whole delivered file (`{"Records":[...]}`), so a
//! single parse yields one event per record. Records are converted one at a
//! time, so a record that fails to deserialize or validate is dropped on its
//! own and the rest of the file still parses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::event::{CoreRecord, Event};
use crate::formats::append_host;
use crate::indicator::{IndicatorClass, Indicators};
use crate::timestamp;
use crate::traits::{LogParser, ParseError};
use crate::validate::{self, Fields, Validate};

pub const LOG_TYPE: &str = "AWS.CloudTrail";

/// Size limit for one delivered file; files bundle many records
pub const MAX_FILE_SIZE: usize = 128 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct CloudTrailRecords {
    #[serde(rename = "Records")]
    records: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudTrail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_version: Option<String>,
    #[serde(
        default,
        deserialize_with = "timestamp::rfc3339::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(rename = "eventID", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    /// An IP address, or the service name when AWS acts on the caller's behalf
    #[serde(rename = "sourceIPAddress", default, skip_serializing_if = "Option::is_none")]
    pub source_ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(rename = "requestID", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_identity: Option<UserIdentity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_elements: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub identity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoked_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "ARN", default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(rename = "accountId", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

impl Validate for CloudTrail {
    fn type_name(&self) -> &'static str {
        "CloudTrail"
    }

    fn visit_fields(&self, fields: &mut Fields<'_>) {
        fields.field("EventVersion", &self.event_version, &["required"]);
        fields.field("EventTime", &self.event_time, &["required"]);
        fields.field("EventSource", &self.event_source, &["required"]);
        fields.field("EventName", &self.event_name, &["required"]);
        fields.field("AWSRegion", &self.aws_region, &["required"]);
        fields.field("RecipientAccountID", &self.recipient_account_id, &["awsAccountId"]);
        fields.nested_opt("UserIdentity", &self.user_identity, &["required"]);
        fields.each("Resources", &self.resources);
    }
}

impl Validate for UserIdentity {
    fn type_name(&self) -> &'static str {
        "UserIdentity"
    }

    fn visit_fields(&self, fields: &mut Fields<'_>) {
        fields.field("Type", &self.identity_type, &["required"]);
        fields.field("ARN", &self.arn, &["arn"]);
        fields.field("AccountID", &self.account_id, &["awsAccountId"]);
    }
}

impl Validate for Resource {
    fn type_name(&self) -> &'static str {
        "Resource"
    }

    fn visit_fields(&self, fields: &mut Fields<'_>) {
        fields.field("ARN", &self.arn, &["arn"]);
        fields.field("AccountID", &self.account_id, &["awsAccountId"]);
    }
}

impl CloudTrail {
    fn indicators(&self) -> Indicators {
        let mut indicators = Indicators::new();
        if let Some(source) = &self.source_ip_address {
            append_host(&mut indicators, source);
        }
        if let Some(account) = &self.recipient_account_id {
            indicators.add(IndicatorClass::AwsAccountId, account);
        }
        if let Some(identity) = &self.user_identity {
            if let Some(arn) = &identity.arn {
                indicators.add(IndicatorClass::AwsArn, arn);
            }
            if let Some(account) = &identity.account_id {
                indicators.add(IndicatorClass::AwsAccountId, account);
            }
        }
        for resource in &self.resources {
            if let Some(arn) = &resource.arn {
                indicators.add(IndicatorClass::AwsArn, arn);
                // arn:aws:ec2:<region>:<account>:instance/<id>
                if let Some((_, instance_id)) = arn.split_once(":instance/") {
                    indicators.add(IndicatorClass::AwsInstanceId, instance_id);
                }
            }
            if let Some(account) = &resource.account_id {
                indicators.add(IndicatorClass::AwsAccountId, account);
            }
        }
        for payload in [&self.request_parameters, &self.response_elements].into_iter().flatten() {
            append_instance_ids(&mut indicators, payload);
        }
        indicators
    }
}

/// Collect every `instanceId` string found anywhere in an API payload
fn append_instance_ids(indicators: &mut Indicators, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                match inner {
                    Value::String(id) if key == "instanceId" => {
                        indicators.add(IndicatorClass::AwsInstanceId, id);
                    }
                    _ => append_instance_ids(indicators, inner),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                append_instance_ids(indicators, item);
            }
        }
        _ => {}
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CloudTrailParser;

impl LogParser for CloudTrailParser {
    fn log_type(&self) -> &'static str {
        LOG_TYPE
    }

    fn parse_events(&self, raw: &str) -> Result<Vec<Event>, ParseError> {
        let file: CloudTrailRecords = serde_json::from_str(raw)?;

        let mut events = Vec::with_capacity(file.records.len());
        for (index, value) in file.records.into_iter().enumerate() {
            match Self::parse_record(value) {
                Ok(event) => events.push(event),
                Err(err) => {
                    debug!(log_type = self.log_type(), record = index, error = %err, "dropping cloudtrail record");
                }
            }
        }
        Ok(events)
    }

    fn max_size(&self) -> usize {
        MAX_FILE_SIZE
    }
}

impl CloudTrailParser {
    fn parse_record(value: Value) -> Result<Event, ParseError> {
        let record: CloudTrail = serde_json::from_value(value)?;
        let core = CoreRecord::finalize(LOG_TYPE, record.event_time, record.indicators());
        validate::global().validate(&record)?;
        Ok(Event::new(core, record))
    }
}
