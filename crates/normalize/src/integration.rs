//! Log source integration requests.
//!
//! Onboarding a log source (an AWS account scan or an S3 bucket of logs)
//! goes through the same validation engine as parsed records.

use serde::{Deserialize, Serialize};

use crate::validate::{Fields, Validate};

pub const INTEGRATION_TYPE_AWS_SCAN: &str = "aws-scan";
pub const INTEGRATION_TYPE_AWS_S3: &str = "aws-s3";

const INTEGRATION_TYPES: &str = "oneof=aws-scan aws-s3";
const SCAN_INTERVALS: &str = "oneof=30 60 180 360 720 1440";

/// Request for the CloudFormation template that onboards a source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIntegrationTemplateInput {
    #[serde(rename = "awsAccountId", default)]
    pub aws_account_id: Option<String>,
    #[serde(default)]
    pub integration_type: Option<String>,
    #[serde(default)]
    pub integration_label: Option<String>,
    #[serde(default)]
    pub remediation_enabled: Option<bool>,
    #[serde(default)]
    pub cwe_enabled: Option<bool>,
    #[serde(default)]
    pub s3_bucket: Option<String>,
    #[serde(default)]
    pub s3_prefix: Option<String>,
    #[serde(default)]
    pub kms_key: Option<String>,
}

impl Validate for GetIntegrationTemplateInput {
    fn type_name(&self) -> &'static str {
        "GetIntegrationTemplateInput"
    }

    fn visit_fields(&self, fields: &mut Fields<'_>) {
        fields.field("AWSAccountID", &self.aws_account_id, &["required", "awsAccountId"]);
        fields.field("IntegrationType", &self.integration_type, &["required", INTEGRATION_TYPES]);
        fields.field("IntegrationLabel", &self.integration_label, &["required", "integrationLabel"]);
        fields.field("S3Bucket", &self.s3_bucket, &["max=63"]);
        fields.field("KmsKey", &self.kms_key, &["kmsKeyArn"]);
    }
}

/// Settings shared by create and update requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutIntegrationSettings {
    #[serde(rename = "awsAccountId", default)]
    pub aws_account_id: Option<String>,
    #[serde(default)]
    pub integration_label: Option<String>,
    #[serde(default)]
    pub integration_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub cwe_enabled: Option<bool>,
    #[serde(default)]
    pub remediation_enabled: Option<bool>,
    #[serde(default)]
    pub scan_interval_mins: Option<u32>,
    #[serde(default)]
    pub s3_bucket: Option<String>,
    #[serde(default)]
    pub s3_prefix: Option<String>,
    #[serde(default)]
    pub kms_key: Option<String>,
    #[serde(default)]
    pub log_types: Vec<String>,
}

impl Validate for PutIntegrationSettings {
    fn type_name(&self) -> &'static str {
        "PutIntegrationSettings"
    }

    fn visit_fields(&self, fields: &mut Fields<'_>) {
        fields.field("AWSAccountID", &self.aws_account_id, &["required", "awsAccountId"]);
        fields.field("IntegrationLabel", &self.integration_label, &["required", "integrationLabel"]);
        fields.field("IntegrationType", &self.integration_type, &["required", INTEGRATION_TYPES]);
        fields.field("UserID", &self.user_id, &["required", "uuid"]);
        fields.field("ScanIntervalMins", &self.scan_interval_mins, &[SCAN_INTERVALS]);
        fields.field("S3Bucket", &self.s3_bucket, &["max=63"]);
        fields.field("KmsKey", &self.kms_key, &["kmsKeyArn"]);
    }
}

/// Create a new integration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutIntegrationInput {
    #[serde(flatten)]
    pub settings: PutIntegrationSettings,
}

impl Validate for PutIntegrationInput {
    fn type_name(&self) -> &'static str {
        "PutIntegrationInput"
    }

    fn visit_fields(&self, fields: &mut Fields<'_>) {
        fields.nested("PutIntegrationSettings", &self.settings);
    }
}
