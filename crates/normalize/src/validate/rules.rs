//! Built-in rule predicates.
//!
//! Every rule is a pure function of the field value and the optional
//! parameter written after `=` in the rule table (`oneof=aws-s3 aws-sqs`).
//! Absent optional fields never reach these predicates.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use super::value::FieldValue;

pub const REQUIRED: &str = "required";
pub const IP: &str = "ip";
pub const UUID: &str = "uuid";
pub const AWS_ACCOUNT_ID: &str = "awsAccountId";
pub const ARN: &str = "arn";
pub const ONE_OF: &str = "oneof";
pub const MAX: &str = "max";
pub const INTEGRATION_LABEL: &str = "integrationLabel";
pub const KMS_KEY_ARN: &str = "kmsKeyArn";

static RE_UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("regex")
});

static RE_AWS_ACCOUNT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{12}$").expect("regex"));

static RE_KMS_KEY_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^arn:aws:kms:[a-z]{2}(-[a-z]+)+-[0-9]:[0-9]{12}:key/[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("regex")
});

/// Signature shared by all rules
pub type Predicate = fn(&FieldValue<'_>, Option<&str>) -> bool;

/// Split `"oneof=a b"` into `("oneof", Some("a b"))`
pub fn split_rule(spec: &'static str) -> (&'static str, Option<&'static str>) {
    match spec.split_once('=') {
        Some((name, param)) => (name, Some(param)),
        None => (spec, None),
    }
}

/// Rules available in every validator
pub(crate) fn builtin() -> [(&'static str, Predicate); 6] {
    [
        (IP, ip),
        (UUID, uuid),
        (AWS_ACCOUNT_ID, aws_account_id),
        (ARN, arn),
        (ONE_OF, one_of),
        (MAX, max),
    ]
}

pub fn ip(value: &FieldValue<'_>, _param: Option<&str>) -> bool {
    value.as_str().is_some_and(|s| s.parse::<IpAddr>().is_ok())
}

pub fn uuid(value: &FieldValue<'_>, _param: Option<&str>) -> bool {
    value.as_str().is_some_and(|s| RE_UUID.is_match(s))
}

pub fn aws_account_id(value: &FieldValue<'_>, _param: Option<&str>) -> bool {
    value.as_str().is_some_and(|s| RE_AWS_ACCOUNT_ID.is_match(s))
}

/// `arn:partition:service:region:account-id:resource`
pub fn arn(value: &FieldValue<'_>, _param: Option<&str>) -> bool {
    value.as_str().is_some_and(|s| {
        let sections: Vec<&str> = s.splitn(6, ':').collect();
        sections.len() == 6
            && sections[0] == "arn"
            && !sections[1].is_empty()
            && !sections[2].is_empty()
            && !sections[5].is_empty()
    })
}

pub fn one_of(value: &FieldValue<'_>, param: Option<&str>) -> bool {
    let Some(allowed) = param else {
        return false;
    };
    value
        .to_text()
        .is_some_and(|text| allowed.split_whitespace().any(|candidate| candidate == text))
}

/// Upper bound on string length (in chars) or numeric value
pub fn max(value: &FieldValue<'_>, param: Option<&str>) -> bool {
    let Some(limit) = param.and_then(|p| p.trim().parse::<f64>().ok()) else {
        return false;
    };
    match value {
        FieldValue::Str(s) => (s.chars().count() as f64) <= limit,
        FieldValue::Int(v) => (*v as f64) <= limit,
        FieldValue::UInt(v) => (*v as f64) <= limit,
        FieldValue::Float(v) => *v <= limit,
        _ => false,
    }
}

/// Labels must contain something other than whitespace
pub fn integration_label(value: &FieldValue<'_>, _param: Option<&str>) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

/// `arn:aws:kms:<region>:<account-id>:key/<uuid>`
pub fn kms_key_arn(value: &FieldValue<'_>, _param: Option<&str>) -> bool {
    value.as_str().is_some_and(|s| RE_KMS_KEY_ARN.is_match(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> FieldValue<'_> {
        FieldValue::Str(v)
    }

    #[test]
    fn test_split_rule() {
        assert_eq!(split_rule("required"), ("required", None));
        assert_eq!(split_rule("oneof=aws-s3 aws-sqs"), ("oneof", Some("aws-s3 aws-sqs")));
        assert_eq!(split_rule("max=191"), ("max", Some("191")));
    }

    #[test]
    fn test_integration_label() {
        assert!(integration_label(&s("Test12- "), None));
        assert!(integration_label(&s("prod"), None));
        assert!(!integration_label(&s(" "), None));
        assert!(!integration_label(&s(""), None));
        assert!(!integration_label(&s("\t\n"), None));
        assert!(!integration_label(&FieldValue::UInt(3), None));
    }

    #[test]
    fn test_kms_key_arn() {
        assert!(kms_key_arn(
            &s("arn:aws:kms:eu-west-1:415773754570:key/7abf9aaf-0228-4c09-ae6c-c9a0c65e4894"),
            None
        ));
        assert!(kms_key_arn(
            &s("arn:aws:kms:us-gov-west-1:415773754570:key/7ABF9AAF-0228-4C09-AE6C-C9A0C65E4894"),
            None
        ));
        assert!(!kms_key_arn(&s("not-a-key"), None));
        // Aliases are not key ARNs
        assert!(!kms_key_arn(&s("arn:aws:kms:eu-west-1:415773754570:alias/my-key"), None));
        // Account id must be 12 digits
        assert!(!kms_key_arn(
            &s("arn:aws:kms:eu-west-1:4157737545:key/7abf9aaf-0228-4c09-ae6c-c9a0c65e4894"),
            None
        ));
        assert!(!kms_key_arn(
            &s("arn:aws:s3:eu-west-1:415773754570:key/7abf9aaf-0228-4c09-ae6c-c9a0c65e4894"),
            None
        ));
    }

    #[test]
    fn test_ip() {
        assert!(ip(&s("10.0.0.1"), None));
        assert!(ip(&s("2001:db8::1"), None));
        assert!(!ip(&s("host.example.com"), None));
        assert!(!ip(&s("10.0.0.256"), None));
    }

    #[test]
    fn test_uuid_and_account_id() {
        assert!(uuid(&s("cb7663c7-80ed-420b-a287-ed7dc50a0bf7"), None));
        assert!(!uuid(&s("cb7663c780ed420ba287ed7dc50a0bf7"), None));
        assert!(aws_account_id(&s("123456789012"), None));
        assert!(!aws_account_id(&s("12345678901"), None));
        assert!(!aws_account_id(&s("12345678901a"), None));
    }

    #[test]
    fn test_account_id_rejects_non_ascii_digits() {
        // Arabic-Indic digits
        let account = "\u{661}\u{662}\u{663}\u{664}\u{665}\u{666}\u{667}\u{668}\u{669}\u{660}\u{661}\u{662}";
        assert_eq!(account.chars().count(), 12);
        assert!(!aws_account_id(&s(account), None));

        let key = format!("arn:aws:kms:eu-west-1:{account}:key/7abf9aaf-0228-4c09-ae6c-c9a0c65e4894");
        assert!(!kms_key_arn(&s(&key), None));
        assert!(!kms_key_arn(
            &s("arn:aws:kms:eu-west-\u{661}:415773754570:key/7abf9aaf-0228-4c09-ae6c-c9a0c65e4894"),
            None
        ));
    }

    #[test]
    fn test_arn() {
        assert!(arn(&s("arn:aws:iam::123456789012:user/alice"), None));
        assert!(arn(&s("arn:aws:s3:::my-bucket"), None));
        assert!(!arn(&s("arn:aws:iam"), None));
        assert!(!arn(&s("urn:aws:iam::123456789012:user/alice"), None));
    }

    #[test]
    fn test_one_of() {
        assert!(one_of(&s("aws-s3"), Some("aws-scan aws-s3")));
        assert!(!one_of(&s("aws-s4"), Some("aws-scan aws-s3")));
        assert!(one_of(&FieldValue::UInt(60), Some("30 60 180")));
        assert!(!one_of(&s("aws-s3"), None));
    }

    #[test]
    fn test_max() {
        assert!(max(&FieldValue::UInt(191), Some("191")));
        assert!(!max(&FieldValue::UInt(192), Some("191")));
        assert!(max(&s("abc"), Some("3")));
        assert!(!max(&s("abcd"), Some("3")));
        assert!(!max(&s("abc"), Some("three")));
    }
}
