//! Indicator accumulator.
//!
//! Each event carries a set of values per indicator class. Sets only grow
//! while the record is being built and duplicate insertions are no-ops.
//! Deciding which class a raw value belongs to is left to the parser.

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorClass {
    IpAddress,
    DomainName,
    AwsArn,
    AwsAccountId,
    AwsInstanceId,
}

impl IndicatorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorClass::IpAddress => "ip_address",
            IndicatorClass::DomainName => "domain_name",
            IndicatorClass::AwsArn => "aws_arn",
            IndicatorClass::AwsAccountId => "aws_account_id",
            IndicatorClass::AwsInstanceId => "aws_instance_id",
        }
    }

    /// Column name the class is emitted under in a serialized event
    pub fn field_name(&self) -> &'static str {
        match self {
            IndicatorClass::IpAddress => "p_any_ip_addresses",
            IndicatorClass::DomainName => "p_any_domain_names",
            IndicatorClass::AwsArn => "p_any_aws_arns",
            IndicatorClass::AwsAccountId => "p_any_aws_account_ids",
            IndicatorClass::AwsInstanceId => "p_any_aws_instance_ids",
        }
    }
}

/// Per-event indicator sets, keyed by class.
///
/// Owned by exactly one in-flight record, so it needs no synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indicators {
    sets: BTreeMap<IndicatorClass, BTreeSet<String>>,
}

impl Indicators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` into the set for `class`.
    ///
    /// Blank values are ignored. Returns `true` when the value was not
    /// already present.
    pub fn add(&mut self, class: IndicatorClass, value: impl AsRef<str>) -> bool {
        let value = value.as_ref();
        if value.trim().is_empty() {
            return false;
        }
        let set = self.sets.entry(class).or_default();
        if set.contains(value) {
            return false;
        }
        set.insert(value.to_string())
    }

    pub fn extend<I, S>(&mut self, class: IndicatorClass, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            self.add(class, value);
        }
    }

    pub fn get(&self, class: IndicatorClass) -> Option<&BTreeSet<String>> {
        self.sets.get(&class)
    }

    pub fn contains(&self, class: IndicatorClass, value: &str) -> bool {
        self.sets.get(&class).is_some_and(|set| set.contains(value))
    }

    /// Number of values recorded for `class`
    pub fn count(&self, class: IndicatorClass) -> usize {
        self.sets.get(&class).map_or(0, BTreeSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.values().all(BTreeSet::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndicatorClass, &BTreeSet<String>)> {
        self.sets.iter().map(|(class, set)| (*class, set))
    }
}

impl Serialize for Indicators {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let non_empty: Vec<_> = self.iter().filter(|(_, set)| !set.is_empty()).collect();
        let mut map = serializer.serialize_map(Some(non_empty.len()))?;
        for (class, set) in non_empty {
            map.serialize_entry(class.field_name(), set)?;
        }
        map.end()
    }
}
