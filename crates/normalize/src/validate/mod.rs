//! Validation engine.
//!
//! Record types declare their constraints in an explicit rule table by
//! implementing [`Validate`]: each field is visited with its ordered list of
//! rule names, and nested structs are visited with their own name as a path
//! prefix. The [`Validator`] resolves rule names against its registry of
//! predicates and collects every failing field.
//!
//! Per field, `required` is evaluated first; when it fails no other rule runs
//! for that field. Absent optional fields pass every other rule. Of the
//! remaining rules only the first failure is reported.

mod error;
pub mod rules;
mod value;

use std::collections::HashMap;
use std::sync::LazyLock;

pub use error::{FieldError, ValidationErrors};
pub use rules::Predicate;
pub use value::{AsFieldValue, FieldValue};

static VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    Validator::builder()
        .rule(rules::INTEGRATION_LABEL, rules::integration_label)
        .rule(rules::KMS_KEY_ARN, rules::kms_key_arn)
        .build()
});

/// The process-wide validator shared by every parser.
///
/// Built on first use and never mutated afterwards.
pub fn global() -> &'static Validator {
    &VALIDATOR
}

/// A type whose fields carry declared constraints.
pub trait Validate {
    /// First segment of every error key for this type
    fn type_name(&self) -> &'static str;

    /// Visit every constrained field in declaration order
    fn visit_fields(&self, fields: &mut Fields<'_>);
}

#[derive(Debug, Clone)]
pub struct Validator {
    rules: HashMap<&'static str, Predicate>,
}

pub struct ValidatorBuilder {
    rules: HashMap<&'static str, Predicate>,
}

impl ValidatorBuilder {
    /// Register (or replace) a named rule
    pub fn rule(mut self, name: &'static str, predicate: Predicate) -> Self {
        self.rules.insert(name, predicate);
        self
    }

    pub fn build(self) -> Validator {
        Validator { rules: self.rules }
    }
}

impl Validator {
    /// Builder pre-loaded with the built-in rules
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder {
            rules: rules::builtin().into_iter().collect(),
        }
    }

    pub fn has_rule(&self, name: &str) -> bool {
        name == rules::REQUIRED || self.rules.contains_key(name)
    }

    /// Check every declared constraint on `record`.
    pub fn validate<T: Validate + ?Sized>(&self, record: &T) -> Result<(), ValidationErrors> {
        let mut fields = Fields {
            validator: self,
            path: record.type_name().to_string(),
            errors: Vec::new(),
        };
        record.visit_fields(&mut fields);

        if fields.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors::new(fields.errors))
        }
    }

    /// Name of the rule the value violates, if any
    fn first_failure(&self, value: &FieldValue<'_>, rule_specs: &[&'static str]) -> Option<&'static str> {
        let required = rule_specs
            .iter()
            .any(|&spec| rules::split_rule(spec).0 == rules::REQUIRED);
        if required && value.is_zero() {
            return Some(rules::REQUIRED);
        }
        if value.is_absent() {
            return None;
        }

        for &spec in rule_specs {
            let (name, param) = rules::split_rule(spec);
            if name == rules::REQUIRED {
                continue;
            }
            match self.rules.get(name) {
                Some(predicate) => {
                    if !predicate(value, param) {
                        return Some(name);
                    }
                }
                None => {
                    tracing::warn!(rule = name, "undefined validation rule");
                    return Some(name);
                }
            }
        }
        None
    }
}

/// Field walker handed to [`Validate::visit_fields`].
///
/// Tracks the dotted path of the struct currently being visited.
pub struct Fields<'v> {
    validator: &'v Validator,
    path: String,
    errors: Vec<FieldError>,
}

impl Fields<'_> {
    /// Check a scalar (or optional scalar) field against `rules`
    pub fn field<V>(&mut self, name: &str, value: &V, rule_specs: &[&'static str])
    where
        V: AsFieldValue + ?Sized,
    {
        let value = value.as_field_value();
        if let Some(rule) = self.validator.first_failure(&value, rule_specs) {
            self.push_error(name, rule);
        }
    }

    /// Walk an embedded struct
    pub fn nested<T>(&mut self, name: &str, value: &T)
    where
        T: Validate + ?Sized,
    {
        let len = self.path.len();
        self.path.push('.');
        self.path.push_str(name);
        value.visit_fields(self);
        self.path.truncate(len);
    }

    /// Walk an optional nested struct; `required` is honoured, other
    /// rules do not apply to struct values.
    pub fn nested_opt<T>(&mut self, name: &str, value: &Option<T>, rule_specs: &[&'static str])
    where
        T: Validate,
    {
        match value {
            Some(inner) => self.nested(name, inner),
            None => {
                if rule_specs.contains(&rules::REQUIRED) {
                    self.push_error(name, rules::REQUIRED);
                }
            }
        }
    }

    /// Walk every element of a list of structs as `name[i]`
    pub fn each<T>(&mut self, name: &str, items: &[T])
    where
        T: Validate,
    {
        for (i, item) in items.iter().enumerate() {
            self.nested(&format!("{}[{}]", name, i), item);
        }
    }

    fn push_error(&mut self, name: &str, rule: &'static str) {
        self.errors.push(FieldError {
            key: format!("{}.{}", self.path, name),
            field: name.to_string(),
            rule,
        });
    }
}
