use std::fmt;

use thiserror::Error;

/// One violated rule on one field.
///
/// `key` is the dotted path starting with the record's type name, e.g.
/// `PutIntegrationInput.PutIntegrationSettings.KmsKey`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Key: '{key}' Error:Field validation for '{field}' failed on the '{rule}' tag")]
pub struct FieldError {
    pub key: String,
    pub field: String,
    pub rule: &'static str,
}

impl FieldError {
    /// Path below the type name (`PutIntegrationSettings.KmsKey`)
    pub fn path(&self) -> &str {
        self.key.split_once('.').map_or(self.key.as_str(), |(_, rest)| rest)
    }
}

/// Every field error found in one record, in visit order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Errors reported for the given path (below the type name)
    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.0.iter().filter(move |e| e.path() == path)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
