use chrono::{DateTime, Utc};

/// A field value as seen by rule predicates.
///
/// Optional fields map `None` to [`FieldValue::Absent`], so presence is
/// something rules can inspect directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Absent,
    Str(&'a str),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Time(&'a DateTime<Utc>),
    /// Present value with no scalar form (nested struct, list)
    Present,
}

impl FieldValue<'_> {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Absent or the empty string; what `required` rejects
    pub fn is_zero(&self) -> bool {
        matches!(self, FieldValue::Absent | FieldValue::Str(""))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Textual form used by enumeration rules
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Str(s) => Some((*s).to_string()),
            FieldValue::Int(v) => Some(v.to_string()),
            FieldValue::UInt(v) => Some(v.to_string()),
            FieldValue::Bool(v) => Some(v.to_string()),
            FieldValue::Float(_) | FieldValue::Time(_) | FieldValue::Present | FieldValue::Absent => None,
        }
    }
}

pub trait AsFieldValue {
    fn as_field_value(&self) -> FieldValue<'_>;
}

impl AsFieldValue for str {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl AsFieldValue for String {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl AsFieldValue for bool {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

impl AsFieldValue for f64 {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Float(*self)
    }
}

impl AsFieldValue for DateTime<Utc> {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Time(self)
    }
}

impl<T: AsFieldValue> AsFieldValue for Option<T> {
    fn as_field_value(&self) -> FieldValue<'_> {
        match self {
            Some(value) => value.as_field_value(),
            None => FieldValue::Absent,
        }
    }
}

impl<T> AsFieldValue for Vec<T> {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Present
    }
}

macro_rules! unsigned_field_value {
    ($($t:ty),*) => {
        $(impl AsFieldValue for $t {
            fn as_field_value(&self) -> FieldValue<'_> {
                FieldValue::UInt(u64::from(*self))
            }
        })*
    };
}

macro_rules! signed_field_value {
    ($($t:ty),*) => {
        $(impl AsFieldValue for $t {
            fn as_field_value(&self) -> FieldValue<'_> {
                FieldValue::Int(i64::from(*self))
            }
        })*
    };
}

unsigned_field_value!(u8, u16, u32, u64);
signed_field_value!(i8, i16, i32, i64);
