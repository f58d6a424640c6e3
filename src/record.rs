//! Open key/value records shared by every transformation.
//!
//! A [`Record`] is one flat JSON object (a user or a company). Records keep
//! their key insertion order so that saved output mirrors the input layout,
//! with derived fields appended at the end.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Well-known field names read or written by the transformations.
pub mod fields {
    pub const FORENAME: &str = "forename";
    pub const SURNAME: &str = "surname";
    pub const FULL_NAME: &str = "full_name";
    pub const DATE_OF_BIRTH: &str = "date_of_birth";
    pub const COMPANY_ID: &str = "company_id";
    pub const COMPANY: &str = "company";
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
}

/// Error type for record field access
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    /// A field required by the operation is absent.
    MissingField {
        field: String,
        record: String,
    },
    /// A field is present but holds the wrong JSON type.
    InvalidFieldValue {
        field: String,
        expected: &'static str,
        record: String,
    },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::MissingField { field, record } => {
                write!(f, "Required field '{}' is missing from record {}", field, record)
            }
            RecordError::InvalidFieldValue { field, expected, record } => {
                write!(
                    f,
                    "Field '{}' of record {} is not a valid {}",
                    field, record, expected
                )
            }
        }
    }
}

impl std::error::Error for RecordError {}

/// A flat mapping of string keys to JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(map.into_iter().collect()),
            _ => None,
        }
    }

    /// Convert the record back into a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields.into_iter().collect())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Insert or replace a field. A replaced field keeps its position.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    /// Remove a field, preserving the order of the remaining ones.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// Return a copy of this record with one field added (or replaced).
    pub fn with_field(&self, field: impl Into<String>, value: Value) -> Self {
        let mut copy = self.clone();
        copy.insert(field, value);
        copy
    }

    /// Return a copy of this record without `field`.
    pub fn without_field(&self, field: &str) -> Self {
        let mut copy = self.clone();
        copy.remove(field);
        copy
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Get a field the caller's contract requires.
    pub fn require(&self, field: &str) -> Result<&Value, RecordError> {
        self.fields.get(field).ok_or_else(|| RecordError::MissingField {
            field: field.to_string(),
            record: self.label(),
        })
    }

    /// Get a required string field.
    pub fn require_str(&self, field: &str) -> Result<&str, RecordError> {
        self.require(field)?
            .as_str()
            .ok_or_else(|| self.invalid(field, "string"))
    }

    /// Get a required integer field. Integral floats such as `3.0` count.
    pub fn require_i64(&self, field: &str) -> Result<i64, RecordError> {
        as_integer(self.require(field)?).ok_or_else(|| self.invalid(field, "integer"))
    }

    /// Human-readable identity used in diagnostics and error messages.
    ///
    /// Users are identified by `forename surname`. Records without those
    /// (companies) fall back to `name`, then to `#id`.
    pub fn label(&self) -> String {
        let text = |field: &str| self.get(field).and_then(Value::as_str);

        match (text(fields::FORENAME), text(fields::SURNAME)) {
            (Some(forename), Some(surname)) => format!("{} {}", forename, surname),
            (Some(forename), None) => forename.to_string(),
            (None, Some(surname)) => surname.to_string(),
            (None, None) => match (text(fields::NAME), self.get(fields::ID)) {
                (Some(name), _) => name.to_string(),
                (None, Some(id)) => format!("#{}", id),
                (None, None) => "<unnamed record>".to_string(),
            },
        }
    }

    fn invalid(&self, field: &str, expected: &'static str) -> RecordError {
        RecordError::InvalidFieldValue {
            field: field.to_string(),
            expected,
            record: self.label(),
        }
    }
}

/// Read a JSON number as an integer, accepting floats with no fractional part.
pub fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl From<IndexMap<String, Value>> for Record {
    fn from(fields: IndexMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}
