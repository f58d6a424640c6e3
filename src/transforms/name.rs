//! Full-name derivation.

use crate::record::{fields, Record, RecordError};
use serde_json::Value;

/// Adds a `full_name` field built from `forename` and `surname`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameEnricher;

impl NameEnricher {
    pub fn new() -> Self {
        Self
    }

    /// The display name of one user: `"{forename} {surname}"`.
    pub fn full_name(user: &Record) -> Result<String, RecordError> {
        let forename = user.require_str(fields::FORENAME)?;
        let surname = user.require_str(fields::SURNAME)?;
        Ok(format!("{} {}", forename, surname))
    }

    /// Return every user with `full_name` added, in input order.
    ///
    /// # Errors
    /// `MissingField` if a record has no `forename` or `surname`.
    pub fn enrich(&self, users: &[Record]) -> Result<Vec<Record>, RecordError> {
        users
            .iter()
            .map(|user| {
                let full_name = Self::full_name(user)?;
                Ok(user.with_field(fields::FULL_NAME, Value::String(full_name)))
            })
            .collect()
    }
}
