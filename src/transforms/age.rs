//! Age computation and age-based filtering.

use crate::condition::Condition;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::record::{fields, Record, RecordError};
use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Expected layout of `date_of_birth` values, e.g. `2000/12/30`.
pub const DATE_OF_BIRTH_FORMAT: &str = "%Y/%m/%d";

/// Four-digit year, then one- or two-digit month and day. chrono alone also
/// accepts signs, padding spaces and year zero.
static DATE_OF_BIRTH_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}/[0-9]{1,2}/[0-9]{1,2}$").expect("valid date pattern"));

/// Parse a `date_of_birth` value, returning `None` when it is malformed.
pub fn parse_date_of_birth(raw: &str) -> Option<NaiveDate> {
    if !DATE_OF_BIRTH_SHAPE.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_OF_BIRTH_FORMAT)
        .ok()
        .filter(|date| date.year() >= 1)
}

/// Whole years between `birth` and `today`, minus one if this year's
/// birthday has not happened yet.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i64 {
    let birthday_pending = (today.month(), today.day()) < (birth.month(), birth.day());
    i64::from(today.year() - birth.year()) - i64::from(birthday_pending)
}

/// Evaluate a condition given by label. Unknown labels never match.
///
/// # Example
/// ```
/// use roster::check_condition;
///
/// assert!(check_condition("Greater than or equal to", 12, 12));
/// assert!(!check_condition("Less than", 35, 20));
/// assert!(!check_condition("Roughly", 20, 20));
/// ```
pub fn check_condition(condition: &str, result_age: i64, condition_age: i64) -> bool {
    Condition::from_label(condition).is_some_and(|c| c.evaluate(result_age, condition_age))
}

/// Keeps the users whose age satisfies a condition.
///
/// Ages are computed against the local current date unless a fixed
/// reference date is supplied with [`AgeFilter::as_of`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AgeFilter {
    as_of: Option<NaiveDate>,
}

impl AgeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter relative to a fixed date instead of today.
    pub fn as_of(date: NaiveDate) -> Self {
        Self { as_of: Some(date) }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Filter by a condition label such as `"Less than"`.
    ///
    /// An unrecognized label matches nothing. Records with a malformed
    /// `date_of_birth` are reported to `sink` and skipped either way.
    ///
    /// # Errors
    /// `MissingField` when a record has no `date_of_birth`,
    /// `InvalidFieldValue` when it is not a string.
    pub fn filter(
        &self,
        users: &[Record],
        threshold_age: i64,
        condition: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Vec<Record>, RecordError> {
        let resolved = Condition::from_label(condition);
        if resolved.is_none() {
            tracing::warn!(condition, "Unrecognized condition, no users will match");
        }
        self.select(users, threshold_age, resolved, sink)
    }

    /// Filter by an already-resolved [`Condition`].
    pub fn filter_by(
        &self,
        users: &[Record],
        threshold_age: i64,
        condition: Condition,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Vec<Record>, RecordError> {
        self.select(users, threshold_age, Some(condition), sink)
    }

    fn select(
        &self,
        users: &[Record],
        threshold_age: i64,
        condition: Option<Condition>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Vec<Record>, RecordError> {
        let today = self.reference_date();
        let mut kept = Vec::new();

        for user in users {
            let raw = user.require_str(fields::DATE_OF_BIRTH)?;
            let Some(birth) = parse_date_of_birth(raw) else {
                sink.report(Diagnostic::malformed_date_of_birth(user));
                continue;
            };

            let age = age_on(birth, today);
            if condition.is_some_and(|c| c.evaluate(age, threshold_age)) {
                kept.push(user.clone());
            }
        }

        tracing::debug!(
            input = users.len(),
            kept = kept.len(),
            threshold_age,
            "Filtered users by age"
        );
        Ok(kept)
    }
}
