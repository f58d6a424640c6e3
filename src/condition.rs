//! Comparison operators used to filter users by age.

use std::fmt;
use std::str::FromStr;

/// One of the six named comparisons between a computed age and a threshold.
///
/// Conditions are identified by stable labels such as `"Less than"`; those
/// labels are what configuration files and the CLI accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    Equal,
    NotEqual,
}

impl Condition {
    pub const ALL: [Condition; 6] = [
        Condition::LessThan,
        Condition::GreaterThan,
        Condition::LessOrEqual,
        Condition::GreaterOrEqual,
        Condition::Equal,
        Condition::NotEqual,
    ];

    /// The stable label this condition is selected by.
    pub fn label(self) -> &'static str {
        match self {
            Condition::LessThan => "Less than",
            Condition::GreaterThan => "Greater than",
            Condition::LessOrEqual => "Less than or equal to",
            Condition::GreaterOrEqual => "Greater than or equal to",
            Condition::Equal => "Is equal to",
            Condition::NotEqual => "Is not equal to",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Condition::LessThan => "<",
            Condition::GreaterThan => ">",
            Condition::LessOrEqual => "<=",
            Condition::GreaterOrEqual => ">=",
            Condition::Equal => "==",
            Condition::NotEqual => "!=",
        }
    }

    /// Look a condition up by its exact label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Compare `result_age` against `threshold` (`result_age <op> threshold`).
    pub fn evaluate(self, result_age: i64, threshold: i64) -> bool {
        match self {
            Condition::LessThan => result_age < threshold,
            Condition::GreaterThan => result_age > threshold,
            Condition::LessOrEqual => result_age <= threshold,
            Condition::GreaterOrEqual => result_age >= threshold,
            Condition::Equal => result_age == threshold,
            Condition::NotEqual => result_age != threshold,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|c| c.label()).collect();
            format!("Unknown condition '{}'. Expected one of: {}", s, known.join(", "))
        })
    }
}
