//! Warning channel for records skipped by a transformation.
//!
//! Partial failures (an unparsable date of birth, a company id with no
//! matching company) never abort a batch. Each one produces a [`Diagnostic`]
//! that is handed to the [`DiagnosticSink`] the caller passed in.

use crate::record::Record;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// `date_of_birth` did not match `YYYY/MM/DD`.
    MalformedDateOfBirth,
    /// `company_id` did not resolve to any company.
    UnknownCompany,
}

/// A single "record skipped" notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Identity of the affected record (`forename surname`)
    pub record: String,
    pub message: String,
}

impl Diagnostic {
    pub fn malformed_date_of_birth(user: &Record) -> Self {
        let record = user.label();
        Self {
            kind: DiagnosticKind::MalformedDateOfBirth,
            message: format!("User {} has incorrect date of birth format.", record),
            record,
        }
    }

    pub fn unknown_company(user: &Record, company_id: &Value) -> Self {
        let record = user.label();
        Self {
            kind: DiagnosticKind::UnknownCompany,
            message: format!("User {} has unrecognized company id: {}.", record, company_id),
            record,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Receiver for diagnostics emitted during one operation.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Closures can be used directly as sinks
impl<F> DiagnosticSink for F
where
    F: FnMut(Diagnostic),
{
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Sink that keeps every diagnostic in arrival order.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of collected diagnostics of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Sink that logs each diagnostic as a `tracing` warning and counts them.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    reported: usize,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reported(&self) -> usize {
        self.reported
    }
}

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.reported += 1;
        tracing::warn!(
            kind = ?diagnostic.kind,
            record = %diagnostic.record,
            "{}",
            diagnostic.message
        );
    }
}
