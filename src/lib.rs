//! # Roster: user/company record joins
//!
//! Roster joins two small JSON datasets, users and companies, in memory. It
//! provides three composable transformations over open key/value records:
//!
//! - **Name enrichment**: derive `full_name` from `forename` and `surname`
//! - **Age filtering**: compute each user's age from `date_of_birth`
//!   (`YYYY/MM/DD`) and keep those matching a [`Condition`]
//! - **Company association**: replace `company_id` with the full company record
//!
//! Per-record problems (a malformed date, an unknown company id) never abort a
//! batch. They are reported through a [`DiagnosticSink`] passed into each call
//! and the affected record is left out. Structural problems, such as a missing
//! required field, are returned as errors.
//!
//! ## Example
//!
//! ```
//! use roster::{CompanyAssociator, DiagnosticCollector, Record};
//! use serde_json::json;
//!
//! let users = vec![Record::from_value(json!({
//!     "forename": "Bob",
//!     "surname": "Smith",
//!     "date_of_birth": "2000/12/30",
//!     "company_id": 3
//! })).unwrap()];
//! let companies = vec![Record::from_value(json!({
//!     "id": 3,
//!     "name": "Solomon Sisters Bank"
//! })).unwrap()];
//!
//! let mut warnings = DiagnosticCollector::new();
//! let joined = CompanyAssociator::new().associate(&users, &companies, &mut warnings)?;
//!
//! assert_eq!(joined[0].get("company"), Some(&json!({"id": 3, "name": "Solomon Sisters Bank"})));
//! assert!(!joined[0].contains("company_id"));
//! # Ok::<(), roster::RecordError>(())
//! ```

// Core modules
pub mod condition;
pub mod diagnostics;
pub mod record;
pub mod transforms;

// Input/output and orchestration
pub mod config;
pub mod pipeline;
pub mod serialization;

// Re-export key types
pub use condition::Condition;
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind, DiagnosticSink, TracingSink};
pub use record::{fields, Record, RecordError};
pub use transforms::{
    age_on, check_condition, parse_date_of_birth, AgeFilter, CompanyAssociator, CompanyIndex,
    NameEnricher, UnmatchedPolicy,
};

pub use config::{ConfigError, PipelineConfig, Step};
pub use pipeline::{Pipeline, PipelineError, PipelineOutput, PipelineReport, StepSummary};
pub use serialization::{
    load_records, read_records, save_records, write_records, OutputFormat, SerializationError,
};
