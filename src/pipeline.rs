//! Runs a configured sequence of transformations.
//!
//! Coordinates a pipeline run using:
//! - Pipeline configuration (inputs, output, ordered steps)
//! - The transformations in [`crate::transforms`]
//! - A per-step [`DiagnosticCollector`] whose contents are forwarded to the
//!   caller's sink as each step finishes, and kept in the report

use crate::config::{ConfigError, PipelineConfig, Step};
use crate::diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticSink};
use crate::record::{Record, RecordError};
use crate::serialization::{load_records, save_records, SerializationError};
use crate::transforms::{AgeFilter, CompanyAssociator, NameEnricher};
use serde::Serialize;
use std::fmt;

/// Error type for pipeline runs
#[derive(Debug)]
pub enum PipelineError {
    /// A step hit a structural problem in a record.
    Step {
        step: &'static str,
        source: RecordError,
    },
    Serialization(SerializationError),
    Config(ConfigError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Step { step, source } => write!(f, "Step '{}' failed: {}", step, source),
            PipelineError::Serialization(e) => write!(f, "{}", e),
            PipelineError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<SerializationError> for PipelineError {
    fn from(err: SerializationError) -> Self {
        PipelineError::Serialization(err)
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err)
    }
}

/// Record counts for one executed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSummary {
    pub step: &'static str,
    pub input: usize,
    pub output: usize,
    pub warnings: usize,
}

/// What happened during a pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub input_count: usize,
    pub output_count: usize,
    pub steps: Vec<StepSummary>,
    /// Every diagnostic, in the order the steps emitted them
    pub diagnostics: Vec<Diagnostic>,
}

impl PipelineReport {
    pub fn warning_count(&self) -> usize {
        self.diagnostics.len()
    }
}

/// Result records of a run plus its report.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<Record>,
    pub report: PipelineReport,
}

/// Ordered list of steps applied to a user collection.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<Step>,
    age_filter: AgeFilter,
}

impl Pipeline {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            age_filter: AgeFilter::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.steps.clone())
    }

    /// Use a specific [`AgeFilter`], e.g. one pinned to a reference date.
    pub fn with_age_filter(mut self, age_filter: AgeFilter) -> Self {
        self.age_filter = age_filter;
        self
    }

    /// Apply every step in order to `users`.
    ///
    /// `companies` is only read by `associate_companies` steps. Each step's
    /// diagnostics reach `sink` when that step ends, before any error it
    /// returns is propagated.
    pub fn run(
        &self,
        users: &[Record],
        companies: &[Record],
        sink: &mut dyn DiagnosticSink,
    ) -> Result<PipelineOutput, PipelineError> {
        let mut records = users.to_vec();
        let mut report = PipelineReport {
            input_count: users.len(),
            ..PipelineReport::default()
        };

        for step in &self.steps {
            let mut collector = DiagnosticCollector::new();
            let input = records.len();

            let result = match step {
                Step::EnrichNames => NameEnricher::new().enrich(&records),
                Step::FilterByAge {
                    threshold_age,
                    condition,
                } => self
                    .age_filter
                    .filter(&records, *threshold_age, condition, &mut collector),
                Step::AssociateCompanies { unmatched } => {
                    CompanyAssociator::with_unmatched_policy(*unmatched)
                        .associate(&records, companies, &mut collector)
                }
            };

            let diagnostics = collector.into_inner();
            for diagnostic in &diagnostics {
                sink.report(diagnostic.clone());
            }
            let next = result.map_err(|source| PipelineError::Step {
                step: step.name(),
                source,
            })?;

            let summary = StepSummary {
                step: step.name(),
                input,
                output: next.len(),
                warnings: diagnostics.len(),
            };
            tracing::info!(
                step = summary.step,
                input = summary.input,
                output = summary.output,
                warnings = summary.warnings,
                "Step complete"
            );

            report.steps.push(summary);
            report.diagnostics.extend(diagnostics);
            records = next;
        }

        report.output_count = records.len();
        Ok(PipelineOutput { records, report })
    }

    /// Load the configured inputs, run, and save the result.
    pub fn execute(
        &self,
        config: &PipelineConfig,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<PipelineReport, PipelineError> {
        let users = load_records(&config.users)?;
        let companies = match &config.companies {
            Some(path) => load_records(path)?,
            None => Vec::new(),
        };

        let output = self.run(&users, &companies, sink)?;
        save_records(&config.output, &output.records, config.format)?;

        tracing::info!(
            output = %config.output.display(),
            records = output.report.output_count,
            warnings = output.report.warning_count(),
            "Pipeline finished"
        );
        Ok(output.report)
    }
}
