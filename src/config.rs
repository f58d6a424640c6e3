//! Pipeline configuration loader.
//!
//! A pipeline is described in YAML under a top-level `pipeline` key:
//!
//! ```yaml
//! pipeline:
//!   users: data/user.json
//!   companies: data/company.json
//!   output: output_data.json
//!   format: json
//!   steps:
//!     - step: enrich_names
//!     - step: filter_by_age
//!       threshold_age: 30
//!       condition: Less than
//!     - step: associate_companies
//!       unmatched: exclude
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use crate::condition::Condition;
use crate::serialization::OutputFormat;
use crate::transforms::UnmatchedPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read config file {}: {}", path.display(), source)
            }
            ConfigError::Yaml(e) => write!(f, "Failed to parse YAML: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid pipeline config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

/// One transformation in a pipeline, applied in list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Add `full_name` to every user
    EnrichNames,
    /// Keep users whose age satisfies `condition` against `threshold_age`
    FilterByAge {
        threshold_age: i64,
        condition: String,
    },
    /// Replace `company_id` with the matching company record
    AssociateCompanies {
        #[serde(default)]
        unmatched: UnmatchedPolicy,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::EnrichNames => "enrich_names",
            Step::FilterByAge { .. } => "filter_by_age",
            Step::AssociateCompanies { .. } => "associate_companies",
        }
    }
}

/// Inputs, output and steps of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// JSON array of user records
    pub users: PathBuf,

    /// JSON array of company records (needed by `associate_companies`)
    #[serde(default)]
    pub companies: Option<PathBuf>,

    /// Destination of the resulting records
    pub output: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl PipelineConfig {
    /// Load a pipeline configuration from a YAML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid YAML, lacks the
    /// `pipeline` key, or fails [`PipelineConfig::validate`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_yaml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        tracing::debug!(path = %path.display(), steps = config.steps.len(), "Loaded pipeline config");
        Ok(config)
    }

    /// Parse and validate a configuration held in memory. Paths stay as written.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(contents)?;

        let pipeline_yaml = yaml
            .get("pipeline")
            .ok_or_else(|| ConfigError::Invalid("Config missing 'pipeline' field".to_string()))?;

        let config: PipelineConfig = serde_yaml::from_value(pipeline_yaml.clone())?;
        config.validate()?;
        Ok(config)
    }

    /// Check the step list against the configured inputs.
    ///
    /// Unknown condition labels are accepted (they match no users) but logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::Invalid("'steps' must list at least one step".to_string()));
        }

        for step in &self.steps {
            match step {
                Step::AssociateCompanies { .. } if self.companies.is_none() => {
                    return Err(ConfigError::Invalid(
                        "'associate_companies' step requires a 'companies' input".to_string(),
                    ));
                }
                Step::FilterByAge { condition, .. } => {
                    if let Err(msg) = condition.parse::<Condition>() {
                        tracing::warn!("{}", msg);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Make relative input and output paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        resolve(&mut self.users);
        resolve(&mut self.output);
        if let Some(companies) = self.companies.as_mut() {
            resolve(companies);
        }
    }

    pub fn needs_companies(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s, Step::AssociateCompanies { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
pipeline:
  users: data/user.json
  companies: data/company.json
  output: out/result.json
  format: ndjson
  steps:
    - step: enrich_names
    - step: filter_by_age
      threshold_age: 30
      condition: Less than
    - step: associate_companies
      unmatched: keep
"#;

    #[test]
    fn test_parse_full_config() {
        let config = PipelineConfig::from_yaml_str(FULL).unwrap();

        assert_eq!(config.users, PathBuf::from("data/user.json"));
        assert_eq!(config.companies, Some(PathBuf::from("data/company.json")));
        assert_eq!(config.format, OutputFormat::Ndjson);
        assert_eq!(
            config.steps,
            vec![
                Step::EnrichNames,
                Step::FilterByAge {
                    threshold_age: 30,
                    condition: "Less than".to_string(),
                },
                Step::AssociateCompanies {
                    unmatched: UnmatchedPolicy::Keep,
                },
            ]
        );
        assert!(config.needs_companies());
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
pipeline:
  users: user.json
  output: out.json
  steps:
    - step: enrich_names
"#;
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.companies, None);
        assert!(!config.needs_companies());
    }

    #[test]
    fn test_filter_step_requires_condition() {
        let yaml = r#"
pipeline:
  users: user.json
  output: out.json
  steps:
    - step: filter_by_age
      threshold_age: 30
"#;
        let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_association_requires_companies() {
        let yaml = r#"
pipeline:
  users: user.json
  output: out.json
  steps:
    - step: associate_companies
"#;
        let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("companies")));
    }

    #[test]
    fn test_missing_pipeline_key_and_empty_steps() {
        let err = PipelineConfig::from_yaml_str("users: user.json\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let yaml = "pipeline:\n  users: user.json\n  output: out.json\n";
        let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("steps")));
    }

    #[test]
    fn test_unknown_condition_is_accepted() {
        let yaml = r#"
pipeline:
  users: user.json
  output: out.json
  steps:
    - step: filter_by_age
      threshold_age: 30
      condition: About
"#;
        assert!(PipelineConfig::from_yaml_str(yaml).is_ok());
    }

    #[test]
    fn test_resolve_paths() {
        let mut config = PipelineConfig::from_yaml_str(FULL).unwrap();
        config.output = PathBuf::from("/tmp/absolute.json");
        config.resolve_paths(Path::new("/srv/roster"));

        assert_eq!(config.users, PathBuf::from("/srv/roster/data/user.json"));
        assert_eq!(config.companies, Some(PathBuf::from("/srv/roster/data/company.json")));
        assert_eq!(config.output, PathBuf::from("/tmp/absolute.json"));
    }

    #[test]
    fn test_load_from_file_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.yaml");
        fs::write(&path, FULL).unwrap();

        let config = PipelineConfig::load_from_file(&path).unwrap();
        assert_eq!(config.users, dir.path().join("data/user.json"));

        let missing = PipelineConfig::load_from_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
