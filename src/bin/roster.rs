//! roster CLI - join user and company JSON datasets
//!
//! Runs a YAML-configured pipeline, or a single transformation from flags.

use clap::{Parser, Subcommand};
use roster::{
    check_condition, load_records, save_records, AgeFilter, CompanyAssociator, NameEnricher,
    OutputFormat, Pipeline, PipelineConfig, PipelineReport, Record, TracingSink, UnmatchedPolicy,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roster")]
#[command(version, about = "Join user and company JSON datasets", long_about = None)]
struct Cli {
    /// Output layout (json, json-pretty, ndjson)
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline described by a YAML config file
    Run {
        /// Path to the pipeline config
        #[arg(short, long, env = "ROSTER_CONFIG", default_value = "roster.yaml")]
        config: PathBuf,

        /// Override the output path from the config
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the run report (step counts and warnings) as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Add a full_name field to every user
    Enrich {
        /// JSON array of user records
        #[arg(short, long)]
        users: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Keep users whose age satisfies a condition
    Filter {
        #[arg(short, long)]
        users: PathBuf,

        /// Threshold age to compare against
        #[arg(short, long)]
        age: i64,

        /// Condition label, e.g. "Less than" or "Greater than or equal to"
        #[arg(short, long)]
        condition: String,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Replace each user's company_id with the matching company record
    Associate {
        #[arg(short, long)]
        users: PathBuf,

        /// JSON array of company records
        #[arg(short = 'C', long)]
        companies: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Keep users whose company id is unknown instead of dropping them
        #[arg(long)]
        keep_unmatched: bool,
    },

    /// Evaluate a condition for a single age and print true or false
    Check {
        #[arg(short, long)]
        condition: String,

        #[arg(short, long)]
        age: i64,

        #[arg(short, long)]
        threshold: i64,
    },
}

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roster=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    let result = match cli.command {
        Commands::Run {
            config,
            output,
            report,
        } => run_pipeline(config, output, report, format),
        Commands::Enrich { users, output } => enrich(users, output, format.unwrap_or_default()),
        Commands::Filter {
            users,
            age,
            condition,
            output,
        } => filter(users, age, condition, output, format.unwrap_or_default()),
        Commands::Associate {
            users,
            companies,
            output,
            keep_unmatched,
        } => associate(users, companies, output, keep_unmatched, format.unwrap_or_default()),
        Commands::Check {
            condition,
            age,
            threshold,
        } => {
            println!("{}", check_condition(&condition, age, threshold));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Run a pipeline config. `--output` and `--format` override the file.
fn run_pipeline(
    config: PathBuf,
    output: Option<PathBuf>,
    report_path: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> Result<(), String> {
    let mut config = PipelineConfig::load_from_file(&config).map_err(|e| e.to_string())?;
    if let Some(output) = output {
        config.output = output;
    }
    if let Some(format) = format {
        config.format = format;
    }

    let mut sink = TracingSink::new();
    let report = Pipeline::from_config(&config)
        .execute(&config, &mut sink)
        .map_err(|e| e.to_string())?;

    if let Some(path) = report_path {
        write_report(&path, &report)?;
    }

    for step in &report.steps {
        println!(
            "  ✓ {}: {} -> {} records ({} skipped with warnings)",
            step.step, step.input, step.output, step.warnings
        );
    }
    println!(
        "✓ Wrote {} of {} records to {}",
        report.output_count,
        report.input_count,
        config.output.display()
    );
    Ok(())
}

fn enrich(users: PathBuf, output: PathBuf, format: OutputFormat) -> Result<(), String> {
    let users = load(&users)?;
    let enriched = NameEnricher::new().enrich(&users).map_err(|e| e.to_string())?;
    save(&output, &enriched, format, 0)
}

fn filter(
    users: PathBuf,
    age: i64,
    condition: String,
    output: PathBuf,
    format: OutputFormat,
) -> Result<(), String> {
    let users = load(&users)?;
    let mut sink = TracingSink::new();
    let kept = AgeFilter::new()
        .filter(&users, age, &condition, &mut sink)
        .map_err(|e| e.to_string())?;
    save(&output, &kept, format, sink.reported())
}

fn associate(
    users: PathBuf,
    companies: PathBuf,
    output: PathBuf,
    keep_unmatched: bool,
    format: OutputFormat,
) -> Result<(), String> {
    let users = load(&users)?;
    let companies = load(&companies)?;

    let policy = if keep_unmatched {
        UnmatchedPolicy::Keep
    } else {
        UnmatchedPolicy::Exclude
    };

    let mut sink = TracingSink::new();
    let associated = CompanyAssociator::with_unmatched_policy(policy)
        .associate(&users, &companies, &mut sink)
        .map_err(|e| e.to_string())?;
    save(&output, &associated, format, sink.reported())
}

fn write_report(path: &Path, report: &PipelineReport) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;
    std::fs::write(path, json)
        .map_err(|e| format!("Failed to write report {}: {}", path.display(), e))?;
    println!("✓ Wrote report to {}", path.display());
    Ok(())
}

fn load(path: &Path) -> Result<Vec<Record>, String> {
    load_records(path).map_err(|e| format!("Failed to load {}: {}", path.display(), e))
}

fn save(path: &Path, records: &[Record], format: OutputFormat, warnings: usize) -> Result<(), String> {
    save_records(path, records, format)
        .map_err(|e| format!("Failed to save {}: {}", path.display(), e))?;
    println!(
        "✓ Wrote {} records to {} ({} warnings)",
        records.len(),
        path.display(),
        warnings
    );
    Ok(())
}
