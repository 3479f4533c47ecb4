//! Motion CLI - Command-line interface for Synheart Motion
//!
//! Commands:
//! - average: Average a collection of session records into one record
//! - summary: Print collection-level summary statistics
//! - spikes: Detect jerk spikes in an averaged record
//! - validate: Check session records against the field schema
//! - config: Print the effective averaging configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use synheart_motion::pipeline::MotionProcessor;
use synheart_motion::schema::{SessionRecordAdapter, SessionSchema, JERKS, SCHEMA_VERSION};
use synheart_motion::spikes::{JerkSpikeDetector, SpikeReport, SpikeThresholds};
use synheart_motion::summary::SessionSummary;
use synheart_motion::types::SessionRecord;
use synheart_motion::{AveragingConfig, ComputeError, MOTION_VERSION};

/// Motion - On-device engine for averaging pointer kinematic traces
#[derive(Parser)]
#[command(name = "motion")]
#[command(author = "Synheart AI Inc")]
#[command(version = MOTION_VERSION)]
#[command(about = "Resample and average pointer session recordings", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Average session records into one averaged record
    Average {
        /// Input file or directory of *.json files (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        #[command(flatten)]
        settings: Settings,

        /// Wrap the averaged record with producer metadata and skip counts
        #[arg(long)]
        envelope: bool,
    },

    /// Print summary statistics of session records
    Summary {
        /// Input file or directory of *.json files (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect jerk spikes in an averaged record
    Spikes {
        /// Averaged record (or envelope) file, or session records to average first
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        #[command(flatten)]
        settings: Settings,

        /// Spike threshold heuristics (JSON); defaults when omitted
        #[arg(long)]
        thresholds: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate session records against the field schema
    Validate {
        /// Input file or directory of *.json files (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective averaging configuration
    Config {
        #[command(flatten)]
        settings: Settings,

        /// Write the configuration to a file instead of stdout
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

/// Averaging settings; flags override the config file, which overrides defaults
#[derive(clap::Args)]
struct Settings {
    /// Configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of samples in every resampled sequence
    #[arg(long)]
    target_len: Option<usize>,

    /// Minimum samples for cubic spline fitting
    #[arg(long)]
    smooth_min_samples: Option<usize>,
}

impl Settings {
    fn resolve(&self) -> Result<AveragingConfig, MotionCliError> {
        let mut config = match &self.config {
            Some(path) => AveragingConfig::load(path)?,
            None => AveragingConfig::default(),
        };
        if let Some(target_len) = self.target_len {
            config = config.with_target_len(target_len);
        }
        if let Some(smooth_min_samples) = self.smooth_min_samples {
            config = config.with_smooth_min_samples(smooth_min_samples);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// JSON array of records (a single record object is also accepted)
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MotionCliError> {
    match cli.command {
        Commands::Average {
            input,
            output,
            input_format,
            settings,
            envelope,
        } => cmd_average(&input, &output, input_format, &settings, envelope),

        Commands::Summary {
            input,
            input_format,
            json,
        } => cmd_summary(&input, input_format, json),

        Commands::Spikes {
            input,
            input_format,
            settings,
            thresholds,
            json,
        } => cmd_spikes(&input, input_format, &settings, thresholds.as_deref(), json),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Config { settings, save } => cmd_config(&settings, save.as_deref()),
    }
}

fn cmd_average(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    settings: &Settings,
    envelope: bool,
) -> Result<(), MotionCliError> {
    let config = settings.resolve()?;
    let records = load_records(input, input_format)?;
    if records.is_empty() {
        return Err(MotionCliError::NoRecords);
    }

    let mut processor = MotionProcessor::with_config(config)?;
    for record in records {
        processor.push_record(record);
    }

    let output_data = if envelope {
        processor.average_to_json()?
    } else {
        serde_json::to_string_pretty(&processor.average().record)?
    };

    write_output(output, &output_data)
}

fn cmd_summary(input: &Path, input_format: InputFormat, json: bool) -> Result<(), MotionCliError> {
    let records = load_records(input, input_format)?;
    if records.is_empty() {
        return Err(MotionCliError::NoRecords);
    }

    let summary = SessionSummary::compute(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Session Summary ({} records)", records.len());
        println!("=============================");
        println!("Average total time:       {:.3}", summary.average_total_time);
        println!("Average speed:            {:.3}", summary.average_speed);
        println!("Average jerk spike count: {:.3}", summary.average_jerk_spike_count);
        println!("Average hesitation:       {:.3}", summary.average_hesitation);
        println!("Average pause duration:   {:.3}", summary.average_pause_duration);
        println!("Average pause count:      {:.3}", summary.average_pause_count);
    }

    Ok(())
}

fn cmd_spikes(
    input: &Path,
    input_format: InputFormat,
    settings: &Settings,
    thresholds: Option<&Path>,
    json: bool,
) -> Result<(), MotionCliError> {
    let detector = match thresholds {
        Some(path) => {
            let thresholds: SpikeThresholds = serde_json::from_str(&fs::read_to_string(path)?)?;
            JerkSpikeDetector::new(thresholds)?
        }
        None => JerkSpikeDetector::default(),
    };
    let jerks = load_jerks(input, input_format, settings)?;
    let report = detector.detect(&jerks);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_spike_report(&report, jerks.len());
    }

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), MotionCliError> {
    let records = load_records(input, input_format)?;
    let issues = SessionRecordAdapter::validate_records(&records, &SessionSchema::kinematic());

    let mut invalid: Vec<usize> = issues.iter().map(|issue| issue.index).collect();
    invalid.dedup();

    let report = ValidationReport {
        schema_version: SCHEMA_VERSION.to_string(),
        total_records: records.len(),
        valid_records: records.len() - invalid.len(),
        invalid_records: invalid.len(),
        issues: issues
            .into_iter()
            .map(|issue| ValidationIssueDetail {
                index: issue.index,
                field: issue.field,
                error: issue.error,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report ({})", report.schema_version);
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.issues.is_empty() {
            println!("\nIssues:");
            for issue in &report.issues {
                println!("  - Record {} field {}: {}", issue.index, issue.field, issue.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(MotionCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_config(settings: &Settings, save: Option<&Path>) -> Result<(), MotionCliError> {
    let config = settings.resolve()?;
    match save {
        Some(path) => {
            config.save(path)?;
            info!(path = %path.display(), "configuration saved");
        }
        None => println!("{}", config.to_json()?),
    }
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, MotionCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(MotionCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(data: &str, input_format: InputFormat) -> Result<Vec<SessionRecord>, MotionCliError> {
    let records = match input_format {
        InputFormat::Json => SessionRecordAdapter::parse_document(data)?,
        InputFormat::Ndjson => SessionRecordAdapter::parse_ndjson(data)?,
    };
    Ok(records)
}

/// Load records from a file, stdin, or every `*.json` file of a directory
/// (visited in file-name order, each holding one record or an array)
fn load_records(input: &Path, input_format: InputFormat) -> Result<Vec<SessionRecord>, MotionCliError> {
    if !input.is_dir() {
        let records = parse_records(&read_input(input)?, input_format)?;
        debug!(records = records.len(), input = %input.display(), "loaded records");
        return Ok(records);
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(input)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();

    let mut records = Vec::new();
    for path in &paths {
        let content = fs::read_to_string(path)?;
        let parsed = SessionRecordAdapter::parse_document(&content).map_err(|e| {
            MotionCliError::ParseError(format!("{}: {}", path.display(), e))
        })?;
        debug!(records = parsed.len(), file = %path.display(), "loaded records");
        records.extend(parsed);
    }
    info!(files = paths.len(), records = records.len(), "loaded record directory");
    Ok(records)
}

/// Jerk sequence of an averaged record or envelope; session records are
/// averaged first
fn load_jerks(
    input: &Path,
    input_format: InputFormat,
    settings: &Settings,
) -> Result<Vec<f64>, MotionCliError> {
    if !input.is_dir() {
        let data = read_input(input)?;
        if let InputFormat::Json = input_format {
            let value: serde_json::Value = serde_json::from_str(&data)?;
            let averaged = value.get("result").unwrap_or(&value);
            if averaged.get(JERKS).is_some() {
                let record = SessionRecordAdapter::parse_averaged(
                    &averaged.to_string(),
                    &SessionSchema::kinematic(),
                )?;
                return record
                    .sequence(JERKS)
                    .and_then(|sequence| sequence.as_scalars())
                    .map(|jerks| jerks.to_vec())
                    .ok_or_else(|| MotionCliError::MissingField(JERKS.to_string()));
            }
        }
        return average_jerks(parse_records(&data, input_format)?, settings);
    }
    average_jerks(load_records(input, input_format)?, settings)
}

fn average_jerks(records: Vec<SessionRecord>, settings: &Settings) -> Result<Vec<f64>, MotionCliError> {
    if records.is_empty() {
        return Err(MotionCliError::NoRecords);
    }
    let mut processor = MotionProcessor::with_config(settings.resolve()?)?;
    for record in records {
        processor.push_record(record);
    }
    processor
        .average()
        .record
        .sequence(JERKS)
        .and_then(|sequence| sequence.as_scalars())
        .map(|jerks| jerks.to_vec())
        .ok_or_else(|| MotionCliError::MissingField(JERKS.to_string()))
}

fn print_spike_report(report: &SpikeReport, samples: usize) {
    println!("Jerk Spike Report");
    println!("=================");
    println!("Samples:   {}", samples);
    println!("Threshold: {:.3}", report.threshold);
    println!("Spikes:    {}", report.count());

    if report.count() > 0 {
        println!("\nSpikes (index: smoothed jerk):");
        for (index, value) in report.indices.iter().zip(&report.values) {
            println!("  - {}: {:.3}", index, value);
        }
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), MotionCliError> {
    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
        info!(path = %output.display(), "output written");
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum MotionCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoInput,
    NoRecords,
    MissingField(String),
    ValidationFailed(usize),
    ParseError(String),
}

impl From<io::Error> for MotionCliError {
    fn from(e: io::Error) -> Self {
        MotionCliError::Io(e)
    }
}

impl From<ComputeError> for MotionCliError {
    fn from(e: ComputeError) -> Self {
        MotionCliError::Compute(e)
    }
}

impl From<serde_json::Error> for MotionCliError {
    fn from(e: serde_json::Error) -> Self {
        MotionCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MotionCliError> for CliError {
    fn from(e: MotionCliError) -> Self {
        match e {
            MotionCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MotionCliError::Compute(ComputeError::InvalidConfig(msg)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: msg,
                hint: Some("Run 'motion config' to inspect the effective settings".to_string()),
            },
            MotionCliError::Compute(e) => CliError {
                code: format!("{}_ERROR", e.kind().to_uppercase()),
                message: e.to_string(),
                hint: Some("Run 'motion validate' for details".to_string()),
            },
            MotionCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MotionCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal, nothing to read".to_string(),
                hint: Some("Pipe records into the command or pass --input <file>".to_string()),
            },
            MotionCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No session records found in input".to_string(),
                hint: Some("Ensure input is not empty".to_string()),
            },
            MotionCliError::MissingField(field) => CliError {
                code: "MISSING_FIELD".to_string(),
                message: format!("Input has no '{}' sequence", field),
                hint: Some("Records need accelerations to derive jerk".to_string()),
            },
            MotionCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            MotionCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    schema_version: String,
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    issues: Vec<ValidationIssueDetail>,
}

#[derive(serde::Serialize)]
struct ValidationIssueDetail {
    index: usize,
    field: String,
    error: String,
}
