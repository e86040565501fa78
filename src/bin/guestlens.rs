//! Guestlens CLI - Command-line interface for the conversation-log analytics engine
//!
//! Commands:
//! - validate: Check an upload against the recognized schema and row cap
//! - analyze: Print chart-ready aggregates as JSON
//! - report: Export the stay-period text report
//! - schema: Print the recognized source paths and the normalized schema

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use guestlens::mapper::FieldMapper;
use guestlens::report::ReportConfig;
use guestlens::segment::StayConfig;
use guestlens::{
    read_csv, AnalysisError, AnalysisSession, FilterSet, RiskTier, FIELDS, GUESTLENS_VERSION,
    MAX_ROWS,
};

/// Guestlens - Batch analytics for smart-speaker guest conversation logs
#[derive(Parser)]
#[command(name = "guestlens")]
#[command(version = GUESTLENS_VERSION)]
#[command(about = "Analyze hotel conversation-log CSV exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an upload against the recognized schema and row cap
    Validate {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print chart-ready aggregates as JSON
    Analyze {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Pretty-print the JSON output (default when stdout is a TTY)
        #[arg(long)]
        json_pretty: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Export the stay-period text report
    Report {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Configured check-in time, HH:MM
        #[arg(long)]
        checkin: String,

        /// Configured check-out time, HH:MM
        #[arg(long)]
        checkout: String,

        /// Export date stamped into the report header (defaults to today)
        #[arg(long)]
        export_date: Option<String>,

        /// Fixed display offset applied to rendered timestamps
        #[arg(long)]
        utc_offset_minutes: Option<i32>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print the recognized source paths and the normalized schema
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Start date (inclusive), YYYY-MM-DD
    #[arg(long)]
    from: Option<String>,

    /// End date (inclusive), YYYY-MM-DD
    #[arg(long)]
    to: Option<String>,

    /// Minimum response time in seconds (inclusive)
    #[arg(long)]
    min_timecost: Option<f64>,

    /// Maximum response time in seconds (inclusive)
    #[arg(long)]
    max_timecost: Option<f64>,

    /// Keep only these hotels (repeatable)
    #[arg(long)]
    hotel: Vec<String>,

    /// Keep only these rooms (repeatable)
    #[arg(long)]
    room: Vec<String>,

    /// Keep only these intents (repeatable)
    #[arg(long)]
    intent: Vec<String>,

    /// Keep only these languages (repeatable)
    #[arg(long)]
    language: Vec<String>,

    /// Keep only these risk tiers: safe, low, medium, high (repeatable)
    #[arg(long)]
    risk: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

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

fn run(cli: Cli) -> Result<(), GuestlensCliError> {
    match cli.command {
        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Analyze {
            input,
            json_pretty,
            filters,
        } => cmd_analyze(&input, json_pretty, &filters),

        Commands::Report {
            input,
            output,
            checkin,
            checkout,
            export_date,
            utc_offset_minutes,
            filters,
        } => cmd_report(
            &input,
            &output,
            &checkin,
            &checkout,
            export_date.as_deref(),
            utc_offset_minutes,
            &filters,
        ),

        Commands::Schema { json } => cmd_schema(json),
    }
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), GuestlensCliError> {
    let data = read_input(input)?;
    let raw = read_csv(data.as_bytes())?;
    let outcome = FieldMapper::normalize(&raw);

    let report = UploadReport {
        total_rows: raw.len(),
        row_limit: MAX_ROWS,
        missing_required: outcome
            .missing_required
            .iter()
            .map(|s| s.to_string())
            .collect(),
        invalid_timecost_rows: outcome.table.quality.invalid_timecost_rows,
        unparseable_timestamp_rows: outcome.table.quality.unparseable_timestamp_rows,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Upload Report");
        println!("=============");
        println!("Total rows:                 {}", report.total_rows);
        println!("Row limit:                  {}", report.row_limit);
        println!(
            "Invalid timecost rows:      {}",
            report.invalid_timecost_rows
        );
        println!(
            "Unparseable timestamp rows: {}",
            report.unparseable_timestamp_rows
        );

        if !report.missing_required.is_empty() {
            println!("\nMissing required source paths:");
            for path in &report.missing_required {
                println!("  - {path}");
            }
        }
    }

    if report.missing_required.is_empty() {
        Ok(())
    } else {
        Err(GuestlensCliError::ValidationFailed(
            report.missing_required.len(),
        ))
    }
}

fn cmd_analyze(
    input: &Path,
    json_pretty: bool,
    filters: &FilterArgs,
) -> Result<(), GuestlensCliError> {
    let data = read_input(input)?;
    let session = AnalysisSession::load(data.as_bytes())?.with_filters(build_filters(filters)?);

    let aggregates = session.aggregates();

    let pretty = json_pretty || atty::is(atty::Stream::Stdout);
    let output = if pretty {
        serde_json::to_string_pretty(&aggregates)?
    } else {
        serde_json::to_string(&aggregates)?
    };
    println!("{output}");

    Ok(())
}

fn cmd_report(
    input: &Path,
    output: &Path,
    checkin: &str,
    checkout: &str,
    export_date: Option<&str>,
    utc_offset_minutes: Option<i32>,
    filters: &FilterArgs,
) -> Result<(), GuestlensCliError> {
    let data = read_input(input)?;
    let session = AnalysisSession::load(data.as_bytes())?.with_filters(build_filters(filters)?);

    let stay = StayConfig::parse(checkin, checkout)?;
    let export_date = match export_date {
        Some(raw) => parse_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };
    let config = ReportConfig {
        export_date,
        utc_offset_minutes,
    };

    let (content, filename) = session.export_report(Some(&stay), &config)?;

    if output.to_string_lossy() == "-" {
        print!("{content}");
    } else {
        fs::write(output, content)?;
        eprintln!("Report written to {} (suggested name: {filename})", output.display());
    }

    Ok(())
}

fn cmd_schema(json: bool) -> Result<(), GuestlensCliError> {
    if json {
        let fields: Vec<serde_json::Value> = FIELDS
            .iter()
            .map(|f| {
                serde_json::json!({
                    "name": f.name,
                    "source_path": f.source_path,
                    "fallback_path": f.fallback_path,
                    "required": f.required,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    println!("Recognized source paths ({} fields):", FIELDS.len());
    println!();
    for field in &FIELDS {
        let required = if field.required { "required" } else { "optional" };
        println!("  {:<20} <- {} ({})", field.name, field.source_path, required);
        if let Some(fallback) = field.fallback_path {
            println!("  {:<20}    fallback: {}", "", fallback);
        }
    }
    println!();
    println!("Uploads are CSV with dotted-path headers; cells holding JSON");
    println!("objects or arrays are decoded for nested lookup. Uploads over");
    println!("{MAX_ROWS} data rows are rejected.");

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, GuestlensCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn build_filters(args: &FilterArgs) -> Result<FilterSet, GuestlensCliError> {
    let mut filters = FilterSet {
        start_date: args.from.as_deref().map(parse_date).transpose()?,
        end_date: args.to.as_deref().map(parse_date).transpose()?,
        min_timecost: args.min_timecost,
        max_timecost: args.max_timecost,
        ..Default::default()
    };

    filters.hotels.extend(args.hotel.iter().cloned());
    filters.rooms.extend(args.room.iter().cloned());
    filters.intents.extend(args.intent.iter().cloned());
    filters.languages.extend(args.language.iter().cloned());

    for raw in &args.risk {
        let tier: RiskTier = raw
            .parse()
            .map_err(GuestlensCliError::ParseError)?;
        filters.risk_tiers.insert(tier);
    }

    Ok(filters)
}

fn parse_date(raw: &str) -> Result<chrono::NaiveDate, GuestlensCliError> {
    raw.parse()
        .map_err(|_| GuestlensCliError::ParseError(format!("invalid date: {raw} (expected YYYY-MM-DD)")))
}

// Error types

#[derive(Debug)]
enum GuestlensCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    ParseError(String),
    ValidationFailed(usize),
}

impl From<io::Error> for GuestlensCliError {
    fn from(e: io::Error) -> Self {
        GuestlensCliError::Io(e)
    }
}

impl From<AnalysisError> for GuestlensCliError {
    fn from(e: AnalysisError) -> Self {
        GuestlensCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for GuestlensCliError {
    fn from(e: serde_json::Error) -> Self {
        GuestlensCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GuestlensCliError> for CliError {
    fn from(e: GuestlensCliError) -> Self {
        match e {
            GuestlensCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GuestlensCliError::Analysis(e) => {
                let (code, hint) = match &e {
                    AnalysisError::MalformedCsv(_) => (
                        "MALFORMED_CSV",
                        "Ensure the input is a valid CSV export",
                    ),
                    AnalysisError::MissingRequiredFields(_) => (
                        "MISSING_REQUIRED_FIELDS",
                        "Run 'guestlens schema' to see the recognized source paths",
                    ),
                    AnalysisError::RowLimitExceeded { .. } => (
                        "ROW_LIMIT_EXCEEDED",
                        "Split the export into smaller uploads",
                    ),
                    AnalysisError::InvalidTimeOfDay(_) => (
                        "INVALID_TIME_OF_DAY",
                        "Use HH:MM for --checkin and --checkout",
                    ),
                    AnalysisError::ExportConfigIncomplete(_) => (
                        "EXPORT_CONFIG_INCOMPLETE",
                        "Pass both --checkin and --checkout",
                    ),
                    AnalysisError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            GuestlensCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            GuestlensCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check flag values".to_string()),
            },
            GuestlensCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{count} required source paths are missing"),
                hint: Some("Fix the export columns and retry".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct UploadReport {
    total_rows: usize,
    row_limit: usize,
    missing_required: Vec<String>,
    invalid_timecost_rows: usize,
    unparseable_timestamp_rows: usize,
}
