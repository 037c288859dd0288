//! Stride CLI - Command-line interface for Stride Flux
//!
//! Commands:
//! - record: Log one contribution into the activity log file
//! - import: Apply activity records (NDJSON or JSON array) to the log file
//! - validate: Validate activity record schema
//! - status: Recompute streak and progress for configured goals
//! - streak: Print the current and longest streak
//! - target: Resolve a goal's target on a given day
//! - ledger: Evaluate the derived ledger figures

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use stride_flux::ledger::{CashPosition, DerivedLedgerCalculator, LedgerInputs};
use stride_flux::pipeline::{GoalStatus, LedgerReport, ProgressProcessor};
use stride_flux::progress::ProgressAggregator;
use stride_flux::schema::{ActivityRecord, ApplySummary, RecordAdapter, RECORD_SCHEMA_VERSION};
use stride_flux::types::{CalendarDate, GoalDefinition, MetricKind};
use stride_flux::{ActivityLog, StreakCalculator, StrideConfig, PRODUCER_NAME, STRIDE_VERSION};

/// Stride - Streaks, escalating goals and allowance ledgers
#[derive(Parser)]
#[command(name = "stride")]
#[command(version = STRIDE_VERSION)]
#[command(about = "Track streaks and escalating goals from an activity log", long_about = None)]
struct Cli {
    /// Goal configuration file (TOML)
    #[arg(long, global = true, default_value = "stride.toml")]
    config: PathBuf,

    /// Activity log file (JSON)
    #[arg(long, global = true, default_value = "stride-log.json")]
    log: PathBuf,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log one contribution into the activity log file
    Record {
        /// Metric being logged (pages, minutes, steps, currency, count or a custom name)
        #[arg(short, long)]
        metric: MetricKind,

        /// Amount to log (must be positive)
        #[arg(short, long)]
        amount: f64,

        /// Day of the activity (defaults to today)
        #[arg(long)]
        date: Option<CalendarDate>,

        /// Replace the day's amount instead of adding to it
        #[arg(long)]
        overwrite: bool,
    },

    /// Apply activity records to the activity log file
    Import {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output the import summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate activity record schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recompute streak and progress for configured goals
    Status {
        /// Only this goal (defaults to every configured goal)
        #[arg(short, long)]
        goal: Option<String>,

        /// Reference day (defaults to today)
        #[arg(long)]
        today: Option<CalendarDate>,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Print the current and longest streak
    Streak {
        /// Only count days bearing this metric
        #[arg(short, long)]
        metric: Option<MetricKind>,

        /// Reference day (defaults to today)
        #[arg(long)]
        today: Option<CalendarDate>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a goal's target, optionally as a day-by-day history
    Target {
        /// Goal id from the configuration
        goal: String,

        /// Reference day (defaults to today)
        #[arg(long)]
        today: Option<CalendarDate>,

        /// Also print the previous N days, each against its own target
        #[arg(long, default_value = "0")]
        history: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate the derived ledger figures
    Ledger {
        /// Ledger inputs file (JSON, use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

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

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), StrideCliError> {
    debug!(producer = PRODUCER_NAME, version = STRIDE_VERSION, "starting");

    match cli.command {
        Commands::Record {
            metric,
            amount,
            date,
            overwrite,
        } => cmd_record(&cli.log, metric, amount, date.unwrap_or_else(today), overwrite),

        Commands::Import {
            input,
            input_format,
            json,
        } => cmd_import(&cli.log, &input, input_format, json),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Status {
            goal,
            today: day,
            output_format,
        } => cmd_status(
            &cli.config,
            &cli.log,
            goal.as_deref(),
            day.unwrap_or_else(today),
            output_format,
        ),

        Commands::Streak {
            metric,
            today: day,
            json,
        } => cmd_streak(&cli.log, metric.as_ref(), day.unwrap_or_else(today), json),

        Commands::Target {
            goal,
            today: day,
            history,
            json,
        } => cmd_target(&cli.config, &cli.log, &goal, day.unwrap_or_else(today), history, json),

        Commands::Ledger { input, json } => cmd_ledger(&input, json),
    }
}

fn cmd_record(
    log_path: &Path,
    metric: MetricKind,
    amount: f64,
    date: CalendarDate,
    overwrite: bool,
) -> Result<(), StrideCliError> {
    let mut log = load_log(log_path)?;

    let record = if overwrite {
        ActivityRecord::overwrite(date, metric.clone(), amount)
    } else {
        ActivityRecord::new(date, metric.clone(), amount)
    };
    record.validate().map_err(stride_flux::ComputeError::from)?;

    let report = RecordAdapter::apply(&mut log, std::slice::from_ref(&record));
    if let Some(rejected) = report.rejected.first() {
        return Err(StrideCliError::Rejected(rejected.error.to_string()));
    }
    save_log(log_path, &log)?;

    let total = log.amount_on(date, &metric).unwrap_or(0.0);
    println!("{} {}: {} (day total {})", date, metric, amount, total);
    Ok(())
}

fn cmd_import(
    log_path: &Path,
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), StrideCliError> {
    let records = read_records(input, input_format)?;
    if records.is_empty() {
        return Err(StrideCliError::NoRecords);
    }

    let mut log = load_log(log_path)?;
    let report = RecordAdapter::apply(&mut log, &records);
    save_log(log_path, &log)?;

    let summary = ApplySummary::from(&report);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Applied:  {}", summary.applied);
        println!("Rejected: {}", summary.rejected);
        for error in &summary.errors {
            println!("  - {}", error);
        }
    }
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), StrideCliError> {
    let records = read_records(input, input_format)?;
    let failures = RecordAdapter::validate_records(&records);

    let report = ValidationReport {
        schema_version: RECORD_SCHEMA_VERSION.to_string(),
        total_records: records.len(),
        valid_records: records.len() - failures.len(),
        invalid_records: failures.len(),
        errors: failures
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                record_id: f.record_id.clone(),
                error: f.error.to_string(),
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

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Record {} (index {}): {}",
                    err.record_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(StrideCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_status(
    config_path: &Path,
    log_path: &Path,
    goal: Option<&str>,
    today: CalendarDate,
    output_format: OutputFormat,
) -> Result<(), StrideCliError> {
    let config = StrideConfig::load(config_path)?;
    let goals: Vec<GoalDefinition> = match goal {
        Some(id) => vec![config.goal(id)?.clone()],
        None => config.goals.clone(),
    };
    if goals.is_empty() {
        return Err(StrideCliError::NoGoals);
    }

    let processor = ProgressProcessor::with_log(config.campaign(), load_log(log_path)?);
    let statuses = processor.statuses(&goals, today)?;

    match output_format {
        OutputFormat::Text => {
            for status in &statuses {
                print_status(status);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&statuses)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&statuses)?),
    }
    Ok(())
}

fn print_status(status: &GoalStatus) {
    let marker = if status.progress.is_met() { "[MET]" } else { "[ ]" };
    println!(
        "{} {} ({}) day {}: {} / {} ({:.1}%)",
        marker,
        status.goal_id,
        status.metric,
        status.elapsed_days,
        status.progress.current,
        status.progress.target,
        status.progress.percentage
    );
    println!("    window:  {} .. {}", status.window.from, status.window.to);
    println!(
        "    streak:  {} current, {} longest",
        status.streak.current, status.streak.longest
    );
}

fn cmd_streak(
    log_path: &Path,
    metric: Option<&MetricKind>,
    today: CalendarDate,
    json: bool,
) -> Result<(), StrideCliError> {
    let log = load_log(log_path)?;
    let streak = StreakCalculator::compute_for_log(&log, metric, today);

    if json {
        println!("{}", serde_json::to_string(&streak)?);
    } else {
        println!("Current streak: {}", streak.current);
        println!("Longest streak: {}", streak.longest);
        match streak.last_activity_date {
            Some(date) => println!("Last activity:  {}", date),
            None => println!("Last activity:  none"),
        }
    }
    Ok(())
}

fn cmd_target(
    config_path: &Path,
    log_path: &Path,
    goal_id: &str,
    today: CalendarDate,
    history: u32,
    json: bool,
) -> Result<(), StrideCliError> {
    let config = StrideConfig::load(config_path)?;
    let campaign = config.campaign();
    let goal = config.goal(goal_id)?;

    let elapsed = campaign.elapsed_days(today);
    let target = goal.resolve_target(elapsed)?;

    if history == 0 {
        if json {
            let value = serde_json::json!({
                "goal_id": goal.id,
                "today": today,
                "elapsed_days": elapsed,
                "target": target,
            });
            println!("{}", value);
        } else {
            println!("{} on day {} ({}): {}", goal.id, elapsed, today, target);
        }
        return Ok(());
    }

    let log = load_log(log_path)?;
    let window = ProgressAggregator::history_window(today, history)?;
    let days = ProgressAggregator::daily_history(&log, goal, &campaign, window.from, window.to)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
    } else {
        for day in &days {
            println!(
                "{} day {:>3}: {:>10} / {:<10} {:>6.1}%",
                day.date,
                day.elapsed_days,
                day.snapshot.current,
                day.snapshot.target,
                day.snapshot.percentage
            );
        }
    }
    Ok(())
}

fn cmd_ledger(input: &Path, json: bool) -> Result<(), StrideCliError> {
    let inputs: LedgerInputs = serde_json::from_str(&read_input(input)?)?;
    let report = LedgerReport::from(DerivedLedgerCalculator::compute(&inputs));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let out = &report.outputs;
    println!("Total allowance:      {:.2}", out.total_allowance);
    println!("Total debt:           {:.2}", out.total_debt);
    println!("Total receivables:    {:.2}", out.total_receivables);
    println!("Net allowance:        {:.2}", out.net_allowance);
    println!("Bank balance:         {:.2}", out.bank_balance);
    println!("Expected cash:        {:.2}", out.expected_cash);
    println!("Cash on hand:         {:.2}", out.cash_on_hand);
    println!("Cash discrepancy:     {:.2}", out.cash_discrepancy);
    println!("Official cash figure: {:.2}", out.official_cash_figure);
    let position = match report.position {
        CashPosition::Shortfall => "shortfall",
        CashPosition::Surplus => "surplus",
        CashPosition::Balanced => "balanced",
    };
    println!("Position:             {}", position);
    Ok(())
}

// Helper functions

fn today() -> CalendarDate {
    Local::now().date_naive()
}

fn read_input(input: &Path) -> Result<String, StrideCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            warn!("reading from an interactive terminal; end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_records(
    input: &Path,
    input_format: InputFormat,
) -> Result<Vec<ActivityRecord>, StrideCliError> {
    let data = read_input(input)?;
    let records = match input_format {
        InputFormat::Ndjson => RecordAdapter::parse_ndjson(&data)?,
        InputFormat::Json => RecordAdapter::parse_array(&data)?,
    };
    Ok(records)
}

/// A missing log file is an empty log
fn load_log(path: &Path) -> Result<ActivityLog, StrideCliError> {
    if !path.exists() {
        debug!(path = %path.display(), "no activity log yet, starting empty");
        return Ok(ActivityLog::new());
    }
    let json = fs::read_to_string(path)?;
    Ok(ActivityLog::from_json(&json)?)
}

fn save_log(path: &Path, log: &ActivityLog) -> Result<(), StrideCliError> {
    fs::write(path, serde_json::to_string_pretty(log)?)?;
    debug!(path = %path.display(), entries = log.len(), "saved activity log");
    Ok(())
}

// Error types

#[derive(Debug)]
enum StrideCliError {
    Io(io::Error),
    Compute(stride_flux::ComputeError),
    Json(serde_json::Error),
    Rejected(String),
    NoRecords,
    NoGoals,
    ValidationFailed(usize),
}

impl From<io::Error> for StrideCliError {
    fn from(e: io::Error) -> Self {
        StrideCliError::Io(e)
    }
}

impl From<stride_flux::ComputeError> for StrideCliError {
    fn from(e: stride_flux::ComputeError) -> Self {
        StrideCliError::Compute(e)
    }
}

impl From<serde_json::Error> for StrideCliError {
    fn from(e: serde_json::Error) -> Self {
        StrideCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StrideCliError> for CliError {
    fn from(e: StrideCliError) -> Self {
        use stride_flux::ComputeError;

        match e {
            StrideCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            StrideCliError::Compute(e) => {
                let hint = match &e {
                    ComputeError::InvalidAmount(_) => "Amounts must be positive numbers",
                    ComputeError::InvalidRecord(_) => "Run 'stride validate' for details",
                    ComputeError::PreCampaign(_) => "Pick a day on or after campaign_start",
                    ComputeError::ConfigError(_) => "Check the goal configuration file",
                    ComputeError::UnknownGoal(_) => "Run 'stride status' to list configured goals",
                    ComputeError::ParseError(_) | ComputeError::JsonError(_) => {
                        "Ensure input matches stride.activity_record.v1 schema"
                    }
                    ComputeError::DateOutOfRange(_) => "Use a shorter range or a nearer date",
                    ComputeError::EncodingError(_) => "Report this as a bug",
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            StrideCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            StrideCliError::Rejected(msg) => CliError {
                code: "RECORD_REJECTED".to_string(),
                message: msg,
                hint: Some("Run 'stride validate' for details".to_string()),
            },
            StrideCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            StrideCliError::NoGoals => CliError {
                code: "NO_GOALS".to_string(),
                message: "No goals configured".to_string(),
                hint: Some("Add [[goals]] entries to the configuration file".to_string()),
            },
            StrideCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
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
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    record_id: Option<String>,
    error: String,
}
