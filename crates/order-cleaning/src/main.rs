//! CLI entry point for the order cleaning pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use order_cleaning::{
    CheckPolicy, ChecksConfig, Pipeline, PipelineConfig, QualityCheck, RunSummary,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Clean an orders CSV into a typed Parquet table",
    long_about = "Reads data/raw/orders.csv under the project root, enforces the orders \
                  schema, runs quality checks, writes a missingness report and the cleaned \
                  table to data/processed.\n\n\
                  EXAMPLES:\n  \
                  # Production run: any failed check stops the run\n  \
                  order-cleaning --root .\n\n  \
                  # Tolerate the duplicate order and the negative amount in the sample data\n  \
                  order-cleaning --root . --demo\n\n  \
                  # List every failing check before stopping\n  \
                  order-cleaning --policy unique_order_id=collect --policy amount_range=collect"
)]
struct Args {
    /// Project root containing the data/ directory
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// JSON file with a pipeline configuration
    ///
    /// Command line flags override values from the file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Orders file name inside data/raw
    #[arg(short, long)]
    input: Option<String>,

    /// Cleaned table file name inside data/processed
    #[arg(short, long)]
    output_name: Option<String>,

    /// Missingness report file name inside data/processed
    #[arg(long)]
    report_name: Option<String>,

    /// Users file name inside data/raw
    #[arg(long, conflicts_with = "no_users")]
    users: Option<String>,

    /// Do not load or check a users table
    #[arg(long)]
    no_users: bool,

    /// Warn instead of failing on duplicate order ids and out-of-range amounts
    #[arg(long)]
    demo: bool,

    /// Override one check's policy, e.g. `amount_range=warn` (repeatable)
    #[arg(long = "policy", value_name = "CHECK=POLICY", value_parser = parse_policy)]
    policies: Vec<(QualityCheck, CheckPolicy)>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Print the run summary as JSON on stdout
    ///
    /// Disables all logging so stdout only contains the JSON document.
    #[arg(long)]
    json: bool,
}

/// Parse `check=policy` into its two halves.
fn parse_policy(s: &str) -> std::result::Result<(QualityCheck, CheckPolicy), String> {
    let (check, policy) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CHECK=POLICY, got '{}'", s))?;
    Ok((check.trim().parse()?, policy.trim().parse()?))
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Load a configuration file, or the defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Merge command line overrides into the loaded configuration.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = load_config(args.config.as_deref())?;

    // --root only overrides a config file when given explicitly
    if args.config.is_none() || args.root != Path::new(".") {
        config.root = args.root.clone();
    }
    if let Some(input) = &args.input {
        config.orders_file = input.clone();
    }
    if let Some(name) = &args.output_name {
        config.output_file = name.clone();
    }
    if let Some(name) = &args.report_name {
        config.report_file = name.clone();
    }
    if args.no_users {
        config.users_file = None;
    } else if let Some(users) = &args.users {
        config.users_file = Some(users.clone());
    }
    if args.demo {
        config.checks = ChecksConfig::demo();
    }
    for (check, policy) in &args.policies {
        config.checks.set(*check, *policy);
    }

    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;

    let orders_path = config.orders_path();
    if !orders_path.exists() {
        return Err(anyhow!("Input file not found: {}", orders_path.display()));
    }

    info!("{}", "=".repeat(80));
    info!("Starting order cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let pipeline = Pipeline::builder().config(config).build()?;

    match pipeline.run() {
        Ok(summary) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Print a human-readable run summary.
///
/// Uses `println!` rather than tracing so the summary shows regardless of
/// log level.
fn print_summary(summary: &RunSummary) {
    println!("\n{}", "=".repeat(80));
    println!("ORDER CLEANING SUMMARY");
    println!("{}\n", "=".repeat(80));

    println!("  Input:   {}", summary.orders_path.display());
    if let Some(users) = &summary.users_path {
        println!("  Users:   {}", users.display());
    }
    println!("  Output:  {}", summary.output_path.display());
    println!("  Report:  {}", summary.report_path.display());
    println!(
        "  Shape:   {} rows x {} columns ({} ms)",
        summary.rows,
        summary.columns.len(),
        summary.duration_ms
    );
    println!();

    println!("QUALITY CHECKS");
    println!("{}", "-".repeat(40));
    for record in &summary.checks {
        let status = if record.passed { "ok" } else { "FAILED" };
        println!("  {:<18} {:<7} ({:?})", record.check.name(), status, record.policy);
        if let Some(message) = &record.message {
            println!("      {}", message);
        }
    }
    println!();

    println!("MISSINGNESS");
    println!("{}", "-".repeat(40));
    println!("  {:<20} {:>10} {:>10}", "column", "n_missing", "p_missing");
    for row in summary.missingness.rows() {
        println!(
            "  {:<20} {:>10} {:>9.1}%",
            row.column, row.n_missing, row.p_missing
        );
    }
    println!();
}
