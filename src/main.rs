//! appearance-report - Panelist Appearance Report Generator
//!
//! Connects to the quiz show database, counts how many shows each
//! panelist appeared on per year, and writes the result as an HTML table.
//!
//! Exit codes:
//!   0 - Report written (or dry run completed)
//!   1 - Any failure (arguments, config, connection, query, write)

mod analysis;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use db::ShowFilter;
use models::{Dataset, Report, ReportMetadata};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("appearance-report v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", redacted(&args));
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run_report(args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default config file.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to set database credentials and the output path.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so `--output -` produces a clean document on stdout.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Copy of the arguments that is safe to log.
fn redacted(args: &Args) -> Args {
    let mut args = args.clone();
    if args.db_password.is_some() {
        args.db_password = Some("***".to_string());
    }
    args
}

/// Run load, aggregate and render in order.
async fn run_report(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let output = PathBuf::from(&config.report.output);
    let to_stdout = output.as_os_str() == "-";
    let chatty = !args.quiet && !to_stdout;

    // Step 1: Load appearances. The connection is closed on return.
    if chatty {
        println!("Loading appearances from {}", config.database.source_label());
    }
    let filter = ShowFilter::from(&config.report);
    let dataset = db::load_dataset(&config.database, filter).await?;

    // Step 2: Aggregate
    let report = build_report(&config, dataset);
    info!(
        "Aggregated {} panelists over {} years",
        report.participants.len(),
        report.years.len()
    );

    if args.dry_run {
        print_summary(&report);
        println!("\nDry run complete. No report was written.");
        return Ok(());
    }

    // Step 3: Render and write
    let rendered = match args.format {
        OutputFormat::Html => report::generate_html_report(&report)?,
        OutputFormat::Json => report::generate_json_report(&report)?,
    };
    report::write_report(&rendered, &output)?;

    if chatty {
        print_summary(&report);
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!("\nReport saved to: {}", output.display());
    }

    Ok(())
}

/// Aggregate the loaded dataset into a report.
fn build_report(config: &Config, dataset: Dataset) -> Report {
    let participants = analysis::group_by_participant(&dataset.records);
    let years = analysis::report_years(&dataset.show_years, &participants);
    let total_appearances = analysis::total_appearances(&participants);

    let metadata = ReportMetadata {
        title: config.report.title.clone(),
        generated_at: Utc::now(),
        source: config.database.source_label(),
        ga_property_code: config.report.ga_property_code().map(String::from),
    };

    Report {
        metadata,
        years,
        participants,
        total_appearances,
    }
}

/// Print a short summary of the report contents.
fn print_summary(report: &Report) {
    println!("\nReport Summary:");
    println!("   Panelists: {}", report.participants.len());
    println!("   Appearances: {}", report.total_appearances);
    if let (Some(first), Some(last)) = (report.years.first(), report.years.last()) {
        println!("   Years: {}-{}", first, last);
    }

    for (row, total) in analysis::most_frequent_participants(&report.participants, 5) {
        match row.year_span() {
            Some((first, last)) => println!("     {} ({}, {}-{})", row.name, total, first, last),
            None => println!("     {} ({})", row.name, total),
        }
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
/// Returns the path the config came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(DEFAULT_CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("Warning: failed to load config: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}
