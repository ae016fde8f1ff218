//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - layers the pipeline config (defaults, JSON file, flags)
//! - runs the pipeline or the provider fetch
//! - prints reports and writes optional exports

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::calendar::weekly_calendar;
use crate::cli::{CalendarArgs, Cli, Command, FetchArgs, RunArgs};
use crate::config::PipelineConfig;
use crate::data::{FETCH_JOBS, FredClient, MarketClient, Providers, build_workbook, fetch_all};
use crate::error::AppError;
use crate::io::workbook::write_workbook_dir;

pub mod pipeline;

/// Entry point for the `liq` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Fetch(args) => handle_fetch(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Defaults -> JSON file -> CLI flags.
pub fn config_from_args(args: &CalendarArgs) -> Result<PipelineConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(start) = args.start {
        config.start_date = start;
    }
    if let Some(end) = args.end {
        config.end_date = Some(end);
    }
    if let Some(weekday) = args.weekday {
        config.weekday = weekday;
    }
    config.validate()?;
    Ok(config)
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.calendar)?;
    let today = Local::now().date_naive();
    let run = pipeline::run_from_dir(&config, &args.workbook, today)?;

    println!("{}", crate::report::format_run_summary(&run, &config));
    println!("{}", crate::report::format_aligned_tail(&run.aligned, args.rows));
    println!("{}", crate::report::format_indexed(&run.indexed));
    println!("{}", crate::report::format_correlation(&run.correlation, &run.strongest));
    print!("{}", crate::report::format_divergences(&run.divergences));

    if let Some(path) = &args.export_aligned {
        crate::io::export::write_aligned_csv(path, &run.aligned)?;
        tracing::info!(path = %path.display(), "aligned table written");
    }
    if let Some(path) = &args.export_indexed {
        crate::io::export::write_indexed_csv(path, &run.indexed)?;
        tracing::info!(path = %path.display(), "indexed table written");
    }

    Ok(())
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.calendar)?;
    let end = config.end_or(Local::now().date_naive());

    let fred = FredClient::from_env()?;
    let market = MarketClient::new()?;
    let providers = Providers {
        central_bank: &fred,
        market: &market,
    };

    let series = fetch_all(FETCH_JOBS, &providers, config.start_date, end)?;
    let calendar = weekly_calendar(config.start_date, end, config.weekday);
    let workbook = build_workbook(&series, &calendar);
    write_workbook_dir(&workbook, &args.out)?;

    println!(
        "Wrote {} sections ({} weekly rows) to {}",
        workbook.sheets().len(),
        calendar.len(),
        args.out.display()
    );
    Ok(())
}
