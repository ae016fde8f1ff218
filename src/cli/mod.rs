//! Command-line parsing for the liquidity monitor.
//!
//! Argument parsing and command dispatch stay separate from the alignment
//! code; `app` turns these structs into a `PipelineConfig`.

use std::path::PathBuf;

use chrono::{NaiveDate, Weekday};
use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "liq", version, about = "Weekly liquidity / market series aligner")]
pub struct Cli {
    /// Log progress to stderr (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Align, index and summarize a workbook directory.
    Run(RunArgs),
    /// Fetch series from the data providers and write a workbook directory.
    Fetch(FetchArgs),
}

/// Calendar options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct CalendarArgs {
    /// JSON pipeline config (defaults are built in).
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// First calendar date (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last calendar date, inclusive (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Calendar weekday (mon..sun).
    #[arg(long, value_parser = parse_weekday)]
    pub weekday: Option<Weekday>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Workbook directory: one `<Section>.csv` per section.
    #[arg(short, long, value_name = "DIR")]
    pub workbook: PathBuf,

    #[command(flatten)]
    pub calendar: CalendarArgs,

    /// Number of most recent aligned rows to print.
    #[arg(long, default_value_t = 12)]
    pub rows: usize,

    /// Write the aligned table to CSV.
    #[arg(long = "export-aligned", value_name = "CSV")]
    pub export_aligned: Option<PathBuf>,

    /// Write the indexed table to CSV.
    #[arg(long = "export-indexed", value_name = "CSV")]
    pub export_indexed: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Output workbook directory.
    #[arg(short, long, value_name = "DIR")]
    pub out: PathBuf,

    #[command(flatten)]
    pub calendar: CalendarArgs,
}

pub fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("invalid weekday '{s}' (expected mon, tue, ..., sun)"))
}
