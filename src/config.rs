//! Pipeline configuration.
//!
//! One declarative structure drives the whole run: which series exist, where
//! they are read from, how each one aligns, what gets derived and indexed.
//! Layering is defaults -> optional JSON file -> CLI overrides.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::align::NetLiquiditySpec;
use crate::domain::{AlignStrategy, ColumnRole, SeriesSpec};
use crate::error::AppError;

pub const SECTION_LIQUIDITY: &str = "Liquidity Data";
pub const SECTION_BITCOIN: &str = "Bitcoin";
pub const SECTION_INDEXES: &str = "NASDAQ_SPX";
pub const SECTION_SIDELINE: &str = "Sideline Cash";
pub const SECTION_SENTIMENT: &str = "Sentiment";

/// Default series name for the net liquidity column a workbook already carries.
pub const REPORTED_NET_LIQUIDITY: &str = "Reported Net Liquidity";

/// Largest accepted `day_offset`, in either direction.
pub const MAX_DAY_OFFSET: i64 = 366;

/// Pair of indexed columns checked for "first falls while second rises" weeks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergencePair {
    pub falling: String,
    pub rising: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub start_date: NaiveDate,
    /// Inclusive; `None` means today.
    pub end_date: Option<NaiveDate>,
    pub weekday: Weekday,
    pub series: Vec<SeriesSpec>,
    pub net_liquidity: Option<NetLiquiditySpec>,
    /// Columns to index, in display order.
    pub index_columns: Vec<String>,
    /// Columns whose strongest correlation is reported.
    pub correlation_anchors: Vec<String>,
    pub divergences: Vec<DivergencePair>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        use AlignStrategy::{AsOf, Exact};

        let series = vec![
            SeriesSpec::new("Fed BS", SECTION_LIQUIDITY, ColumnRole::BalanceSheet, AsOf, 0),
            SeriesSpec::new("TGA", SECTION_LIQUIDITY, ColumnRole::TreasuryAccount, AsOf, 0),
            SeriesSpec::new("RRP", SECTION_LIQUIDITY, ColumnRole::RepoFacility, AsOf, 0),
            SeriesSpec::new("M2", SECTION_LIQUIDITY, ColumnRole::MoneySupply, AsOf, 0),
            SeriesSpec::new(REPORTED_NET_LIQUIDITY, SECTION_LIQUIDITY, ColumnRole::NetLiquidity, AsOf, 0),
            // Bitcoin rows are dated the Saturday after the calendar Friday.
            SeriesSpec::new("BTC Close", SECTION_BITCOIN, ColumnRole::Close, AsOf, 1),
            SeriesSpec::new("NASDAQ", SECTION_INDEXES, ColumnRole::Nasdaq, Exact, 0),
            SeriesSpec::new("SPX", SECTION_INDEXES, ColumnRole::Spx, Exact, 0),
            SeriesSpec::new("Sideline Cash", SECTION_SIDELINE, ColumnRole::SidelineCash, AsOf, 0),
            SeriesSpec::new("VIX", SECTION_SENTIMENT, ColumnRole::Sentiment, AsOf, 0),
        ];

        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let pair = |falling: &str, rising: &str| DivergencePair {
            falling: falling.to_string(),
            rising: rising.to_string(),
        };

        Self {
            start_date: NaiveDate::from_ymd_opt(2021, 8, 6).unwrap_or_default(),
            end_date: None,
            weekday: Weekday::Fri,
            series,
            net_liquidity: Some(NetLiquiditySpec {
                reported: Some(REPORTED_NET_LIQUIDITY.to_string()),
                ..NetLiquiditySpec::default()
            }),
            index_columns: names(&["Net Liquidity", "M2", "BTC Close", "NASDAQ", "SPX", "Sideline Cash"]),
            correlation_anchors: names(&["Net Liquidity", "M2"]),
            divergences: vec![pair("Net Liquidity", "BTC Close"), pair("Net Liquidity", "M2")],
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::input(format!("Failed to open config '{}': {e}", path.display())))?;
        let config: Self = serde_json::from_reader(file)
            .map_err(|e| AppError::input(format!("Invalid config JSON '{}': {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn end_or(&self, today: NaiveDate) -> NaiveDate {
        self.end_date.unwrap_or(today)
    }

    /// Every column the aligned table will carry (series, then derived).
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.series.iter().map(|s| s.name.as_str()).collect();
        if let Some(nl) = &self.net_liquidity {
            names.push(nl.output.as_str());
        }
        names
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.series.is_empty() {
            return Err(AppError::input("Config lists no series."));
        }

        let mut seen = HashSet::new();
        for name in self.column_names() {
            if name.trim().is_empty() {
                return Err(AppError::input("Config contains a series with an empty name."));
            }
            if !seen.insert(name) {
                return Err(AppError::input(format!("Duplicate column name in config: `{name}`")));
            }
        }

        if self.series.iter().any(|s| s.section.trim().is_empty()) {
            return Err(AppError::input("Config contains a series with an empty section."));
        }

        if let Some(spec) = self.series.iter().find(|s| s.day_offset.unsigned_abs() > MAX_DAY_OFFSET.unsigned_abs()) {
            return Err(AppError::input(format!(
                "Series `{}` has day_offset {}; the limit is +/-{MAX_DAY_OFFSET} days.",
                spec.name, spec.day_offset
            )));
        }

        for anchor in &self.correlation_anchors {
            if !seen.contains(anchor.as_str()) {
                return Err(AppError::input(format!("Correlation anchor `{anchor}` is not a configured column.")));
            }
        }

        for pair in &self.divergences {
            for name in [&pair.falling, &pair.rising] {
                if !seen.contains(name.as_str()) {
                    return Err(AppError::input(format!("Divergence column `{name}` is not a configured column.")));
                }
            }
        }

        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(AppError::input(format!(
                    "End date {end} is before start date {}.",
                    self.start_date
                )));
            }
        }

        Ok(())
    }
}
