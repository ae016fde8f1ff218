//! Shared domain types.
//!
//! These types are kept plain and serializable so they can be:
//!
//! - built by the workbook loader or the provider clients
//! - aligned and indexed in memory
//! - written back out as CSV or described in a JSON config

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// One dated observation. `value == None` is an explicitly missing cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// A named series, sorted by date with unique dates.
///
/// Construction sorts and deduplicates: when the same date appears more than
/// once, the observation inserted last wins.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    observations: Vec<Observation>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, observations: impl IntoIterator<Item = Observation>) -> Self {
        let mut observations: Vec<Observation> = observations.into_iter().collect();
        // Stable sort keeps insertion order among equal dates.
        observations.sort_by_key(|o| o.date);

        let mut deduped: Vec<Observation> = Vec::with_capacity(observations.len());
        for obs in observations {
            match deduped.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => deduped.push(obs),
            }
        }

        Self {
            name: name.into(),
            observations: deduped,
        }
    }

    pub fn from_pairs(name: impl Into<String>, pairs: impl IntoIterator<Item = (NaiveDate, Option<f64>)>) -> Self {
        Self::new(name, pairs.into_iter().map(|(date, value)| Observation::new(date, value)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Value observed on exactly `date`.
    pub fn exact(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .binary_search_by_key(&date, |o| o.date)
            .ok()
            .and_then(|idx| self.observations[idx].value)
    }

    /// Most recent non-missing value observed on or before `date`.
    ///
    /// Never looks past `date`.
    pub fn as_of(&self, date: NaiveDate) -> Option<f64> {
        let end = self.observations.partition_point(|o| o.date <= date);
        self.observations[..end].iter().rev().find_map(|o| o.value)
    }

    /// Resolve a value for a calendar date with the given strategy and shift.
    ///
    /// A shift that leaves chrono's date range resolves to missing.
    pub fn resolve(&self, date: NaiveDate, strategy: AlignStrategy, day_offset: i64) -> Option<f64> {
        let target = date.checked_add_signed(Duration::try_days(day_offset)?)?;
        match strategy {
            AlignStrategy::Exact => self.exact(target),
            AlignStrategy::AsOf => self.as_of(target),
        }
    }
}

/// How a series is mapped onto calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignStrategy {
    /// Only an observation on the (shifted) calendar date counts.
    Exact,
    /// Most recent observation on or before the (shifted) calendar date.
    AsOf,
}

/// Well-known column roles in workbook sections.
///
/// Headers are mapped to roles by case-insensitive substring matching, see
/// `io::roles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnRole {
    Date,
    BalanceSheet,
    TreasuryAccount,
    RepoFacility,
    MoneySupply,
    NetLiquidity,
    Close,
    Nasdaq,
    Spx,
    SidelineCash,
    Sentiment,
}

impl ColumnRole {
    pub fn label(self) -> &'static str {
        match self {
            ColumnRole::Date => "date",
            ColumnRole::BalanceSheet => "balance-sheet",
            ColumnRole::TreasuryAccount => "treasury-account",
            ColumnRole::RepoFacility => "repo-facility",
            ColumnRole::MoneySupply => "money-supply",
            ColumnRole::NetLiquidity => "net-liquidity",
            ColumnRole::Close => "close",
            ColumnRole::Nasdaq => "nasdaq",
            ColumnRole::Spx => "spx",
            ColumnRole::SidelineCash => "sideline-cash",
            ColumnRole::Sentiment => "sentiment",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declarative description of one aligned column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Output column name.
    pub name: String,
    /// Workbook section (sheet) the series is read from.
    pub section: String,
    /// Column role inside the section.
    pub role: ColumnRole,
    pub strategy: AlignStrategy,
    /// Days added to each calendar date before lookup.
    #[serde(default)]
    pub day_offset: i64,
}

impl SeriesSpec {
    pub fn new(
        name: impl Into<String>,
        section: impl Into<String>,
        role: ColumnRole,
        strategy: AlignStrategy,
        day_offset: i64,
    ) -> Self {
        Self {
            name: name.into(),
            section: section.into(),
            role,
            strategy,
            day_offset,
        }
    }
}

/// Where an aligned column came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Provenance {
    Aligned { strategy: AlignStrategy, day_offset: i64 },
    /// Row-wise derivation. `imputed[i]` is true when at least one input on
    /// row `i` was missing and replaced by zero.
    Derived { imputed: Vec<bool> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
    pub provenance: Provenance,
}

impl Column {
    pub fn non_missing(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// One row per calendar date, one optional value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    pub date: NaiveDate,
    pub values: Vec<(&'a str, Option<f64>)>,
}

impl AlignedTable {
    /// Build a table. Every column must have one value per date.
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<Column>) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == dates.len()));
        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// A new table with `column` appended (or replacing a column of the same name).
    pub fn with_column(&self, column: Column) -> Self {
        let mut columns: Vec<Column> = self.columns.iter().filter(|c| c.name != column.name).cloned().collect();
        columns.push(column);
        Self::new(self.dates.clone(), columns)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.dates.iter().enumerate().map(move |(i, date)| Row {
            date: *date,
            values: self.columns.iter().map(|c| (c.name.as_str(), c.values[i])).collect(),
        })
    }
}

/// One indexed column: `values[i] = raw[i] / base * 100`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedColumn {
    pub name: String,
    pub base: f64,
    pub base_date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

impl IndexedColumn {
    pub fn label(&self) -> String {
        format!("{} (idx)", self.name)
    }
}

/// Base-100 view over a subset of aligned columns.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTable {
    dates: Vec<NaiveDate>,
    columns: Vec<IndexedColumn>,
}

impl IndexedTable {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<IndexedColumn>) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == dates.len()));
        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[IndexedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&IndexedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.dates.iter().enumerate().map(move |(i, date)| Row {
            date: *date,
            values: self.columns.iter().map(|c| (c.name.as_str(), c.values[i])).collect(),
        })
    }
}
