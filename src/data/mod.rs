//! External data providers and the workbook they produce.
//!
//! `liq fetch` pulls each configured series from its provider, then lays the
//! results out in the workbook sections the dashboard reads:
//!
//! - "Liquidity Data": weekly, as-of filled aggregates plus net liquidity
//! - "Bitcoin": close on the day after each calendar date
//! - "NASDAQ_SPX": closes on the calendar dates
//! - "Sideline Cash" / "Sentiment": raw observations
//!
//! Providers are called in parallel; results are collected in job order
//! before anything is aligned.

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::align::{NetLiquiditySpec, align_series, derive_net_liquidity};
use crate::config::{SECTION_BITCOIN, SECTION_INDEXES, SECTION_LIQUIDITY, SECTION_SENTIMENT, SECTION_SIDELINE};
use crate::domain::{AlignStrategy, ColumnRole, Observation, SeriesSpec, TimeSeries};
use crate::error::AppError;
use crate::io::workbook::{Sheet, Workbook};

pub mod fred;
pub mod market;

pub use fred::FredClient;
pub use market::MarketClient;

/// Anything that can return the observations of one provider series.
pub trait SeriesSource: Sync {
    fn provider(&self) -> &'static str;
    fn fetch(&self, id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    CentralBank,
    Market,
}

/// One provider series and the workbook column it becomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchJob {
    pub column: &'static str,
    pub provider: Provider,
    pub id: &'static str,
    /// Multiplier applied to every value (unit harmonization).
    pub scale: f64,
}

pub const FETCH_JOBS: &[FetchJob] = &[
    // WALCL and WTREGEN are in millions of USD.
    FetchJob { column: "Fed BS", provider: Provider::CentralBank, id: "WALCL", scale: 1.0 },
    FetchJob { column: "TGA", provider: Provider::CentralBank, id: "WTREGEN", scale: 1.0 },
    // RRPONTSYD is in billions; bring it to millions.
    FetchJob { column: "RRP", provider: Provider::CentralBank, id: "RRPONTSYD", scale: 1_000.0 },
    FetchJob { column: "M2", provider: Provider::CentralBank, id: "M2SL", scale: 1.0 },
    FetchJob { column: "Sideline Cash", provider: Provider::CentralBank, id: "WRMFNS", scale: 1.0 },
    FetchJob { column: "VIX", provider: Provider::CentralBank, id: "VIXCLS", scale: 1.0 },
    FetchJob { column: "BTC", provider: Provider::Market, id: "BTC-USD", scale: 1.0 },
    FetchJob { column: "NASDAQ", provider: Provider::Market, id: "^IXIC", scale: 1.0 },
    FetchJob { column: "SPX", provider: Provider::Market, id: "^GSPC", scale: 1.0 },
];

pub struct Providers<'a> {
    pub central_bank: &'a dyn SeriesSource,
    pub market: &'a dyn SeriesSource,
}

impl Providers<'_> {
    fn source(&self, provider: Provider) -> &dyn SeriesSource {
        match provider {
            Provider::CentralBank => self.central_bank,
            Provider::Market => self.market,
        }
    }
}

/// Fetch every job in parallel. Results come back in `jobs` order; any
/// failure fails the whole fetch.
pub fn fetch_all(
    jobs: &[FetchJob],
    providers: &Providers<'_>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TimeSeries>, AppError> {
    jobs.par_iter()
        .map(|job| {
            let source = providers.source(job.provider);
            tracing::info!(provider = source.provider(), id = job.id, column = job.column, "fetching");
            let obs = source.fetch(job.id, start, end)?;
            tracing::debug!(id = job.id, observations = obs.len(), "fetched");
            let scaled = obs
                .into_iter()
                .map(|o| Observation::new(o.date, o.value.map(|v| v * job.scale)));
            Ok(TimeSeries::new(job.column, scaled))
        })
        .collect()
}

/// Lay fetched series out as the dashboard workbook.
pub fn build_workbook(series: &[TimeSeries], calendar: &[NaiveDate]) -> Workbook {
    let find = |name: &str| series.iter().find(|s| s.name() == name);
    let mut workbook = Workbook::default();

    // Liquidity: as-of fill every aggregate onto the calendar, then derive.
    let liquidity_specs: Vec<SeriesSpec> = [
        ("Fed BS", ColumnRole::BalanceSheet),
        ("TGA", ColumnRole::TreasuryAccount),
        ("RRP", ColumnRole::RepoFacility),
        ("M2", ColumnRole::MoneySupply),
    ]
    .into_iter()
    .map(|(name, role)| SeriesSpec::new(name, SECTION_LIQUIDITY, role, AlignStrategy::AsOf, 0))
    .collect();
    let aligned = align_series(calendar, series, &liquidity_specs);
    let liquidity = derive_net_liquidity(&aligned, &NetLiquiditySpec::default());
    let mut sheet = Sheet::new(
        SECTION_LIQUIDITY,
        std::iter::once("Date".to_string()).chain(liquidity.column_names().map(str::to_string)).collect(),
    );
    for row in liquidity.rows() {
        let mut cells = vec![row.date.to_string()];
        cells.extend(row.values.iter().map(|(_, v)| fmt_value(*v)));
        sheet.rows.push(cells);
    }
    workbook.insert(sheet);

    // Bitcoin: the weekend close, dated on the day after the calendar date.
    let mut sheet = Sheet::new(SECTION_BITCOIN, vec!["Date".to_string(), "Close".to_string()]);
    for date in calendar {
        let Some(day_after) = date.succ_opt() else { continue };
        let close = find("BTC").and_then(|s| s.exact(day_after));
        sheet.rows.push(vec![day_after.to_string(), fmt_value(close)]);
    }
    workbook.insert(sheet);

    // Equity indexes: closes on the calendar dates themselves.
    let mut sheet = Sheet::new(
        SECTION_INDEXES,
        vec!["Date".to_string(), "NASDAQ".to_string(), "SPX".to_string()],
    );
    for date in calendar {
        let nasdaq = find("NASDAQ").and_then(|s| s.exact(*date));
        let spx = find("SPX").and_then(|s| s.exact(*date));
        sheet.rows.push(vec![date.to_string(), fmt_value(nasdaq), fmt_value(spx)]);
    }
    workbook.insert(sheet);

    workbook.insert(raw_sheet(SECTION_SIDELINE, "Amount", find("Sideline Cash")));
    workbook.insert(raw_sheet(SECTION_SENTIMENT, "VIX", find("VIX")));

    workbook
}

fn raw_sheet(name: &str, value_header: &str, series: Option<&TimeSeries>) -> Sheet {
    let mut sheet = Sheet::new(name, vec!["Date".to_string(), value_header.to_string()]);
    if let Some(series) = series {
        for obs in series.observations() {
            sheet.rows.push(vec![obs.date.to_string(), fmt_value(obs.value)]);
        }
    }
    sheet
}

fn fmt_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticSource {
        name: &'static str,
        data: HashMap<&'static str, Vec<Observation>>,
    }

    impl SeriesSource for StaticSource {
        fn provider(&self) -> &'static str {
            self.name
        }

        fn fetch(&self, id: &str, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<Observation>, AppError> {
            self.data
                .get(id)
                .cloned()
                .ok_or_else(|| AppError::provider(format!("unknown series {id}")))
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn obs(pairs: &[(NaiveDate, f64)]) -> Vec<Observation> {
        pairs.iter().map(|(date, v)| Observation::new(*date, Some(*v))).collect()
    }

    fn sources() -> (StaticSource, StaticSource) {
        let mut cb = HashMap::new();
        cb.insert("WALCL", obs(&[(d(2024, 1, 3), 7700.0), (d(2024, 1, 10), 7690.0)]));
        cb.insert("WTREGEN", obs(&[(d(2024, 1, 3), 700.0)]));
        cb.insert("RRPONTSYD", obs(&[(d(2024, 1, 4), 0.5)]));
        cb.insert("M2SL", obs(&[(d(2024, 1, 1), 20_800.0)]));
        cb.insert("WRMFNS", obs(&[(d(2024, 1, 1), 1_900.0)]));
        cb.insert("VIXCLS", obs(&[(d(2024, 1, 5), 13.3)]));

        let mut market = HashMap::new();
        market.insert("BTC-USD", obs(&[(d(2024, 1, 6), 43_900.0), (d(2024, 1, 13), 42_800.0)]));
        market.insert("^IXIC", obs(&[(d(2024, 1, 5), 14_524.0)]));
        market.insert("^GSPC", obs(&[(d(2024, 1, 5), 4_697.2), (d(2024, 1, 12), 4_783.8)]));

        (
            StaticSource { name: "cb", data: cb },
            StaticSource { name: "mkt", data: market },
        )
    }

    #[test]
    fn fetch_keeps_job_order_and_scales() {
        let (cb, mkt) = sources();
        let providers = Providers {
            central_bank: &cb,
            market: &mkt,
        };
        let series = fetch_all(FETCH_JOBS, &providers, d(2024, 1, 1), d(2024, 1, 14)).unwrap();
        let names: Vec<_> = series.iter().map(|s| s.name()).collect();
        let expected: Vec<_> = FETCH_JOBS.iter().map(|j| j.column).collect();
        assert_eq!(names, expected);
        assert_eq!(series[2].exact(d(2024, 1, 4)), Some(500.0));
    }

    #[test]
    fn one_failed_series_fails_the_fetch() {
        let (cb, mut mkt) = sources();
        mkt.data.remove("^GSPC");
        let providers = Providers {
            central_bank: &cb,
            market: &mkt,
        };
        let err = fetch_all(FETCH_JOBS, &providers, d(2024, 1, 1), d(2024, 1, 14)).unwrap_err();
        assert!(err.to_string().contains("^GSPC"));
    }

    #[test]
    fn workbook_has_dashboard_layout() {
        let (cb, mkt) = sources();
        let providers = Providers {
            central_bank: &cb,
            market: &mkt,
        };
        let series = fetch_all(FETCH_JOBS, &providers, d(2024, 1, 1), d(2024, 1, 14)).unwrap();
        let calendar = vec![d(2024, 1, 5), d(2024, 1, 12)];
        let wb = build_workbook(&series, &calendar);

        let liq = wb.sheet(SECTION_LIQUIDITY).unwrap();
        assert_eq!(liq.headers, vec!["Date", "Fed BS", "TGA", "RRP", "M2", "Net Liquidity"]);
        // 7700 - 700 - 500 and 7690 - 700 - 500 (as-of fill).
        assert_eq!(liq.cell(0, 5), Some("6500"));
        assert_eq!(liq.cell(1, 5), Some("6490"));

        let btc = wb.sheet(SECTION_BITCOIN).unwrap();
        assert_eq!(btc.rows[0], vec!["2024-01-06", "43900"]);

        let idx = wb.sheet(SECTION_INDEXES).unwrap();
        assert_eq!(idx.rows[1], vec!["2024-01-12", "", "4783.8"]);

        assert_eq!(wb.sheet(SECTION_SENTIMENT).unwrap().rows.len(), 1);
        assert_eq!(wb.sheet(SECTION_SIDELINE).unwrap().headers, vec!["Date", "Amount"]);
    }
}
