//! Daily closes from the Yahoo Finance chart endpoint.

use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::SeriesSource;
use crate::domain::Observation;
use crate::error::AppError;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
// The endpoint rejects requests without a browser-ish agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) liquidity-monitor";

pub struct MarketClient {
    client: Client,
    base_url: String,
}

impl MarketClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::provider(format!("Failed to build market-data HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Daily closes of `symbol` in `[start, end]`, dated in exchange-local time.
    pub fn fetch_closes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>, AppError> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // +1 day so the end date's session is included.
        let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp() + 86_400;

        let resp = self
            .client
            .get(format!("{}/{symbol}", self.base_url))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .map_err(|e| AppError::provider(format!("Market-data request for {symbol} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::provider(format!(
                "Market-data request for {symbol} failed with status {}.",
                resp.status()
            )));
        }

        let body: ChartResponse = resp
            .json()
            .map_err(|e| AppError::provider(format!("Failed to parse market data for {symbol}: {e}")))?;

        let obs = parse_chart(symbol, body)?;
        Ok(obs.into_iter().filter(|o| o.date >= start && o.date <= end).collect())
    }
}

impl SeriesSource for MarketClient {
    fn provider(&self) -> &'static str {
        "market"
    }

    fn fetch(&self, id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>, AppError> {
        self.fetch_closes(id, start, end)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn parse_chart(symbol: &str, body: ChartResponse) -> Result<Vec<Observation>, AppError> {
    if let Some(err) = body.chart.error {
        return Err(AppError::provider(format!(
            "Market data error for {symbol}: {} ({})",
            err.description, err.code
        )));
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AppError::provider(format!("Market data for {symbol} has no result.")))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        return Err(AppError::provider(format!(
            "Market data for {symbol} has {} timestamps but {} closes.",
            result.timestamp.len(),
            closes.len()
        )));
    }

    let offset = result.meta.gmtoffset;
    result
        .timestamp
        .iter()
        .zip(closes)
        .map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts + offset, 0)
                .ok_or_else(|| AppError::provider(format!("Invalid timestamp {ts} for {symbol}.")))?
                .date_naive();
            Ok(Observation::new(date, close.filter(|v| v.is_finite())))
        })
        .collect()
}
