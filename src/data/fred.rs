//! FRED API client for the central-bank aggregates.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::SeriesSource;
use crate::domain::Observation;
use crate::error::AppError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 100_000;

pub struct FredClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FredClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("FRED_API_KEY")
            .map_err(|_| AppError::input("Missing FRED_API_KEY in environment (.env)."))?;
        Ok(Self::new(api_key))
    }

    /// Ascending observations of `series_id` in `[start, end]`. FRED's `.`
    /// marker becomes a missing value.
    pub fn fetch_series(&self, series_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>, AppError> {
        let start = start.to_string();
        let end = end.to_string();
        let limit = OBS_LIMIT.to_string();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("sort_order", "asc"),
                ("observation_start", start.as_str()),
                ("observation_end", end.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|e| AppError::provider(format!("FRED request for {series_id} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::provider(format!(
                "FRED request for {series_id} failed with status {}.",
                resp.status()
            )));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| AppError::provider(format!("Failed to parse FRED response for {series_id}: {e}")))?;

        parse_observations(series_id, body)
    }
}

impl SeriesSource for FredClient {
    fn provider(&self) -> &'static str {
        "fred"
    }

    fn fetch(&self, id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>, AppError> {
        self.fetch_series(id, start, end)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

fn parse_observations(series_id: &str, body: ObservationsResponse) -> Result<Vec<Observation>, AppError> {
    body.observations
        .into_iter()
        .map(|obs| {
            let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
                .map_err(|e| AppError::provider(format!("Invalid FRED date '{}' in {series_id}: {e}", obs.date)))?;
            Ok(Observation::new(date, parse_value(&obs.value)))
        })
        .collect()
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
