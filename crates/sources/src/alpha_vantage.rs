use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Error, NamedSeries, PriceProvider, Result};

const BASE_URL: &str = "https://www.alphavantage.co";

/// Daily close prices from the Alpha Vantage `TIME_SERIES_DAILY` endpoint.
pub struct AlphaVantageClient {
    api_key: String,
    http: Client,
}

impl AlphaVantageClient {
    pub const COLUMN: &'static str = "alpha_close";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl PriceProvider for AlphaVantageClient {
    fn name(&self) -> &str {
        Self::COLUMN
    }

    async fn fetch(&self, symbol: &str) -> Result<NamedSeries> {
        debug!(symbol, "Requesting Alpha Vantage daily series");
        let resp = self
            .http
            .get(format!("{BASE_URL}/query"))
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "full"),
                ("apikey", &self.api_key),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::ProviderFetch(format!(
                "Alpha Vantage HTTP {status}: {body}"
            )));
        }

        let observations = parse_daily(&body)?;
        Ok(NamedSeries::from_observations(Self::COLUMN, observations))
    }
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<HashMap<String, DailyBar>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

/// Alpha Vantage reports errors and rate limits inside a 200 body, so both
/// are checked before the series itself.
fn parse_daily(body: &str) -> Result<Vec<(DateTime<Utc>, f64)>> {
    let resp: DailyResponse = serde_json::from_str(body)?;

    if let Some(message) = resp.error_message {
        return Err(Error::ProviderFetch(format!("Alpha Vantage: {message}")));
    }
    if let Some(note) = resp.note {
        return Err(Error::ProviderFetch(format!(
            "Alpha Vantage rate limited: {note}"
        )));
    }

    let series = resp
        .series
        .ok_or_else(|| Error::ProviderFetch("Alpha Vantage: no daily series in response".into()))?;

    let mut observations = Vec::with_capacity(series.len());
    for (date, bar) in series {
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| Error::ProviderFetch(format!("Alpha Vantage bad date '{date}': {e}")))?;
        let close: f64 = bar.close.parse().map_err(|e| {
            Error::ProviderFetch(format!("Alpha Vantage bad close '{}': {e}", bar.close))
        })?;
        let timestamp = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        observations.push((timestamp, close));
    }
    Ok(observations)
}
