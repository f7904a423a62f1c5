use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Error, NamedSeries, PriceProvider, Result};

const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Five years of daily closes from the Yahoo Finance v8 chart API.
/// No API key required.
pub struct YahooFinanceClient {
    http: Client,
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooFinanceClient {
    pub const COLUMN: &'static str = "yf_close";

    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl PriceProvider for YahooFinanceClient {
    fn name(&self) -> &str {
        Self::COLUMN
    }

    async fn fetch(&self, symbol: &str) -> Result<NamedSeries> {
        debug!(symbol, "Requesting Yahoo Finance chart");
        let url = format!("{BASE_URL}/v8/finance/chart/{symbol}");
        let resp = self
            .http
            .get(&url)
            .query(&[("range", "5y"), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::ProviderFetch(format!("Yahoo HTTP {status}: {body}")));
        }

        let observations = parse_chart(&body)?;
        Ok(NamedSeries::from_observations(Self::COLUMN, observations))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Vec<Option<f64>>,
}

/// Null closes (halted sessions) are skipped; the fill stage downstream
/// covers the gaps they leave.
fn parse_chart(body: &str) -> Result<Vec<(DateTime<Utc>, f64)>> {
    let resp: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = resp.chart.error {
        return Err(Error::ProviderFetch(format!("Yahoo: {error}")));
    }
    let result = resp
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| Error::ProviderFetch("Yahoo: empty chart result".into()))?;
    let timestamps = result
        .timestamp
        .ok_or_else(|| Error::ProviderFetch("Yahoo: chart result has no timestamps".into()))?;
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| Error::ProviderFetch("Yahoo: chart result has no quote block".into()))?;

    let observations = timestamps
        .into_iter()
        .zip(quote.close)
        .filter_map(|(secs, close)| {
            let close = close?;
            let timestamp = Utc.timestamp_opt(secs, 0).single()?;
            Some((timestamp, close))
        })
        .collect();
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chart_and_skips_null_closes() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704153600, 1704240000, 1704326400],
                    "indicators": {"quote": [{"close": [185.64, null, 184.25]}]}
                }],
                "error": null
            }
        }"#;
        let observations = parse_chart(body).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].1, 185.64);
        assert_eq!(observations[1].1, 184.25);
    }

    #[test]
    fn chart_error_is_a_fetch_error() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        assert!(matches!(parse_chart(body), Err(Error::ProviderFetch(_))));
    }
}
