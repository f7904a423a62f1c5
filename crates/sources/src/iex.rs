use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Error, NamedSeries, PriceProvider, Result};

const BASE_URL: &str = "https://cloud.iexapis.com/stable";

/// One year of daily closes from the IEX Cloud chart endpoint.
pub struct IexCloudClient {
    token: String,
    http: Client,
}

impl IexCloudClient {
    pub const COLUMN: &'static str = "iex_close";

    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl PriceProvider for IexCloudClient {
    fn name(&self) -> &str {
        Self::COLUMN
    }

    async fn fetch(&self, symbol: &str) -> Result<NamedSeries> {
        debug!(symbol, "Requesting IEX Cloud 1y chart");
        let url = format!("{BASE_URL}/stock/{symbol}/chart/1y");
        let resp = self
            .http
            .get(&url)
            .query(&[("token", &self.token)])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::ProviderFetch(format!("IEX Cloud HTTP {status}: {body}")));
        }

        let observations = parse_chart(&body)?;
        Ok(NamedSeries::from_observations(Self::COLUMN, observations))
    }
}

#[derive(Debug, Deserialize)]
struct ChartBar {
    date: Option<String>,
    #[serde(rename = "priceDate")]
    price_date: Option<String>,
    close: Option<f64>,
}

/// The chart payload names its date column `date` or `priceDate` depending
/// on endpoint version; bars without a recognizable date or close are
/// rejected rather than silently skipped.
fn parse_chart(body: &str) -> Result<Vec<(DateTime<Utc>, f64)>> {
    let bars: Vec<ChartBar> = serde_json::from_str(body)?;

    let mut observations = Vec::with_capacity(bars.len());
    for bar in bars {
        let date = bar
            .date
            .or(bar.price_date)
            .ok_or_else(|| Error::ProviderFetch("IEX Cloud: no recognizable date column".into()))?;
        let close = bar
            .close
            .ok_or_else(|| Error::ProviderFetch(format!("IEX Cloud: no close for {date}")))?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| Error::ProviderFetch(format!("IEX Cloud bad date '{date}': {e}")))?;
        observations.push((date.and_hms_opt(0, 0, 0).unwrap().and_utc(), close));
    }
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chart_with_date_column() {
        let body = r#"[
            {"date": "2024-01-02", "close": 185.64},
            {"date": "2024-01-03", "close": 184.25}
        ]"#;
        let observations = parse_chart(body).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].1, 185.64);
    }

    #[test]
    fn falls_back_to_price_date_column() {
        let body = r#"[{"priceDate": "2024-01-02", "close": 185.64}]"#;
        let observations = parse_chart(body).unwrap();
        assert_eq!(observations.len(), 1);
    }

    #[test]
    fn missing_date_column_is_a_fetch_error() {
        let body = r#"[{"close": 185.64}]"#;
        assert!(matches!(parse_chart(body), Err(Error::ProviderFetch(_))));
    }
}
