use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use common::{Error, FusedFrame, Result, TrendProvider};

const BASE_URL: &str = "https://trends.google.com/trends/api";

/// Interest-over-time from the Google Trends widget API.
///
/// Two round-trips: `explore` issues a short-lived token for the TIMESERIES
/// widget, `widgetdata/multiline` returns the timeline for that token. Both
/// bodies carry Google's `)]}'` anti-JSON-hijacking prefix, stripped before
/// parsing.
pub struct GoogleTrendsClient {
    http: Client,
    hl: String,
    tz: i32,
}

impl Default for GoogleTrendsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTrendsClient {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
            hl: "en-US".to_string(),
            tz: 360,
        }
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::ProviderFetch(format!(
                "Google Trends HTTP {status}: {body}"
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl TrendProvider for GoogleTrendsClient {
    async fn fetch(
        &self,
        keywords: &[String],
        timeframe: &str,
        geo: &str,
    ) -> Result<FusedFrame> {
        let payload = json!({
            "comparisonItem": keywords
                .iter()
                .map(|kw| json!({"keyword": kw, "time": timeframe, "geo": geo}))
                .collect::<Vec<_>>(),
            "category": 0,
            "property": "",
        });

        debug!(?keywords, timeframe, geo, "Requesting Google Trends explore token");
        let explore_body = self
            .get_text(
                &format!("{BASE_URL}/explore"),
                &[
                    ("hl", self.hl.clone()),
                    ("tz", self.tz.to_string()),
                    ("req", payload.to_string()),
                ],
            )
            .await?;
        let widget = parse_explore(&explore_body)?;

        let timeline_body = self
            .get_text(
                &format!("{BASE_URL}/widgetdata/multiline"),
                &[
                    ("hl", self.hl.clone()),
                    ("tz", self.tz.to_string()),
                    ("req", widget.request.to_string()),
                    ("token", widget.token),
                ],
            )
            .await?;
        let frame = parse_multiline(&timeline_body, keywords)?;

        if frame.is_empty() {
            info!(?keywords, "No trending data found");
        } else {
            info!(?keywords, rows = frame.len(), "Fetched search interest");
        }
        Ok(frame)
    }
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    id: String,
    token: String,
    request: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: Timeline,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(rename = "timelineData")]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    time: String,
    value: Vec<f64>,
}

/// Both widget API responses prepend `)]}'` (plus a stray comma on some
/// endpoints) before the JSON document.
fn strip_prefix(body: &str) -> &str {
    match body.find('{') {
        Some(idx) => &body[idx..],
        None => body,
    }
}

fn parse_explore(body: &str) -> Result<Widget> {
    let resp: ExploreResponse = serde_json::from_str(strip_prefix(body))?;
    resp.widgets
        .into_iter()
        .find(|w| w.id == "TIMESERIES")
        .ok_or_else(|| Error::ProviderFetch("Google Trends: no TIMESERIES widget".into()))
}

fn parse_multiline(body: &str, keywords: &[String]) -> Result<FusedFrame> {
    let resp: MultilineResponse = serde_json::from_str(strip_prefix(body))?;

    if resp.default.timeline_data.is_empty() {
        return Ok(FusedFrame::empty());
    }

    let mut rows: BTreeMap<DateTime<Utc>, Vec<Option<f64>>> = BTreeMap::new();
    for point in resp.default.timeline_data {
        let secs: i64 = point.time.parse().map_err(|e| {
            Error::ProviderFetch(format!("Google Trends bad timestamp '{}': {e}", point.time))
        })?;
        let timestamp = Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| Error::ProviderFetch(format!("Google Trends timestamp out of range: {secs}")))?;
        // One value per keyword, in request order.
        let values = (0..keywords.len())
            .map(|i| point.value.get(i).copied())
            .collect();
        rows.insert(timestamp, values);
    }

    Ok(FusedFrame::new(keywords.to_vec(), rows))
}
