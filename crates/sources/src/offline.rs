use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use common::{
    Error, Forecaster, FusedFrame, NamedSeries, PriceProvider, Result, TrendProvider,
};

/// In-memory price source for offline runs and tests. No network, never
/// fails, always returns the same series.
pub struct OfflinePriceSource {
    series: NamedSeries,
}

impl OfflinePriceSource {
    pub fn new(series: NamedSeries) -> Self {
        Self { series }
    }
}

#[async_trait]
impl PriceProvider for OfflinePriceSource {
    fn name(&self) -> &str {
        self.series.name()
    }

    async fn fetch(&self, _symbol: &str) -> Result<NamedSeries> {
        Ok(self.series.clone())
    }
}

/// In-memory search-interest source. The frame is returned as-is, whatever
/// keywords and timeframe were asked for.
pub struct OfflineTrendSource {
    frame: FusedFrame,
}

impl OfflineTrendSource {
    pub fn new(frame: FusedFrame) -> Self {
        Self { frame }
    }
}

#[async_trait]
impl TrendProvider for OfflineTrendSource {
    async fn fetch(
        &self,
        _keywords: &[String],
        _timeframe: &str,
        _geo: &str,
    ) -> Result<FusedFrame> {
        Ok(self.frame.clone())
    }
}

/// Canned per-timestamp predictions standing in for a fitted model.
pub struct OfflineForecast {
    predictions: BTreeMap<DateTime<Utc>, f64>,
}

impl OfflineForecast {
    pub fn new(predictions: BTreeMap<DateTime<Utc>, f64>) -> Self {
        Self { predictions }
    }
}

#[async_trait]
impl Forecaster for OfflineForecast {
    async fn predict(
        &self,
        _frame: &FusedFrame,
        _price_column: &str,
    ) -> Result<BTreeMap<DateTime<Utc>, f64>> {
        Ok(self.predictions.clone())
    }
}

/// A source that always fails, for exercising partial-failure handling.
pub struct FailingSource {
    name: String,
}

impl FailingSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl PriceProvider for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, symbol: &str) -> Result<NamedSeries> {
        Err(Error::ProviderFetch(format!(
            "source '{}' unavailable for {symbol}",
            self.name
        )))
    }
}
