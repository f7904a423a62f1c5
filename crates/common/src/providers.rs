use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{FusedFrame, NamedSeries, Result};

/// One market-data source for a single instrument.
///
/// Implementations live in `crates/sources`. The fetch layer never lets a
/// provider error past this boundary: a failing source is logged and
/// replaced with an empty series so the run can continue on the rest.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Column name this provider contributes to the fused frame.
    fn name(&self) -> &str;

    /// Fetch the available price history for `symbol`, oldest first.
    async fn fetch(&self, symbol: &str) -> Result<NamedSeries>;
}

/// Search-interest source. Returns a frame with one column per keyword.
#[async_trait]
pub trait TrendProvider: Send + Sync {
    async fn fetch(&self, keywords: &[String], timeframe: &str, geo: &str)
        -> Result<FusedFrame>;
}

/// Opaque price predictor. How the model is fitted is the implementation's
/// business; the pipeline only sees one scalar per fused-frame timestamp.
///
/// A call may block on model inference. It is a single bounded call with no
/// internal retry; retry, if desired, belongs to the caller.
#[async_trait]
pub trait Forecaster: Send + Sync {
    async fn predict(
        &self,
        frame: &FusedFrame,
        price_column: &str,
    ) -> Result<BTreeMap<DateTime<Utc>, f64>>;
}
