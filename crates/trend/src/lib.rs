use chrono::Duration;
use tracing::{debug, info};

use common::{AlignedPoint, CorrelationResult, Error, FusedFrame, Result};

/// Alignment parameters for the correlator.
#[derive(Debug, Clone)]
pub struct CorrelatorConfig {
    /// Keyword column expected in the trend frame.
    pub keyword: String,
    /// Fixed resampling interval for the common grid.
    pub grid_interval: Duration,
}

impl CorrelatorConfig {
    pub fn new(keyword: impl Into<String>, grid_interval: Duration) -> Self {
        assert!(
            grid_interval > Duration::zero(),
            "grid interval must be positive"
        );
        Self {
            keyword: keyword.into(),
            grid_interval,
        }
    }
}

/// Correlate search interest with the average price over the window where
/// both frames have data.
///
/// Both inputs may be sampled at different cadences; they are resampled onto
/// a fixed-interval grid over the overlap window using last-known-value
/// carry-forward (no interpolation). The price side of each grid point is
/// the mean across all price columns with data. The coefficient is Pearson's
/// r over the aligned pairs.
///
/// Degenerate inputs degrade rather than fail: an empty frame on either
/// side, or an empty/inverted overlap window, yields an undefined result
/// with no aligned series; fewer than two aligned points or zero variance
/// yields an undefined coefficient with the aligned series still attached.
/// The only error is a trend frame that lacks the configured keyword column.
pub fn correlate(
    trends: &FusedFrame,
    prices: &FusedFrame,
    config: &CorrelatorConfig,
) -> Result<CorrelationResult> {
    if trends.is_empty() || prices.is_empty() {
        debug!("No trend or price data available for correlation");
        return Ok(CorrelationResult::undefined());
    }

    if trends.column_index(&config.keyword).is_none() {
        return Err(Error::MissingColumn(config.keyword.clone()));
    }

    // Overlap window: both series must have data in range. first/last exist
    // because both frames are non-empty.
    let start = trends
        .first_timestamp()
        .unwrap()
        .max(prices.first_timestamp().unwrap());
    let end = trends
        .last_timestamp()
        .unwrap()
        .min(prices.last_timestamp().unwrap());
    if start > end {
        debug!("Trend and price series do not overlap in time");
        return Ok(CorrelationResult::undefined());
    }

    let mut aligned = Vec::new();
    let mut at = start;
    while at <= end {
        // A grid point is dropped when either side has nothing to carry
        // forward yet (keyword column empty, or no price column observed).
        if let (Some(interest), Some(avg_price)) = (
            trends.last_value_at(at, &config.keyword),
            prices.last_row_mean_at(at),
        ) {
            aligned.push(AlignedPoint {
                timestamp: at,
                interest,
                avg_price,
            });
        }
        at = at + config.grid_interval;
    }

    let xs: Vec<f64> = aligned.iter().map(|p| p.interest).collect();
    let ys: Vec<f64> = aligned.iter().map(|p| p.avg_price).collect();
    let coefficient = pearson(&xs, &ys);

    match coefficient {
        Some(r) => info!(
            keyword = %config.keyword,
            points = aligned.len(),
            correlation = r,
            "Correlated search interest with price"
        ),
        None => debug!(
            keyword = %config.keyword,
            points = aligned.len(),
            "Correlation undefined for aligned series"
        ),
    }

    Ok(CorrelationResult {
        coefficient,
        aligned,
    })
}

/// Pearson correlation coefficient. `None` for fewer than two points or
/// when either side has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x: f64 = x.iter().sum::<f64>() / n;
    let mean_y: f64 = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}
