use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use common::{Forecaster, FusedFrame, Result};

/// Ordinary least-squares trend forecaster.
///
/// Fits `price = intercept + slope * row_index` over the reference column
/// and reports the fitted value at every fused-frame timestamp. The fit
/// happens inside `predict`: each run trains on that run's frame, and the
/// model never outlives the call.
///
/// Degenerate frames (empty, reference column absent, or a single row, where
/// the slope is undetermined) produce an empty prediction map, not an error.
#[derive(Debug, Clone, Default)]
pub struct LeastSquaresForecaster;

impl LeastSquaresForecaster {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Forecaster for LeastSquaresForecaster {
    async fn predict(
        &self,
        frame: &FusedFrame,
        price_column: &str,
    ) -> Result<BTreeMap<DateTime<Utc>, f64>> {
        let prices: Vec<f64> = match frame
            .column_values(price_column)
            .into_iter()
            .collect::<Option<Vec<f64>>>()
        {
            Some(prices) if prices.len() >= 2 => prices,
            _ => {
                debug!(column = %price_column, "Not enough data to fit forecaster");
                return Ok(BTreeMap::new());
            }
        };

        let (slope, intercept) = fit_line(&prices);
        debug!(slope, intercept, points = prices.len(), "Fitted price trend line");

        Ok(frame
            .timestamps()
            .enumerate()
            .map(|(idx, ts)| (ts, intercept + slope * idx as f64))
            .collect())
    }
}

/// Closed-form univariate OLS over `(index, value)` pairs.
/// Caller guarantees at least two points, so the index variance is nonzero.
fn fit_line(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y: f64 = values.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        cov += dx * (y - mean_y);
        var_x += dx * dx;
    }

    let slope = cov / var_x;
    (slope, mean_y - slope * mean_x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn frame_of(prices: &[f64]) -> FusedFrame {
        let rows: BTreeMap<_, _> = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| (ts(i as u32 + 1), vec![Some(p)]))
            .collect();
        FusedFrame::new(vec!["close".into()], rows)
    }

    #[tokio::test]
    async fn reproduces_exactly_linear_data() {
        let frame = frame_of(&[100.0, 102.0, 104.0, 106.0]);
        let predictions = LeastSquaresForecaster::new()
            .predict(&frame, "close")
            .await
            .unwrap();

        assert_eq!(predictions.len(), 4);
        for (i, (_, predicted)) in predictions.iter().enumerate() {
            let expected = 100.0 + 2.0 * i as f64;
            assert!(
                (predicted - expected).abs() < 1e-9,
                "row {i}: expected {expected}, got {predicted}"
            );
        }
    }

    #[tokio::test]
    async fn noisy_data_fits_the_underlying_trend() {
        let frame = frame_of(&[100.0, 103.0, 101.0, 105.0, 104.0, 108.0]);
        let predictions = LeastSquaresForecaster::new()
            .predict(&frame, "close")
            .await
            .unwrap();

        let values: Vec<f64> = predictions.values().copied().collect();
        assert!(values.windows(2).all(|w| w[1] > w[0]), "trend should rise");
    }

    #[tokio::test]
    async fn empty_frame_predicts_nothing() {
        let predictions = LeastSquaresForecaster::new()
            .predict(&FusedFrame::empty(), "close")
            .await
            .unwrap();
        assert!(predictions.is_empty());
    }

    #[tokio::test]
    async fn single_row_predicts_nothing() {
        let predictions = LeastSquaresForecaster::new()
            .predict(&frame_of(&[100.0]), "close")
            .await
            .unwrap();
        assert!(predictions.is_empty());
    }

    #[tokio::test]
    async fn missing_column_predicts_nothing() {
        let predictions = LeastSquaresForecaster::new()
            .predict(&frame_of(&[100.0, 101.0]), "volume")
            .await
            .unwrap();
        assert!(predictions.is_empty());
    }
}
