use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{FusedFrame, SignalRecord};

/// Moving-average crossover parameters. The price column is explicit
/// configuration; the engine never assumes a column name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Short rolling window length in rows.
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    /// Long rolling window length in rows. Conventionally short < long.
    #[serde(default = "default_long_window")]
    pub long_window: usize,
    /// Fused-frame column the averages are computed on.
    pub price_column: String,
}

fn default_short_window() -> usize {
    40
}

fn default_long_window() -> usize {
    100
}

impl SignalConfig {
    pub fn new(short_window: usize, long_window: usize, price_column: impl Into<String>) -> Self {
        assert!(short_window >= 1, "short window must be positive");
        assert!(long_window >= 1, "long window must be positive");
        Self {
            short_window,
            long_window,
            price_column: price_column.into(),
        }
    }
}

/// Compute crossover signals over the configured price column.
///
/// The trailing mean at row `t` averages however many of the last `window`
/// points exist (minimum one). Early rows are therefore noisier than
/// steady-state; the warm-up rule below accounts for that.
///
/// `signal` is 1 when the short average is above the long average, but is
/// forced to 0 for every row below `short_window` regardless of the
/// averages. `position` is the first difference of `signal`, 0 at row 0.
///
/// A frame without the configured column (or an entirely absent column)
/// produces no records. Pure function: same inputs, same output.
pub fn generate(frame: &FusedFrame, config: &SignalConfig) -> Vec<SignalRecord> {
    let timestamps: Vec<_> = frame.timestamps().collect();
    let prices: Vec<f64> = match frame
        .column_values(&config.price_column)
        .into_iter()
        .collect::<Option<Vec<f64>>>()
    {
        Some(prices) if !prices.is_empty() => prices,
        _ => {
            debug!(column = %config.price_column, "No price data for signal generation");
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(prices.len());
    let mut previous_signal: i8 = 0;

    for (idx, &timestamp) in timestamps.iter().enumerate() {
        let short_mavg = trailing_mean(&prices, idx, config.short_window);
        let long_mavg = trailing_mean(&prices, idx, config.long_window);

        // Warm-up: rows below `short_window` never signal.
        let signal: i8 = if idx >= config.short_window && short_mavg > long_mavg {
            1
        } else {
            0
        };
        let position = if idx == 0 { 0 } else { signal - previous_signal };
        previous_signal = signal;

        records.push(SignalRecord {
            timestamp,
            short_mavg,
            long_mavg,
            signal,
            position,
        });
    }

    records
}

/// Mean of the trailing `window` points ending at `end`, or of however many
/// exist when the series is still shorter than the window.
fn trailing_mean(prices: &[f64], end: usize, window: usize) -> f64 {
    let start = (end + 1).saturating_sub(window);
    let slice = &prices[start..=end];
    slice.iter().sum::<f64>() / slice.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use common::NamedSeries;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn frame_of(prices: &[f64]) -> FusedFrame {
        let series = NamedSeries::from_observations(
            "close",
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| (ts(i as u32 + 1), p)),
        );
        fusion_like(&[series])
    }

    // Minimal stand-in for the fusion crate (not a dev-dependency here):
    // single full column, no gaps to fill.
    fn fusion_like(series: &[NamedSeries]) -> FusedFrame {
        let columns = vec![series[0].name().to_string()];
        let rows = series[0].iter().map(|(t, v)| (t, vec![Some(v)])).collect();
        FusedFrame::new(columns, rows)
    }

    #[test]
    fn trailing_mean_uses_available_points_near_start() {
        let prices = [100.0, 104.0, 102.0];
        assert_eq!(trailing_mean(&prices, 0, 3), 100.0);
        assert_eq!(trailing_mean(&prices, 1, 3), 102.0);
        assert_eq!(trailing_mean(&prices, 2, 3), 102.0);
    }

    #[test]
    fn warm_up_forces_signal_to_zero() {
        // With a falling series and long_window = 1 the short average sits
        // above the long average from row 1 onward, yet rows 0 and 1 are
        // inside the warm-up span for short_window = 2 and stay at 0.
        let frame = frame_of(&[120.0, 100.0, 80.0, 60.0]);
        let records = generate(&frame, &SignalConfig::new(2, 1, "close"));

        assert!(records[1].short_mavg > records[1].long_mavg);
        assert_eq!(records[0].signal, 0);
        assert_eq!(records[1].signal, 0);
        assert_eq!(records[2].signal, 1);
        assert_eq!(records[3].signal, 1);
    }

    #[test]
    fn position_is_first_difference_of_signal() {
        let frame = frame_of(&[100.0, 105.0, 102.0, 108.0, 107.0]);
        let records = generate(&frame, &SignalConfig::new(1, 2, "close"));

        let signals: Vec<i8> = records.iter().map(|r| r.signal).collect();
        let positions: Vec<i8> = records.iter().map(|r| r.position).collect();
        assert_eq!(signals, vec![0, 1, 0, 1, 0]);
        assert_eq!(positions, vec![0, 1, -1, 1, -1]);
    }

    #[test]
    fn identical_inputs_produce_identical_outputs() {
        let frame = frame_of(&[100.0, 105.0, 102.0, 108.0, 107.0]);
        let config = SignalConfig::new(2, 4, "close");
        assert_eq!(generate(&frame, &config), generate(&frame, &config));
    }

    #[test]
    fn missing_column_produces_no_records() {
        let frame = frame_of(&[100.0, 105.0]);
        let records = generate(&frame, &SignalConfig::new(1, 2, "volume"));
        assert!(records.is_empty());
    }

    #[test]
    fn empty_frame_produces_no_records() {
        let records = generate(&FusedFrame::empty(), &SignalConfig::new(1, 2, "close"));
        assert!(records.is_empty());
    }
}
