use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use common::{Action, Decision, SignalRecord};

/// Correlation must exceed this for a crossover buy to be confirmed.
pub const BUY_CORRELATION_THRESHOLD: f64 = 0.5;
/// Correlation below this confirms a crossover sell on its own.
pub const SELL_CORRELATION_THRESHOLD: f64 = -0.5;

/// Fuse crossover signals, the correlation score, and per-timestamp
/// forecasts into ordered decisions.
///
/// An upward crossover (`position > 0`) becomes a BUY only when the
/// correlation is above [`BUY_CORRELATION_THRESHOLD`] **and** the forecast
/// exceeds the short average. A downward crossover becomes a SELL when the
/// correlation is below [`SELL_CORRELATION_THRESHOLD`] **or** the forecast
/// is below the long average. Each reason string names a condition that
/// held.
///
/// An undefined correlation, or a timestamp with no forecast, makes the
/// corresponding condition false; alignment gaps never fail the run.
/// Timestamps with no actionable decision produce no record at all.
pub fn decide(
    signals: &[SignalRecord],
    correlation: Option<f64>,
    forecasts: &BTreeMap<DateTime<Utc>, f64>,
) -> Vec<Decision> {
    let mut decisions = Vec::new();

    for record in signals {
        let forecast = forecasts.get(&record.timestamp).copied();

        let decision = if record.position > 0 {
            evaluate_buy(record, correlation, forecast)
        } else if record.position < 0 {
            evaluate_sell(record, correlation, forecast)
        } else {
            None
        };

        if let Some(decision) = decision {
            info!(
                action = %decision.action,
                timestamp = %decision.timestamp,
                reasons = ?decision.reasons,
                "Decision made"
            );
            decisions.push(decision);
        }
    }

    decisions
}

/// Upward crossover: both confirmations must hold.
fn evaluate_buy(
    record: &SignalRecord,
    correlation: Option<f64>,
    forecast: Option<f64>,
) -> Option<Decision> {
    let correlation = correlation.filter(|c| *c > BUY_CORRELATION_THRESHOLD)?;
    let forecast = forecast.filter(|f| *f > record.short_mavg)?;

    Some(Decision {
        timestamp: record.timestamp,
        action: Action::Buy,
        reasons: vec![
            format!("trend correlation {correlation:.2} above {BUY_CORRELATION_THRESHOLD}"),
            format!(
                "forecast {forecast:.2} above short average {:.2}",
                record.short_mavg
            ),
        ],
    })
}

/// Downward crossover: either confirmation suffices.
fn evaluate_sell(
    record: &SignalRecord,
    correlation: Option<f64>,
    forecast: Option<f64>,
) -> Option<Decision> {
    let mut reasons = Vec::new();

    if let Some(c) = correlation.filter(|c| *c < SELL_CORRELATION_THRESHOLD) {
        reasons.push(format!(
            "trend correlation {c:.2} below {SELL_CORRELATION_THRESHOLD}"
        ));
    }
    if let Some(f) = forecast.filter(|f| *f < record.long_mavg) {
        reasons.push(format!(
            "forecast {f:.2} below long average {:.2}",
            record.long_mavg
        ));
    }

    if reasons.is_empty() {
        return None;
    }
    Some(Decision {
        timestamp: record.timestamp,
        action: Action::Sell,
        reasons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn record(day: u32, position: i8, short: f64, long: f64) -> SignalRecord {
        SignalRecord {
            timestamp: ts(day),
            short_mavg: short,
            long_mavg: long,
            signal: if position >= 0 { position } else { 0 },
            position,
        }
    }

    fn forecasts(entries: &[(u32, f64)]) -> BTreeMap<DateTime<Utc>, f64> {
        entries.iter().map(|&(d, f)| (ts(d), f)).collect()
    }

    #[test]
    fn upward_crossover_buys_when_both_conditions_hold() {
        let signals = vec![record(1, 1, 105.0, 100.0)];
        let decisions = decide(&signals, Some(0.6), &forecasts(&[(1, 110.0)]));

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].action, Action::Buy);
        assert_eq!(decisions[0].timestamp, ts(1));
        assert_eq!(decisions[0].reasons.len(), 2);
    }

    #[test]
    fn weak_correlation_blocks_the_buy() {
        let signals = vec![record(1, 1, 105.0, 100.0)];
        let decisions = decide(&signals, Some(0.2), &forecasts(&[(1, 110.0)]));
        assert!(decisions.is_empty());
    }

    #[test]
    fn low_forecast_blocks_the_buy() {
        let signals = vec![record(1, 1, 105.0, 100.0)];
        let decisions = decide(&signals, Some(0.8), &forecasts(&[(1, 104.0)]));
        assert!(decisions.is_empty());
    }

    #[test]
    fn downward_crossover_sells_on_correlation_alone() {
        // Forecast at or above the long average: the second disjunct fails,
        // the correlation disjunct still confirms the sell.
        let signals = vec![record(2, -1, 101.0, 103.0)];
        let decisions = decide(&signals, Some(-0.6), &forecasts(&[(2, 103.0)]));

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].action, Action::Sell);
        assert_eq!(decisions[0].reasons.len(), 1);
        assert!(decisions[0].reasons[0].contains("correlation"));
    }

    #[test]
    fn downward_crossover_sells_on_forecast_alone() {
        let signals = vec![record(2, -1, 101.0, 103.0)];
        let decisions = decide(&signals, Some(0.0), &forecasts(&[(2, 99.0)]));

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].action, Action::Sell);
        assert!(decisions[0].reasons[0].contains("forecast"));
    }

    #[test]
    fn hold_rows_emit_nothing() {
        let signals = vec![record(1, 0, 100.0, 100.0)];
        let decisions = decide(&signals, Some(0.9), &forecasts(&[(1, 200.0)]));
        assert!(decisions.is_empty());
    }

    #[test]
    fn missing_forecast_is_condition_not_met() {
        // Buy needs the forecast; its absence blocks the conjunction.
        let buy = vec![record(1, 1, 105.0, 100.0)];
        assert!(decide(&buy, Some(0.9), &BTreeMap::new()).is_empty());

        // Sell is a disjunction; the correlation side can still confirm.
        let sell = vec![record(1, -1, 101.0, 103.0)];
        let decisions = decide(&sell, Some(-0.9), &BTreeMap::new());
        assert_eq!(decisions.len(), 1);
    }

    #[test]
    fn undefined_correlation_is_condition_not_met() {
        let buy = vec![record(1, 1, 105.0, 100.0)];
        assert!(decide(&buy, None, &forecasts(&[(1, 110.0)])).is_empty());

        let sell = vec![record(1, -1, 101.0, 103.0)];
        let decisions = decide(&sell, None, &forecasts(&[(1, 99.0)]));
        assert_eq!(decisions.len(), 1, "forecast disjunct should still fire");
    }

    #[test]
    fn decisions_come_out_in_timestamp_order() {
        let signals = vec![
            record(1, 1, 105.0, 100.0),
            record(2, -1, 101.0, 103.0),
            record(3, 1, 106.0, 101.0),
        ];
        let decisions = decide(
            &signals,
            Some(0.6),
            &forecasts(&[(1, 110.0), (2, 99.0), (3, 110.0)]),
        );

        let days: Vec<_> = decisions.iter().map(|d| d.timestamp).collect();
        assert_eq!(days, vec![ts(1), ts(2), ts(3)]);
        assert_eq!(decisions[0].action, Action::Buy);
        assert_eq!(decisions[1].action, Action::Sell);
        assert_eq!(decisions[2].action, Action::Buy);
    }
}
