use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use common::FusedFrame;
use signal::{generate, SignalConfig};

fn ts(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(day)
}

fn frame_of(prices: &[f64]) -> FusedFrame {
    let rows: BTreeMap<_, _> = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| (ts(i as i64), vec![Some(p)]))
        .collect();
    FusedFrame::new(vec!["close".into()], rows)
}

proptest! {
    /// Position deltas telescope: over any contiguous index range the sum of
    /// `position` equals `signal[last] - signal[first]`.
    #[test]
    fn positions_telescope_to_signal_difference(
        prices in prop::collection::vec(1.0f64..10_000.0, 2..60),
        short in 1usize..10,
        long in 1usize..30,
    ) {
        let records = generate(&frame_of(&prices), &SignalConfig::new(short, long, "close"));
        prop_assert_eq!(records.len(), prices.len());

        for first in 0..records.len() {
            for last in first..records.len() {
                let delta: i8 = records[first + 1..=last].iter().map(|r| r.position).sum();
                prop_assert_eq!(
                    delta,
                    records[last].signal - records[first].signal,
                    "range {}..={}", first, last
                );
            }
        }
    }

    /// Signal stays in {0, 1}, position in {-1, 0, 1}, and the warm-up span
    /// never signals.
    #[test]
    fn signal_domain_and_warm_up(
        prices in prop::collection::vec(1.0f64..10_000.0, 1..60),
        short in 1usize..10,
        long in 1usize..30,
    ) {
        let records = generate(&frame_of(&prices), &SignalConfig::new(short, long, "close"));

        for (idx, record) in records.iter().enumerate() {
            prop_assert!(record.signal == 0 || record.signal == 1);
            prop_assert!((-1..=1).contains(&record.position));
            if idx < short {
                prop_assert_eq!(record.signal, 0);
            }
        }
        prop_assert_eq!(records[0].position, 0);
    }
}
