use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use common::{FusedFrame, NamedSeries};

/// Outer-join the input series into one frame over the union of their
/// timestamps, then fill gaps per column: forward-fill from the most recent
/// preceding observation, then back-fill remaining leading gaps from the
/// nearest following one.
///
/// A column with zero observations stays entirely absent: no fabricated
/// values. All-empty input yields an empty frame; that is not an error.
pub fn fuse(series: &[NamedSeries]) -> FusedFrame {
    let timestamps: BTreeSet<DateTime<Utc>> = series
        .iter()
        .flat_map(|s| s.iter().map(|(ts, _)| ts))
        .collect();

    if timestamps.is_empty() {
        return FusedFrame::empty();
    }

    let columns: Vec<String> = series.iter().map(|s| s.name().to_string()).collect();
    let ordered: Vec<DateTime<Utc>> = timestamps.into_iter().collect();

    // Raw outer join: one cell per (timestamp, column), observed values only.
    let mut grid: Vec<Vec<Option<f64>>> = ordered
        .iter()
        .map(|ts| series.iter().map(|s| s.get(*ts)).collect())
        .collect();

    for col in 0..columns.len() {
        forward_fill(&mut grid, col);
        back_fill(&mut grid, col);
    }

    debug!(
        rows = ordered.len(),
        columns = columns.len(),
        "Fused source series"
    );

    let rows: BTreeMap<DateTime<Utc>, Vec<Option<f64>>> =
        ordered.into_iter().zip(grid).collect();
    FusedFrame::new(columns, rows)
}

/// Carry the most recent preceding observation into each absent cell.
fn forward_fill(grid: &mut [Vec<Option<f64>>], col: usize) {
    let mut last = None;
    for row in grid.iter_mut() {
        match row[col] {
            Some(v) => last = Some(v),
            None => row[col] = last,
        }
    }
}

/// Fill leading gaps left by the forward pass from the nearest following
/// observation. After both passes a column is `None` everywhere only if it
/// had no observations at all.
fn back_fill(grid: &mut [Vec<Option<f64>>], col: usize) {
    let mut next = None;
    for row in grid.iter_mut().rev() {
        match row[col] {
            Some(v) => next = Some(v),
            None => row[col] = next,
        }
    }
}
