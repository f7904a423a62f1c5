use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One source's price (or search-interest) history: an ordered mapping from
/// timestamp to value, tagged with the column name it contributes downstream.
///
/// Backed by a `BTreeMap`, so timestamps are strictly increasing with no
/// duplicates by construction. Duplicate timestamps in the raw input are
/// resolved in [`NamedSeries::from_observations`]: the latest observation wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedSeries {
    name: String,
    points: BTreeMap<DateTime<Utc>, f64>,
}

impl NamedSeries {
    /// An empty series. This is what a failed provider fetch degrades to.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: BTreeMap::new(),
        }
    }

    /// Build a series from raw observations in arrival order.
    /// Later observations overwrite earlier ones at the same timestamp.
    pub fn from_observations(
        name: impl Into<String>,
        observations: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    ) -> Self {
        Self {
            name: name.into(),
            points: observations.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, timestamp: DateTime<Utc>) -> Option<f64> {
        self.points.get(&timestamp).copied()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.keys().next_back().copied()
    }

    /// Iterate observations in ascending timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.points.iter().map(|(ts, v)| (*ts, *v))
    }
}

/// The outer-joined view over all input series: one row per timestamp in the
/// union of all inputs, one column per source.
///
/// After fill, a cell is `None` only when its entire column had zero
/// observations anywhere in range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusedFrame {
    columns: Vec<String>,
    rows: BTreeMap<DateTime<Utc>, Vec<Option<f64>>>,
}

impl FusedFrame {
    pub fn new(columns: Vec<String>, rows: BTreeMap<DateTime<Utc>, Vec<Option<f64>>>) -> Self {
        debug_assert!(rows.values().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.rows.keys().copied()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.rows.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.rows.keys().next_back().copied()
    }

    /// Cell value at an exact timestamp.
    pub fn value(&self, timestamp: DateTime<Utc>, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(&timestamp).and_then(|row| row[idx])
    }

    /// Last observed value in `column` at or before `timestamp`
    /// (last-known-value carry-forward used when resampling onto a grid).
    pub fn last_value_at(&self, timestamp: DateTime<Utc>, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows
            .range(..=timestamp)
            .rev()
            .find_map(|(_, row)| row[idx])
    }

    /// Mean across all columns with a carried-forward value at or before
    /// `timestamp`. `None` when no column has any observation yet.
    pub fn last_row_mean_at(&self, timestamp: DateTime<Utc>) -> Option<f64> {
        let values: Vec<f64> = self
            .columns
            .iter()
            .filter_map(|c| self.last_value_at(timestamp, c))
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Ordered values of one column, `None` where the column is absent.
    pub fn column_values(&self, column: &str) -> Vec<Option<f64>> {
        match self.column_index(column) {
            Some(idx) => self.rows.values().map(|row| row[idx]).collect(),
            None => Vec::new(),
        }
    }
}

/// Per-timestamp output of the signal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: DateTime<Utc>,
    pub short_mavg: f64,
    pub long_mavg: f64,
    /// 1 while the short average is above the long average, else 0.
    /// Forced to 0 during the warm-up span (indices below `short_window`).
    pub signal: i8,
    /// `signal[t] - signal[t-1]`: +1 upward crossover, -1 downward, 0 hold.
    pub position: i8,
}

/// A grid point of the aligned interest/price series used for correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPoint {
    pub timestamp: DateTime<Utc>,
    pub interest: f64,
    pub avg_price: f64,
}

/// Pearson correlation between search interest and average price over the
/// overlap window. `coefficient` is `None` when the inputs are degenerate
/// (no overlap, fewer than two aligned points, or zero variance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub coefficient: Option<f64>,
    pub aligned: Vec<AlignedPoint>,
}

impl CorrelationResult {
    /// The degenerate result: no coefficient, no aligned series.
    pub fn undefined() -> Self {
        Self {
            coefficient: None,
            aligned: Vec::new(),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.coefficient.is_some()
    }
}

/// Direction of an emitted decision. A hold is the absence of a decision,
/// not a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

/// A single actionable recommendation. The terminal artifact of a run;
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub reasons: Vec<String>,
}

/// What happened to one price source during the fetch stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourceOutcome {
    Fetched { observations: usize },
    Failed { error: String },
}

impl std::fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceOutcome::Fetched { observations } => {
                write!(f, "{observations} observations")
            }
            SourceOutcome::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Per-source diagnostic returned alongside the fused frame, so callers can
/// see which sources contributed without consulting log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source: String,
    pub outcome: SourceOutcome,
}
