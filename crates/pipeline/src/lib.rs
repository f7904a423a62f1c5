pub mod config;

pub use config::{AnalysisConfig, TrendSection};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use common::{
    CorrelationResult, Decision, Error, Forecaster, FusedFrame, PriceProvider, Result,
    SourceStatus, TrendProvider,
};
use trend::CorrelatorConfig;

/// Everything one run produced. `decisions` is the primary artifact; the
/// correlation result and per-source statuses ride along so callers can see
/// what the decisions were based on without consulting log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub symbol: String,
    pub decisions: Vec<Decision>,
    pub correlation: CorrelationResult,
    pub sources: Vec<SourceStatus>,
}

/// One static historical batch, end to end: fetch all sources, fuse them,
/// run correlation and forecasting concurrently, then derive signals and
/// decisions.
///
/// Anticipated failures degrade: a dead source becomes an empty series, a
/// missing keyword column becomes an undefined correlation, a failed
/// forecast becomes an empty prediction map. Each degradation shrinks the
/// decision set instead of aborting; only unexpected errors escape.
pub struct Pipeline {
    providers: Vec<Arc<dyn PriceProvider>>,
    trend_provider: Arc<dyn TrendProvider>,
    forecaster: Arc<dyn Forecaster>,
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(
        providers: Vec<Arc<dyn PriceProvider>>,
        trend_provider: Arc<dyn TrendProvider>,
        forecaster: Arc<dyn Forecaster>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            providers,
            trend_provider,
            forecaster,
            config,
        }
    }

    pub async fn run(&self, symbol: &str) -> Result<RunReport> {
        info!(symbol, sources = self.providers.len(), "Starting analysis");

        // All source fetches run concurrently; fusion is the barrier that
        // waits for every one of them.
        let (series, sources) = sources::fetch_all(&self.providers, symbol).await;
        let frame = fusion::fuse(&series);
        info!(rows = frame.len(), "Merged stock data");

        // Trend correlation and forecasting are independent of each other.
        let (correlation, forecasts) = tokio::join!(
            self.correlate(symbol, &frame),
            self.forecast(&frame),
        );

        let signals = signal::generate(&frame, &self.config.signal);
        let decisions = decision::decide(&signals, correlation.coefficient, &forecasts);
        info!(symbol, decisions = decisions.len(), "Analysis complete");

        Ok(RunReport {
            symbol: symbol.to_string(),
            decisions,
            correlation,
            sources,
        })
    }

    /// Fetch search interest for the symbol and correlate it with the fused
    /// prices. Every anticipated failure degrades to an undefined result.
    async fn correlate(&self, symbol: &str, frame: &FusedFrame) -> CorrelationResult {
        let keywords = vec![symbol.to_string()];
        let trends = match self
            .trend_provider
            .fetch(&keywords, &self.config.trend.timeframe, &self.config.trend.geo)
            .await
        {
            Ok(trends) => trends,
            Err(e) => {
                warn!(error = %e, "Trend fetch failed — continuing without trend data");
                return CorrelationResult::undefined();
            }
        };

        let correlator = CorrelatorConfig::new(
            symbol,
            Duration::seconds(self.config.trend.grid_interval_secs),
        );
        match trend::correlate(&trends, frame, &correlator) {
            Ok(result) => result,
            Err(Error::MissingColumn(column)) => {
                warn!(column = %column, "Keyword not found in trend data — correlation undefined");
                CorrelationResult::undefined()
            }
            Err(e) => {
                warn!(error = %e, "Correlation failed — treating as undefined");
                CorrelationResult::undefined()
            }
        }
    }

    /// One bounded forecaster call. Failure degrades to no predictions,
    /// which downstream treats as every forecast condition being unmet.
    async fn forecast(&self, frame: &FusedFrame) -> BTreeMap<DateTime<Utc>, f64> {
        match self
            .forecaster
            .predict(frame, &self.config.signal.price_column)
            .await
        {
            Ok(predictions) => predictions,
            Err(e) => {
                warn!(error = %e, "Forecast failed — continuing without predictions");
                BTreeMap::new()
            }
        }
    }
}
