pub mod alpha_vantage;
pub mod google_trends;
pub mod iex;
pub mod offline;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use google_trends::GoogleTrendsClient;
pub use iex::IexCloudClient;
pub use offline::{FailingSource, OfflineForecast, OfflinePriceSource, OfflineTrendSource};
pub use yahoo::YahooFinanceClient;

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use common::{NamedSeries, PriceProvider, SourceOutcome, SourceStatus};

/// Fetch all price sources concurrently.
///
/// A failing source never aborts the run: it is logged, recorded in the
/// returned statuses, and replaced with an empty series so fusion can
/// proceed on whatever did arrive.
pub async fn fetch_all(
    providers: &[Arc<dyn PriceProvider>],
    symbol: &str,
) -> (Vec<NamedSeries>, Vec<SourceStatus>) {
    let results = join_all(providers.iter().map(|p| p.fetch(symbol))).await;

    let mut series = Vec::with_capacity(providers.len());
    let mut statuses = Vec::with_capacity(providers.len());

    for (provider, result) in providers.iter().zip(results) {
        let outcome = match result {
            Ok(fetched) => {
                info!(
                    source = provider.name(),
                    observations = fetched.len(),
                    "Fetched price series"
                );
                let outcome = SourceOutcome::Fetched {
                    observations: fetched.len(),
                };
                series.push(fetched);
                outcome
            }
            Err(e) => {
                warn!(source = provider.name(), error = %e, "Source fetch failed — continuing without it");
                series.push(NamedSeries::empty(provider.name()));
                SourceOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        statuses.push(SourceStatus {
            source: provider.name().to_string(),
            outcome,
        });
    }

    (series, statuses)
}
