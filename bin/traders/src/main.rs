use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, PriceProvider};
use forecast::LeastSquaresForecaster;
use pipeline::{AnalysisConfig, Pipeline};
use sources::{AlphaVantageClient, GoogleTrendsClient, IexCloudClient, YahooFinanceClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-source stock analysis and decision making")]
struct Args {
    /// Stock symbol to analyze
    symbol: String,

    /// Analysis config file (overrides ANALYSIS_CONFIG_PATH)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let args = Args::parse();
    let cfg = Config::from_env();
    let analysis =
        AnalysisConfig::load(args.config.as_deref().unwrap_or(cfg.analysis_config_path.as_str()));
    info!(symbol = %args.symbol, "Starting analysis");

    // ── Pipeline ──────────────────────────────────────────────────────────────
    let providers: Vec<Arc<dyn PriceProvider>> = vec![
        Arc::new(AlphaVantageClient::new(&cfg.alpha_vantage_api_key)),
        Arc::new(IexCloudClient::new(&cfg.iex_cloud_api_key)),
        Arc::new(YahooFinanceClient::new()),
    ];
    let pipeline = Pipeline::new(
        providers,
        Arc::new(GoogleTrendsClient::new()),
        Arc::new(LeastSquaresForecaster::new()),
        analysis,
    );

    let report = pipeline.run(&args.symbol).await?;

    // ── Output ────────────────────────────────────────────────────────────────
    for status in &report.sources {
        println!("{}: {}", status.source, status.outcome);
    }
    match report.correlation.coefficient {
        Some(r) => println!("Trend correlation: {r:.4}"),
        None => println!("Trend correlation: undefined"),
    }

    if report.decisions.is_empty() {
        println!("No actionable decisions for {}.", report.symbol);
    } else {
        for decision in &report.decisions {
            println!(
                "{}  {}  — {}",
                decision.timestamp.format("%Y-%m-%d"),
                decision.action,
                decision.reasons.join("; ")
            );
        }
    }

    Ok(())
}
