pub mod cli;
pub mod core;
pub mod providers;

pub use cli::update::{RunReport, SeriesOutcome, SeriesReport};

use anyhow::Result;
use tracing::{debug, info};

/// Loads configuration and runs a full update against the live providers.
///
/// `output_dir` overrides the configured output directory. Returns `None`
/// when the update was abandoned because no BTC data came back.
pub async fn run(
    config_path: Option<&str>,
    output_dir: Option<&str>,
) -> Result<Option<RunReport>> {
    info!("btcpp starting...");

    let mut config = crate::core::config::AppConfig::load(config_path)?;
    if let Some(dir) = output_dir {
        config.output_dir = Some(dir.to_string());
    }
    debug!("Loaded config: {config:#?}");

    let base_url = config
        .providers
        .yahoo
        .as_ref()
        .map_or("https://query1.finance.yahoo.com", |p| &p.base_url);
    let market_provider = crate::providers::YahooFinanceProvider::new(base_url);

    let fred_base_url = config
        .providers
        .fred
        .as_ref()
        .map_or("https://fred.stlouisfed.org", |p| &p.base_url);
    let housing_provider = crate::providers::FredProvider::new(fred_base_url);

    crate::cli::update::run(
        &config,
        &market_provider,
        &housing_provider,
        chrono::Utc::now(),
    )
    .await
}
