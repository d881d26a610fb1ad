use anyhow::Result;
use btcpp::core::log::init_logging;
use clap::Parser;

/// Fetch BTC, gold, equity and housing prices and write what 1 BTC buys, per quarter.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long)]
    config_path: Option<String>,

    /// Directory to write the JSON documents to
    #[arg(short, long)]
    output_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = btcpp::run(cli.config_path.as_deref(), cli.output_dir.as_deref()).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Update failed");
    }
    result.map(|_| ())
}
