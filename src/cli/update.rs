use super::ui;
use crate::core::config::AppConfig;
use crate::core::output::{BTC_USD_FILE, btc_usd_document, ratio_document, write_document};
use crate::core::{HistoryProvider, QuarterlyPriceSeries, compute_ratio, fetch_quarterly};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use comfy_table::Cell;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What happened to one tracked series.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesOutcome {
    Written { path: PathBuf, records: usize },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesReport {
    pub key: String,
    pub identifier: String,
    pub outcome: SeriesOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub btc_records: usize,
    pub series: Vec<SeriesReport>,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.series
            .iter()
            .filter(|s| matches!(s.outcome, SeriesOutcome::Written { .. }))
            .count()
    }

    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Series"),
            ui::header_cell("Source"),
            ui::header_cell("Records"),
        ]);

        for report in &self.series {
            let outcome = match &report.outcome {
                SeriesOutcome::Written { records, .. } => ui::count_cell(*records),
                SeriesOutcome::Skipped { reason } => ui::skipped_cell(reason),
            };
            table.add_row(vec![
                Cell::new(&report.key),
                Cell::new(&report.identifier),
                outcome,
            ]);
        }

        table.to_string()
    }
}

/// Fetches one series with progress output around it.
async fn fetch_step(
    provider: &(dyn HistoryProvider + Send + Sync),
    identifier: &str,
    name: &str,
    start: NaiveDate,
) -> QuarterlyPriceSeries {
    println!("Fetching {name} ({identifier})...");
    let spinner = ui::new_spinner(format!("Downloading {identifier}"));
    let series = fetch_quarterly(provider, identifier, name, start).await;
    spinner.finish_and_clear();

    if series.is_empty() {
        println!(
            "  {}",
            ui::style_text(
                &format!("Warning: No data returned for {identifier}"),
                ui::StyleType::Warning
            )
        );
    } else {
        println!("  Got {} quarterly data points", series.len());
    }
    series
}

/// Prices `asset` in BTC and writes `<key>.json`.
fn write_ratio(
    key: &str,
    btc: &QuarterlyPriceSeries,
    asset: &QuarterlyPriceSeries,
    output_dir: &Path,
    generated_at: DateTime<Utc>,
) -> SeriesOutcome {
    if asset.is_empty() {
        return SeriesOutcome::Skipped {
            reason: "no data returned".to_string(),
        };
    }

    let ratio = compute_ratio(btc, asset);
    let doc = ratio_document(key, &ratio, generated_at);
    let path = output_dir.join(format!("{key}.json"));

    match write_document(&path, &doc) {
        Ok(records) => {
            println!("  Saved {records} records to {key}.json");
            SeriesOutcome::Written { path, records }
        }
        Err(e) => {
            let reason = format!("{e:#}");
            warn!(%key, error = %reason, "Failed to write ratio document");
            SeriesOutcome::Skipped { reason }
        }
    }
}

/// Runs the whole update: BTC first, then every market and housing series.
///
/// Returns `Ok(None)` without writing anything when the BTC series is empty.
/// Failing to write the BTC document is an error. Every other series is
/// fetched and written independently.
pub async fn run(
    config: &AppConfig,
    market_provider: &(dyn HistoryProvider + Send + Sync),
    housing_provider: &(dyn HistoryProvider + Send + Sync),
    generated_at: DateTime<Utc>,
) -> Result<Option<RunReport>> {
    let output_dir = config.output_path();
    let start = config.start_date;
    info!(output_dir = %output_dir.display(), %start, "Starting update");

    ui::print_separator();
    println!(
        "{}",
        ui::style_text("BTC Purchasing Power - Data Update", ui::StyleType::Title)
    );
    ui::print_separator();

    println!("\n[1/3] Fetching market data...");
    let anchor = &config.anchor;
    let btc = fetch_step(market_provider, &anchor.symbol, &anchor.name, start).await;

    if btc.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "Error: Could not fetch BTC data. Aborting.",
                ui::StyleType::Error
            )
        );
        debug!(symbol = %anchor.symbol, "Anchor series empty, nothing written");
        return Ok(None);
    }

    let btc_path = output_dir.join(BTC_USD_FILE);
    let btc_records = write_document(&btc_path, &btc_usd_document(&btc, generated_at))
        .context("Failed to write BTC document")?;
    println!("  Saved {btc_records} records to {BTC_USD_FILE}");

    let mut series = Vec::with_capacity(config.markets.len() + config.housing.len());

    for market in &config.markets {
        let asset = fetch_step(market_provider, &market.symbol, &market.key, start).await;
        series.push(SeriesReport {
            key: market.key.clone(),
            identifier: market.symbol.clone(),
            outcome: write_ratio(&market.key, &btc, &asset, &output_dir, generated_at),
        });
    }

    println!("\n[2/3] Fetching FRED housing data...");
    for housing in &config.housing {
        let asset = fetch_step(housing_provider, &housing.series_id, &housing.key, start).await;
        series.push(SeriesReport {
            key: housing.key.clone(),
            identifier: housing.series_id.clone(),
            outcome: write_ratio(&housing.key, &btc, &asset, &output_dir, generated_at),
        });
    }

    let report = RunReport {
        btc_records,
        series,
    };

    println!("\n[3/3] Done!");
    println!("{}", report.display_as_table());
    println!(
        "{}",
        ui::style_text(
            &format!(
                "{} of {} series written to {}",
                report.written(),
                report.series.len(),
                output_dir.display()
            ),
            ui::StyleType::Subtle
        )
    );
    ui::print_separator();

    Ok(Some(report))
}
