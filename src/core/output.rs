//! JSON documents consumed by the static front end.
use crate::core::ratio::RatioSeries;
use crate::core::series::QuarterlyPriceSeries;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const BTC_USD_ASSET: &str = "USD in BTC";
pub const BTC_USD_FILE: &str = "btc_usd.json";

const PRICE_DECIMALS: usize = 2;
const RATIO_DECIMALS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioRecord {
    pub date: String,
    pub btc_price: Option<f64>,
    pub asset_price: Option<f64>,
    pub asset_per_btc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BtcUsdRecord {
    pub date: String,
    pub btc_price_usd: Option<f64>,
    pub btc_per_usd: Option<f64>,
}

/// Envelope shared by every output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDocument<R> {
    pub asset: String,
    pub updated_at: String,
    pub data: Vec<R>,
}

/// Rounds to the decimal nearest the stored value, ties to even.
///
/// Goes through the formatter, which works on the exact binary value, so
/// `31519.425` (stored just below the half) rounds down.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_timestamp(generated_at: DateTime<Utc>) -> String {
    generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn ratio_document(
    asset: &str,
    ratio: &RatioSeries,
    generated_at: DateTime<Utc>,
) -> OutputDocument<RatioRecord> {
    let data = ratio
        .rows
        .iter()
        .map(|row| RatioRecord {
            date: format_date(row.date),
            btc_price: finite(row.btc_price).map(|v| round_to(v, PRICE_DECIMALS)),
            asset_price: finite(row.asset_price).map(|v| round_to(v, PRICE_DECIMALS)),
            asset_per_btc: finite(row.asset_per_btc).map(|v| round_to(v, RATIO_DECIMALS)),
        })
        .collect();

    OutputDocument {
        asset: asset.to_string(),
        updated_at: format_timestamp(generated_at),
        data,
    }
}

/// How much BTC one dollar buys, alongside the raw BTC price.
pub fn btc_usd_document(
    btc: &QuarterlyPriceSeries,
    generated_at: DateTime<Utc>,
) -> OutputDocument<BtcUsdRecord> {
    let data = btc
        .iter()
        .map(|(date, price)| BtcUsdRecord {
            date: format_date(date),
            btc_price_usd: finite(price),
            btc_per_usd: finite(1.0 / price),
        })
        .collect();

    OutputDocument {
        asset: BTC_USD_ASSET.to_string(),
        updated_at: format_timestamp(generated_at),
        data,
    }
}

/// Writes `doc` as pretty JSON, replacing whatever was at `path`.
///
/// Returns the number of records written.
pub fn write_document<R: Serialize>(path: &Path, doc: &OutputDocument<R>) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(doc)
        .with_context(|| format!("Failed to serialize document for {}", doc.asset))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), records = doc.data.len(), "Wrote document");
    Ok(doc.data.len())
}
