use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::price::{HistoryProvider, Observation};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) btcpp/1.0";

// YahooFinanceProvider implementation for HistoryProvider
pub struct YahooFinanceProvider {
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Self {
        YahooFinanceProvider {
            base_url: base_url.to_string(),
        }
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate) -> String {
        let period1 = start.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
        let period2 = Utc::now().timestamp();
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history&includeAdjustedClose=true",
            self.base_url, symbol, period1, period2
        )
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug, Default)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Flattens a chart item into one dated close per bar.
///
/// Prefers the adjusted close and falls back to the raw close. Bars are
/// dated in the exchange's local calendar using `gmtoffset`.
fn extract_closes(symbol: &str, item: ChartItem) -> Result<Vec<Observation>> {
    let Some(timestamps) = item.timestamp else {
        return Ok(Vec::new());
    };

    let indicators = item.indicators;
    let adjusted = indicators
        .as_ref()
        .and_then(|inds| inds.adjclose.as_ref())
        .and_then(|adj| adj.first())
        .and_then(|adj| adj.adjclose.as_ref());
    let raw = indicators
        .as_ref()
        .and_then(|inds| inds.quote.first())
        .and_then(|q| q.close.as_ref());
    let closes = adjusted
        .or(raw)
        .ok_or_else(|| anyhow!("No close prices found for symbol: {}", symbol))?;

    timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| {
            let date = DateTime::from_timestamp(ts + item.meta.gmtoffset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| anyhow!("Invalid timestamp {} for symbol: {}", ts, symbol))?;
            Ok((date, closes.get(i).copied().flatten()))
        })
        .collect()
}

#[async_trait]
impl HistoryProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooHistoryFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_history(&self, symbol: &str, start: NaiveDate) -> Result<Vec<Observation>> {
        let url = self.chart_url(symbol, start);
        debug!("Requesting price history from {}", url);

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        debug!(response = ?response, "Received Yahoo response");

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        if let Some(error) = data.chart.error {
            return Err(anyhow!(
                "Yahoo error for symbol {}: {}: {}",
                symbol,
                error.code,
                error.description
            ));
        }

        match data.chart.result.and_then(|r| r.into_iter().next()) {
            Some(item) => extract_closes(symbol, item),
            None => Ok(Vec::new()),
        }
    }
}
