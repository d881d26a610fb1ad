//! Price history abstractions and the fetch boundary

use crate::core::series::{QuarterlyPriceSeries, since};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

/// A dated observation as delivered by a provider. `None` marks a missing value.
pub type Observation = (NaiveDate, Option<f64>);

#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetches raw observations for `identifier` starting at `start`.
    ///
    /// An identifier the provider knows but has no rows for yields `Ok` with
    /// an empty vector; transport and format failures are errors.
    async fn fetch_history(&self, identifier: &str, start: NaiveDate) -> Result<Vec<Observation>>;
}

/// Fetches a series and reduces it to quarter-end closes.
///
/// Never fails: any provider error is logged and turned into an empty
/// series, which callers treat as "skip this asset".
pub async fn fetch_quarterly(
    provider: &(dyn HistoryProvider + Send + Sync),
    identifier: &str,
    name: &str,
    start: NaiveDate,
) -> QuarterlyPriceSeries {
    let observations = match provider.fetch_history(identifier, start).await {
        Ok(observations) => observations,
        Err(e) => {
            warn!(%identifier, %name, error = %e, "Failed to fetch price history");
            return QuarterlyPriceSeries::default();
        }
    };

    if observations.is_empty() {
        warn!(%identifier, %name, "No data returned");
        return QuarterlyPriceSeries::default();
    }

    debug!(
        %identifier,
        observations = observations.len(),
        "Resampling to quarter ends"
    );
    let present = observations
        .into_iter()
        .filter_map(|(date, value)| value.map(|v| (date, v)));
    QuarterlyPriceSeries::resample(since(present, start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct StaticProvider(Vec<Observation>);

    #[async_trait]
    impl HistoryProvider for StaticProvider {
        async fn fetch_history(&self, _: &str, _: NaiveDate) -> Result<Vec<Observation>> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl HistoryProvider for FailingProvider {
        async fn fetch_history(&self, identifier: &str, _: NaiveDate) -> Result<Vec<Observation>> {
            Err(anyhow!("Request error for symbol: {}", identifier))
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_quarterly_resamples_and_filters() {
        let provider = StaticProvider(vec![
            (d(2009, 12, 30), Some(1.0)),
            (d(2010, 1, 4), Some(2.0)),
            (d(2010, 3, 1), None),
            (d(2010, 2, 26), Some(3.0)),
            (d(2010, 5, 3), None),
        ]);

        let series = fetch_quarterly(&provider, "TEST", "test", d(2010, 1, 1)).await;
        assert_eq!(series.iter().collect::<Vec<_>>(), vec![(d(2010, 3, 31), 3.0)]);
    }

    #[tokio::test]
    async fn test_fetch_quarterly_degrades_errors_to_empty() {
        let series = fetch_quarterly(&FailingProvider, "BAD", "bad", d(2010, 1, 1)).await;
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_quarterly_empty_provider_result() {
        let series = fetch_quarterly(&StaticProvider(vec![]), "NONE", "none", d(2010, 1, 1)).await;
        assert!(series.is_empty());
    }
}
