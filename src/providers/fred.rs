use crate::core::price::{HistoryProvider, Observation};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, instrument};

/// Header names FRED has used for the observation date column.
const DATE_COLUMNS: &[&str] = &["DATE", "OBSERVATION_DATE"];

/// Downloads series from FRED's public `fredgraph.csv` endpoint.
pub struct FredProvider {
    base_url: String,
}

impl FredProvider {
    pub fn new(base_url: &str) -> Self {
        FredProvider {
            base_url: base_url.to_string(),
        }
    }
}

/// Parses a FRED CSV download into dated observations.
///
/// The date column is the first header named like a date, else column 0.
/// The value column is the one named after `series_id`, else column 1.
/// Values that are not numbers (FRED writes `.` for gaps) come back as `None`.
pub fn parse_fred_csv(text: &str, series_id: &str) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV headers for {series_id}"))?
        .clone();
    if headers.len() < 2 {
        return Err(anyhow!(
            "Expected a date and a value column for {}, found {} column(s)",
            series_id,
            headers.len()
        ));
    }

    let date_col = headers
        .iter()
        .position(|h| DATE_COLUMNS.contains(&h.to_uppercase().as_str()))
        .unwrap_or(0);
    let value_col = headers.iter().position(|h| h == series_id).unwrap_or(1);
    debug!(
        date_column = &headers[date_col],
        value_column = &headers[value_col],
        "Resolved FRED columns"
    );

    let mut observations = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // +2: header is line 1
        let line = idx + 2;
        let record = record.with_context(|| format!("CSV parse error at line {line}"))?;

        let raw_date = record.get(date_col).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{raw_date}' at line {line}"))?;
        let value = record
            .get(value_col)
            .and_then(|v| v.parse::<f64>().ok());

        observations.push((date, value));
    }

    Ok(observations)
}

#[async_trait]
impl HistoryProvider for FredProvider {
    #[instrument(
        name = "FredHistoryFetch",
        skip(self),
        fields(series_id = %series_id)
    )]
    async fn fetch_history(&self, series_id: &str, _start: NaiveDate) -> Result<Vec<Observation>> {
        let url = format!("{}/graph/fredgraph.csv?id={}", self.base_url, series_id);
        debug!("Requesting series from {}", url);

        let client = reqwest::Client::builder().user_agent("btcpp/1.0").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send request for series: {series_id}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for series: {}",
                response.status(),
                series_id
            ));
        }

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for series: {series_id}"))?;

        if response_text.trim().is_empty() {
            return Err(anyhow!("Received empty response for series: {}", series_id));
        }

        let observations = parse_fred_csv(&response_text, series_id)
            .with_context(|| format!("Failed to parse FRED CSV for series: {series_id}"))?;

        debug!(
            "Fetched {} observations for {}",
            observations.len(),
            series_id
        );
        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::fetch_quarterly;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_fred_mock_server(
        series_id: &str,
        mock_response: &str,
        status_code: u16,
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/graph/fredgraph.csv"))
            .and(query_param("id", series_id))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_observation_date_header() {
        let csv = "observation_date,MSPUS\n2021-01-01,369800.0\n2021-04-01,382600.0\n";
        let observations = parse_fred_csv(csv, "MSPUS").unwrap();
        assert_eq!(
            observations,
            vec![
                (d(2021, 1, 1), Some(369800.0)),
                (d(2021, 4, 1), Some(382600.0)),
            ]
        );
    }

    #[test]
    fn test_parse_falls_back_to_positional_columns() {
        let csv = "when,value,extra\n2020-07-01,1.5,x\n";
        let observations = parse_fred_csv(csv, "MSPNE").unwrap();
        assert_eq!(observations, vec![(d(2020, 7, 1), Some(1.5))]);
    }

    #[test]
    fn test_parse_finds_columns_by_name() {
        let csv = "MSPW,DATE\n500000,2022-10-01\n";
        let observations = parse_fred_csv(csv, "MSPW").unwrap();
        assert_eq!(observations, vec![(d(2022, 10, 1), Some(500000.0))]);
    }

    #[test]
    fn test_parse_placeholder_is_missing_not_zero() {
        let csv = "DATE,MSPS\n2021-01-01,330000\n2021-04-01,.\n2021-07-01,345000\n";
        let observations = parse_fred_csv(csv, "MSPS").unwrap();
        assert_eq!(observations[1], (d(2021, 4, 1), None));
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        let csv = "DATE,MSPS\nnot-a-date,330000\n";
        let result = parse_fred_csv(csv, "MSPS");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid date 'not-a-date' at line 2")
        );
    }

    #[test]
    fn test_parse_rejects_single_column() {
        let result = parse_fred_csv("DATE\n2021-01-01\n", "MSPS");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_successful_fred_fetch() {
        let body = "observation_date,MSPUS\n2009-10-01,216000\n2010-01-01,222900\n2010-04-01,219500\n";
        let mock_server = create_fred_mock_server("MSPUS", body, 200).await;

        let provider = FredProvider::new(&mock_server.uri());
        let result = provider.fetch_history("MSPUS", d(2010, 1, 1)).await.unwrap();
        assert_eq!(result.len(), 3);
    }

    #[tokio::test]
    async fn test_fred_placeholder_row_dropped_from_quarterly_series() {
        let body = "observation_date,MSPMW\n\
                    2009-10-01,190000\n\
                    2010-01-01,200000\n\
                    2010-04-01,.\n\
                    2010-07-01,210000\n";
        let mock_server = create_fred_mock_server("MSPMW", body, 200).await;

        let provider = FredProvider::new(&mock_server.uri());
        let series = fetch_quarterly(&provider, "MSPMW", "housing_midwest", d(2010, 1, 1)).await;

        assert_eq!(
            series.iter().collect::<Vec<_>>(),
            vec![(d(2010, 3, 31), 200000.0), (d(2010, 9, 30), 210000.0)]
        );
    }

    #[tokio::test]
    async fn test_fred_api_error_response() {
        let mock_server = create_fred_mock_server("MSPNE", "Server Error", 500).await;
        let provider = FredProvider::new(&mock_server.uri());

        let result = provider.fetch_history("MSPNE", d(2010, 1, 1)).await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for series: MSPNE"
        );
    }

    #[tokio::test]
    async fn test_fred_empty_response() {
        let mock_server = create_fred_mock_server("MSPS", "", 200).await;
        let provider = FredProvider::new(&mock_server.uri());

        let result = provider.fetch_history("MSPS", d(2010, 1, 1)).await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Received empty response for series: MSPS"
        );
    }

    #[tokio::test]
    async fn test_fred_failure_degrades_to_empty_series() {
        let mock_server = create_fred_mock_server("MSPW", "<html>oops</html>", 200).await;
        let provider = FredProvider::new(&mock_server.uri());

        let series = fetch_quarterly(&provider, "MSPW", "housing_west", d(2010, 1, 1)).await;
        assert!(series.is_empty());
    }
}
