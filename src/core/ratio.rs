//! Aligns an asset series against the BTC anchor and prices it in BTC.
use crate::core::series::QuarterlyPriceSeries;
use chrono::NaiveDate;
use std::cmp::Ordering;
use tracing::warn;

/// One aligned quarter: both prices and how many asset units buy 1 BTC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioRow {
    pub date: NaiveDate,
    pub btc_price: f64,
    pub asset_price: f64,
    pub asset_per_btc: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioSeries {
    pub rows: Vec<RatioRow>,
}

impl RatioSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Inner-joins `asset` onto `btc` by date and divides.
///
/// Only quarters present in both series survive. Rows come out in ascending
/// date order. A row whose ratio is not finite is dropped.
pub fn compute_ratio(btc: &QuarterlyPriceSeries, asset: &QuarterlyPriceSeries) -> RatioSeries {
    let btc = btc.points();
    let asset = asset.points();
    let mut rows = Vec::with_capacity(btc.len().min(asset.len()));

    let (mut i, mut j) = (0, 0);
    while i < btc.len() && j < asset.len() {
        match btc[i].date.cmp(&asset[j].date) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let (b, a) = (btc[i], asset[j]);
                let asset_per_btc = a.price / b.price;
                if asset_per_btc.is_finite() {
                    rows.push(RatioRow {
                        date: b.date,
                        btc_price: b.price,
                        asset_price: a.price,
                        asset_per_btc,
                    });
                } else {
                    warn!(
                        date = %b.date,
                        btc = b.price,
                        asset = a.price,
                        "Dropping row with non-finite ratio"
                    );
                }
                i += 1;
                j += 1;
            }
        }
    }

    RatioSeries { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn quarterly(points: &[(NaiveDate, f64)]) -> QuarterlyPriceSeries {
        QuarterlyPriceSeries::resample(points.iter().copied())
    }

    #[test]
    fn test_btc_gold_ratio() {
        let btc = quarterly(&[(d(2021, 3, 31), 50000.0), (d(2021, 6, 30), 35000.0)]);
        let gold = quarterly(&[(d(2021, 3, 31), 1800.0), (d(2021, 6, 30), 1770.0)]);

        let ratio = compute_ratio(&btc, &gold);
        assert_eq!(ratio.len(), 2);
        assert_eq!(ratio.rows[0].date, d(2021, 3, 31));
        assert_eq!(ratio.rows[0].btc_price, 50000.0);
        assert_eq!(ratio.rows[0].asset_price, 1800.0);
        assert!((ratio.rows[0].asset_per_btc - 0.036).abs() < 1e-12);
        assert!((ratio.rows[1].asset_per_btc - 1770.0 / 35000.0).abs() < 1e-12);
    }

    #[test]
    fn test_inner_join_keeps_only_shared_dates() {
        let btc = quarterly(&[
            (d(2020, 3, 31), 6000.0),
            (d(2020, 6, 30), 9000.0),
            (d(2020, 9, 30), 10000.0),
            (d(2020, 12, 31), 29000.0),
        ]);
        let housing = quarterly(&[
            (d(2019, 12, 31), 320000.0),
            (d(2020, 6, 30), 330000.0),
            (d(2020, 12, 31), 350000.0),
            (d(2021, 3, 31), 360000.0),
        ]);

        let ratio = compute_ratio(&btc, &housing);
        let dates: Vec<_> = ratio.rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2020, 6, 30), d(2020, 12, 31)]);
        assert!(ratio.len() <= btc.len().min(housing.len()));

        let btc_dates: Vec<_> = btc.iter().map(|(date, _)| date).collect();
        let housing_dates: Vec<_> = housing.iter().map(|(date, _)| date).collect();
        assert!(
            ratio
                .rows
                .iter()
                .all(|r| btc_dates.contains(&r.date) && housing_dates.contains(&r.date))
        );
    }

    #[test]
    fn test_ratio_is_invariant_to_input_order() {
        let btc_rows = vec![
            (d(2018, 3, 31), 6900.0),
            (d(2018, 6, 30), 6400.0),
            (d(2018, 9, 30), 6600.0),
            (d(2018, 12, 31), 3700.0),
        ];
        let gold_rows = vec![
            (d(2018, 3, 31), 1325.0),
            (d(2018, 6, 30), 1250.0),
            (d(2018, 12, 31), 1281.0),
        ];
        let baseline = compute_ratio(&quarterly(&btc_rows), &quarterly(&gold_rows));

        let shuffled_btc = vec![btc_rows[2], btc_rows[0], btc_rows[3], btc_rows[1]];
        let shuffled_gold = vec![gold_rows[1], gold_rows[2], gold_rows[0]];
        let shuffled = compute_ratio(&quarterly(&shuffled_btc), &quarterly(&shuffled_gold));

        assert_eq!(baseline, shuffled);
    }

    #[test]
    fn test_disjoint_series_yield_empty_ratio() {
        let btc = quarterly(&[(d(2021, 3, 31), 50000.0)]);
        let asset = quarterly(&[(d(2015, 3, 31), 1200.0)]);
        assert!(compute_ratio(&btc, &asset).is_empty());
        assert!(compute_ratio(&btc, &QuarterlyPriceSeries::default()).is_empty());
    }
}
