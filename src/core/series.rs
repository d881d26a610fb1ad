//! Quarterly price series and quarter-end resampling.
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// A single dated price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// One price per calendar quarter, labelled with the quarter's last day.
///
/// Points are strictly increasing by date and every price is finite and
/// positive. Apart from the empty default, series are only built by
/// [`QuarterlyPriceSeries::resample`], which enforces both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuarterlyPriceSeries {
    points: Vec<PricePoint>,
}

/// Returns the last calendar day of the quarter containing `date`.
pub fn quarter_end(date: NaiveDate) -> NaiveDate {
    let quarter = date.month0() / 3;
    let (year, next_month) = if quarter == 3 {
        (date.year() + 1, 1)
    } else {
        (date.year(), quarter * 3 + 4)
    };
    NaiveDate::from_ymd_opt(year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

impl QuarterlyPriceSeries {
    /// Reduces observations to the last one in each calendar quarter.
    ///
    /// Non-finite and non-positive values count as missing and are dropped
    /// before grouping, so a quarter whose observations are all missing does
    /// not appear. When two observations share the latest date of a quarter
    /// the one later in input order wins. Input order is otherwise irrelevant.
    pub fn resample<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut quarters: BTreeMap<NaiveDate, (NaiveDate, f64)> = BTreeMap::new();
        let mut dropped = 0usize;

        for (date, price) in observations {
            if !price.is_finite() || price <= 0.0 {
                dropped += 1;
                continue;
            }
            let entry = quarters.entry(quarter_end(date)).or_insert((date, price));
            if date >= entry.0 {
                *entry = (date, price);
            }
        }

        if dropped > 0 {
            debug!(dropped, "Dropped missing or non-positive observations");
        }

        let points = quarters
            .into_iter()
            .map(|(date, (_, price))| PricePoint { date, price })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().map(|p| (p.date, p.price))
    }
}

/// Keeps only observations dated on or after `start`.
pub fn since<I>(observations: I, start: NaiveDate) -> impl Iterator<Item = (NaiveDate, f64)>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    observations
        .into_iter()
        .filter(move |(date, _)| *date >= start)
}
