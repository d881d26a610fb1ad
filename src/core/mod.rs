//! Core business logic abstractions

pub mod config;
pub mod log;
pub mod output;
pub mod price;
pub mod ratio;
pub mod series;

// Re-export main types for cleaner imports
pub use price::{HistoryProvider, Observation, fetch_quarterly};
pub use ratio::{RatioRow, RatioSeries, compute_ratio};
pub use series::{PricePoint, QuarterlyPriceSeries};
