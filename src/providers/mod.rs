pub mod fred;
pub mod yahoo_finance;

pub use fred::FredProvider;
pub use yahoo_finance::YahooFinanceProvider;
