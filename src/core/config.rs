use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// A market ticker tracked against BTC.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MarketSeries {
    /// Output key; also names the `<key>.json` file.
    pub key: String,
    pub symbol: String,
}

/// A FRED series tracked against BTC.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HousingSeries {
    pub key: String,
    pub series_id: String,
}

/// The BTC series every ratio is computed against.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnchorSeries {
    pub symbol: String,
    pub name: String,
}

impl Default for AnchorSeries {
    fn default() -> Self {
        AnchorSeries {
            symbol: "BTC-USD".to_string(),
            name: "Bitcoin".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FredProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
    pub fred: Option<FredProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
            fred: Some(FredProviderConfig {
                base_url: "https://fred.stlouisfed.org".to_string(),
            }),
        }
    }
}

const MARKETS: &[(&str, &str)] = &[("gold_usd", "GC=F"), ("sp500", "^GSPC")];

const HOUSING: &[(&str, &str)] = &[
    ("housing_us_median", "MSPUS"),
    ("housing_northeast", "MSPNE"),
    ("housing_midwest", "MSPMW"),
    ("housing_south", "MSPS"),
    ("housing_west", "MSPW"),
];

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_markets() -> Vec<MarketSeries> {
    MARKETS
        .iter()
        .map(|(key, symbol)| MarketSeries {
            key: key.to_string(),
            symbol: symbol.to_string(),
        })
        .collect()
}

fn default_housing() -> Vec<HousingSeries> {
    HOUSING
        .iter()
        .map(|(key, series_id)| HousingSeries {
            key: key.to_string(),
            series_id: series_id.to_string(),
        })
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub anchor: AnchorSeries,
    #[serde(default = "default_markets")]
    pub markets: Vec<MarketSeries>,
    #[serde(default = "default_housing")]
    pub housing: Vec<HousingSeries>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub output_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            start_date: default_start_date(),
            anchor: AnchorSeries::default(),
            markets: default_markets(),
            housing: default_housing(),
            providers: ProvidersConfig::default(),
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads `path` if given, else the default config file if one exists,
    /// else the built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        debug!("Loading default config");
        match Self::default_config_path() {
            Ok(path) if path.exists() => Self::load_from_path(&path),
            _ => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "btcpp", "btcpp")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Where output documents go: the configured directory, or `data/` next
    /// to the crate.
    pub fn output_path(&self) -> PathBuf {
        match &self.output_dir {
            Some(custom_path) => PathBuf::from(custom_path),
            None => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"),
        }
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
