use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Exchanges whose daily reports we know how to ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Bse,
    Nse,
}

impl Exchange {
    pub const ALL: [Exchange; 2] = [Exchange::Bse, Exchange::Nse];

    /// Identifier stored alongside every record
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Bse => "bse",
            Exchange::Nse => "nse",
        }
    }

    /// Earliest date for which the exchange publishes reports
    pub fn inception_date(&self) -> NaiveDate {
        let (y, m, d) = match self {
            Exchange::Bse => (2007, 1, 1),
            Exchange::Nse => (1994, 11, 3),
        };
        NaiveDate::from_ymd_opt(y, m, d).expect("inception dates are valid")
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bse" => Ok(Exchange::Bse),
            "nse" => Ok(Exchange::Nse),
            other => Err(anyhow::anyhow!("unknown exchange: {}", other)),
        }
    }
}

/// Historical trading information for one ticker on one exchange on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityRecord {
    pub exchange: Exchange,
    pub trading_date: NaiveDate,
    pub ticker: String,
    pub security_type: String,
    /// Empty when neither the report nor the reference table knows it
    pub isin: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub last: f64,
    pub previous_close: f64,
}

/// Records produced from a single report; persisted as one unit of work
pub type EquityBatch = Vec<EquityRecord>;

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub bse_base_url: String,
    pub nse_base_url: String,
    pub download_workers: usize,
    pub parse_workers: usize,
    pub fetch_timeout: Duration,
    /// BSE "List of Scrips" export; the bundled list is used when unset
    pub listed_companies_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let number = |key: &str, default: usize| -> usize {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default)
        };

        let config = Config {
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "bhav.db".to_string()),
            bse_base_url: lookup("BSE_BASE_URL")
                .unwrap_or_else(|| "https://www.bseindia.com".to_string()),
            nse_base_url: lookup("NSE_BASE_URL")
                .unwrap_or_else(|| "https://www1.nseindia.com".to_string()),
            // downloads are I/O bound, parsing is CPU bound
            download_workers: number("DOWNLOAD_WORKERS", parallelism * 2),
            parse_workers: number("PARSE_WORKERS", parallelism),
            fetch_timeout: Duration::from_secs(number("FETCH_TIMEOUT_SECS", 60) as u64),
            listed_companies_path: lookup("BSE_LISTED_COMPANIES")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        };

        if config.database_path.trim().is_empty() {
            return Err(anyhow::anyhow!("DATABASE_PATH must not be empty"));
        }

        Ok(config)
    }
}
