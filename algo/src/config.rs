//! # config — run settings from environment variables
//!
//! | Variable             | Default                  |
//! |----------------------|--------------------------|
//! | `API_BASE_URL`       | `http://localhost:8000`  |
//! | `SYMBOL`             | `SPY`                    |
//! | `TIMEFRAME`          | `daily`                  |
//! | `START_DATE`         | `2024-10-28`             |
//! | `THRESHOLD`          | `0.01`                   |
//! | `PROJECTION_VARIANT` | `clustered`              |
//! | `STARTING_CASH`      | `100000`                 |
//! | `TICKS_PATH`         | `data/spy_daily.json`    |
//! | `CHART_OUT`          | unset (chart not saved)  |
//! | `HTTP_TIMEOUT_SECS`  | `30`                     |

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::NaiveDate;

use crate::fetch::ProjectionQuery;

/// Which projection mapping drives trading.  Both are always charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionVariant {
    Clustered,
    Consolidated,
}

impl std::fmt::Display for ProjectionVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionVariant::Clustered => write!(f, "clustered"),
            ProjectionVariant::Consolidated => write!(f, "consolidated"),
        }
    }
}

impl std::str::FromStr for ProjectionVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clustered" => Ok(ProjectionVariant::Clustered),
            "consolidated" => Ok(ProjectionVariant::Consolidated),
            other => bail!("Unknown PROJECTION_VARIANT: '{other}'. Use 'clustered' or 'consolidated'"),
        }
    }
}

/// Trading parameters consumed by the decision engine.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub symbol: String,
    /// Minimum |expected return| before the engine acts, e.g. `0.01` = 1%.
    pub threshold: f64,
    pub variant: ProjectionVariant,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            threshold: 0.01,
            variant: ProjectionVariant::Clustered,
        }
    }
}

/// Everything a backtest run needs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the projection API, without a trailing path.
    pub api_base_url: String,
    pub query: ProjectionQuery,
    pub strategy: StrategyConfig,
    pub starting_cash: f64,
    pub ticks_path: PathBuf,
    pub chart_out: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let symbol = env_or("SYMBOL", "SPY");

        let start_date = NaiveDate::parse_from_str(&env_or("START_DATE", "2024-10-28"), "%Y-%m-%d")
            .context("START_DATE must be YYYY-MM-DD")?;

        let threshold: f64 = env_or("THRESHOLD", "0.01")
            .parse()
            .context("THRESHOLD must be a number")?;
        if !(threshold.is_finite() && threshold >= 0.0) {
            bail!("THRESHOLD must be a non-negative number, got {threshold}");
        }

        let starting_cash: f64 = env_or("STARTING_CASH", "100000")
            .parse()
            .context("STARTING_CASH must be a number")?;

        let timeout_secs: u64 = env_or("HTTP_TIMEOUT_SECS", "30")
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            api_base_url: env_or("API_BASE_URL", "http://localhost:8000")
                .trim_end_matches('/')
                .to_string(),
            query: ProjectionQuery {
                ticker: symbol.clone(),
                timeframe: env_or("TIMEFRAME", "daily"),
                start_date,
            },
            strategy: StrategyConfig {
                symbol,
                threshold,
                variant: env_or("PROJECTION_VARIANT", "clustered").parse()?,
            },
            starting_cash,
            ticks_path: PathBuf::from(env_or("TICKS_PATH", "data/spy_daily.json")),
            chart_out: std::env::var("CHART_OUT").ok().map(PathBuf::from),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
