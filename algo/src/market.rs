//! # market — daily market data feed
//!
//! Ticks are read from a JSON array, oldest first:
//!
//! ```json
//! [ { "symbol": "SPY", "time": "2024-10-29T20:00:00Z", "price": 581.77 } ]
//! ```

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One unit of market data: a symbol's price at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
    pub symbol: String,
    pub time: DateTime<Utc>,
    pub price: f64,
}

impl MarketTick {
    /// Trading day the tick belongs to (UTC).
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.time.date_naive()
    }
}

/// Load a tick file and sort it by time.
pub fn load_ticks(path: &Path) -> anyhow::Result<Vec<MarketTick>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read tick file {}", path.display()))?;

    let mut ticks: Vec<MarketTick> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid tick file {}", path.display()))?;

    ticks.sort_by_key(|t| t.time);
    Ok(ticks)
}
