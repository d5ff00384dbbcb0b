//! # fetch — load projections from the Numin API
//!
//! One blocking GET at start of run, then parse the JSON into two
//! date → price maps.  Parsing is deliberately lenient: a malformed entry is
//! logged and skipped, the well-formed ones around it are kept.
//!
//! ```text
//! ProjectionQuery ──▶ ProjectionClient::fetch ──▶ body ──▶ parse_projections ──▶ ProjectionSeries
//!                       (HTTP, blocking)                    (skip bad entries)
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CLUSTERED_KEY: &str = "clusteredProjection";
pub const CONSOLIDATED_KEY: &str = "consolidatedProjection";

const PROJECTION_PATH: &str = "/projection/single-ticker";

// ─── Types ────────────────────────────────────────────────────────────────────

/// Query sent to the projection API.
///
/// Mirrors the server-side query.  `start_date` is typed here so a bad
/// `START_DATE` fails at config load rather than at the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionQuery {
    pub ticker: String,
    pub timeframe: String,
    pub start_date: NaiveDate,
}

impl Default for ProjectionQuery {
    fn default() -> Self {
        Self {
            ticker: "SPY".to_string(),
            timeframe: "daily".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 10, 28).unwrap_or_default(),
        }
    }
}

/// Date → projected price.
pub type PriceMap = BTreeMap<NaiveDate, f64>;

/// Both projection variants, read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionSeries {
    pub clustered: PriceMap,
    pub consolidated: PriceMap,
}

impl ProjectionSeries {
    pub fn is_empty(&self) -> bool {
        self.clustered.is_empty() && self.consolidated.is_empty()
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Failure of the whole load step.  The engine logs it and runs without
/// predictions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("empty response from projection API")]
    Empty,

    #[error("missing '{0}' in response")]
    MissingField(&'static str),

    #[error("malformed response: {0}")]
    ParseFailure(String),

    #[error("projection API request failed: {0}")]
    Transport(String),
}

/// Failure of a single map entry.  Logged and skipped.
#[derive(Debug, Error, PartialEq)]
pub enum EntryError {
    #[error("'{0}' is not a YYYY-MM-DD date")]
    Date(String),

    #[error("price for {date} is not a positive number: {value}")]
    Price { date: String, value: String },
}

// ─── Transport ────────────────────────────────────────────────────────────────

/// Source of the raw response body.
pub trait ProjectionClient {
    fn fetch(&self, query: &ProjectionQuery) -> Result<String, FetchError>;
}

/// Blocking reqwest client pointed at a projection API base URL.
pub struct HttpProjectionClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpProjectionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl ProjectionClient for HttpProjectionClient {
    fn fetch(&self, query: &ProjectionQuery) -> Result<String, FetchError> {
        let url = projection_url(&self.base_url, query)?;

        info!(url = %url, "[API] Calling projection endpoint");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP {status}: {}", preview(&body))));
        }

        Ok(body)
    }
}

/// `{base}/projection/single-ticker?ticker=..&timeframe=..&start_date=..`
pub fn projection_url(base_url: &str, query: &ProjectionQuery) -> Result<Url, FetchError> {
    let start_date = query.start_date.format("%Y-%m-%d").to_string();

    Url::parse_with_params(
        &format!("{}{PROJECTION_PATH}", base_url.trim_end_matches('/')),
        [
            ("ticker", query.ticker.as_str()),
            ("timeframe", query.timeframe.as_str()),
            ("start_date", start_date.as_str()),
        ],
    )
    .map_err(|e| FetchError::Transport(format!("invalid API base URL '{base_url}': {e}")))
}

// ─── Load ─────────────────────────────────────────────────────────────────────

/// Fetch and parse in one step.
pub fn load_projections(
    client: &dyn ProjectionClient,
    query: &ProjectionQuery,
) -> Result<ProjectionSeries, FetchError> {
    let body = client.fetch(query)?;

    debug!(length = body.len(), "[API] Response received");

    let result = parse_projections(&body);
    if let Err(FetchError::ParseFailure(_)) = &result {
        debug!(preview = %preview(&body), "[API] Response preview");
    }
    result
}

/// Parse a projection API response body.
///
/// `clusteredProjection` is required; `consolidatedProjection` is optional and
/// defaults to empty.  Entries that fail [`parse_entry`] are skipped.
pub fn parse_projections(body: &str) -> Result<ProjectionSeries, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::Empty);
    }

    let data: Value =
        serde_json::from_str(body).map_err(|e| FetchError::ParseFailure(e.to_string()))?;

    let Some(fields) = data.as_object() else {
        return Err(FetchError::ParseFailure("top-level JSON is not an object".into()));
    };

    let Some(clustered) = fields.get(CLUSTERED_KEY) else {
        let keys: Vec<&String> = fields.keys().collect();
        debug!(?keys, "[API] Response keys");
        return Err(FetchError::MissingField(CLUSTERED_KEY));
    };

    Ok(ProjectionSeries {
        clustered: parse_price_map(CLUSTERED_KEY, clustered),
        consolidated: fields
            .get(CONSOLIDATED_KEY)
            .map(|v| parse_price_map(CONSOLIDATED_KEY, v))
            .unwrap_or_default(),
    })
}

/// Convert one `{ "YYYY-MM-DD": price }` object, skipping bad entries.
fn parse_price_map(variant: &str, value: &Value) -> PriceMap {
    let Some(entries) = value.as_object() else {
        warn!(variant, "[PARSE] Projection is not an object — ignored");
        return PriceMap::new();
    };

    let mut parsed = PriceMap::new();
    for (key, raw) in entries {
        match parse_entry(key, raw) {
            Ok((date, price)) => {
                parsed.insert(date, price);
            }
            Err(e) => warn!(variant, error = %e, "[PARSE] Skipping entry"),
        }
    }
    parsed
}

/// A price may arrive as a JSON number or a numeric string.
pub fn parse_entry(key: &str, raw: &Value) -> Result<(NaiveDate, f64), EntryError> {
    let date = NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_err(|_| EntryError::Date(key.to_string()))?;

    let price = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|p| p.is_finite() && *p > 0.0)
    .ok_or_else(|| EntryError::Price {
        date: key.to_string(),
        value: raw.to_string(),
    })?;

    Ok((date, price))
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
