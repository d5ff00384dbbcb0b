//! # models::projection
//!
//! Wire types for `/projection/single-ticker`.
//!
//! [`ProjectionQuery`] arrives either as a JSON body (POST) or as query
//! parameters (GET); both forms share the same struct and the same defaults.
//! [`ProjectionResponse`] echoes the query back next to the two projection
//! variants produced by the active [`ProjectionSource`](crate::source::ProjectionSource).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── ProjectionQuery ──────────────────────────────────────────────────────────

/// Identifies which projection series to retrieve.
///
/// Every field is optional on the wire; missing fields fall back to
/// `SPY` / `daily` / `2024-10-28`.  Values are free-form strings and are
/// echoed back exactly as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionQuery {
    pub ticker: String,
    pub timeframe: String,
    /// `YYYY-MM-DD` by convention.
    pub start_date: String,
}

impl Default for ProjectionQuery {
    fn default() -> Self {
        Self {
            ticker: "SPY".to_string(),
            timeframe: "daily".to_string(),
            start_date: "2024-10-28".to_string(),
        }
    }
}

// ─── ProjectionSeries ─────────────────────────────────────────────────────────

/// Date → price mapping. `BTreeMap` keeps the JSON output sorted by date.
pub type PriceMap = BTreeMap<NaiveDate, f64>;

/// The two forecasting variants, returned side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectionSeries {
    pub clustered_projection: PriceMap,
    pub consolidated_projection: PriceMap,
}

// ─── ProjectionResponse ───────────────────────────────────────────────────────

/// Body of a successful `/projection/single-ticker` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResponse {
    pub ticker: String,
    pub timeframe: String,
    pub start_date: String,
    #[serde(flatten)]
    pub series: ProjectionSeries,
}

impl ProjectionResponse {
    /// Attach the echoed query fields to a resolved series.
    pub fn new(query: ProjectionQuery, series: ProjectionSeries) -> Self {
        Self {
            ticker: query.ticker,
            timeframe: query.timeframe,
            start_date: query.start_date,
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_uses_defaults() {
        let query: ProjectionQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query, ProjectionQuery::default());
        assert_eq!(query.start_date, "2024-10-28");
    }

    #[test]
    fn partial_body_keeps_remaining_defaults() {
        let query: ProjectionQuery =
            serde_json::from_value(json!({ "ticker": "QQQ", "timeframe": "hourly" })).unwrap();
        assert_eq!(query.ticker, "QQQ");
        assert_eq!(query.timeframe, "hourly");
        assert_eq!(query.start_date, ProjectionQuery::default().start_date);
    }

    #[test]
    fn fields_are_kept_verbatim() {
        let query: ProjectionQuery = serde_json::from_value(
            json!({ "ticker": "", "timeframe": "4h", "start_date": "2024-1-5" }),
        )
        .unwrap();
        let body = serde_json::to_value(ProjectionResponse::new(query, ProjectionSeries::default()))
            .unwrap();

        assert_eq!(body["ticker"], "");
        assert_eq!(body["timeframe"], "4h");
        assert_eq!(body["startDate"], "2024-1-5");
    }

    #[test]
    fn response_uses_camel_case_and_iso_dates() {
        let mut series = ProjectionSeries::default();
        series
            .clustered_projection
            .insert(NaiveDate::from_ymd_opt(2024, 10, 29).unwrap(), 573.2);

        let body = serde_json::to_value(ProjectionResponse::new(ProjectionQuery::default(), series))
            .unwrap();

        assert_eq!(body["startDate"], "2024-10-28");
        assert_eq!(body["timeframe"], "daily");
        assert_eq!(body["clusteredProjection"]["2024-10-29"], 573.2);
        assert_eq!(body["consolidatedProjection"], json!({}));
    }
}
