//! # chart — in-memory plot recorder
//!
//! Collects `(date, value)` points per named series so a run can be compared
//! against both projection variants after the fact.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

pub const ACTUAL_PRICE: &str = "Actual Price";
pub const CLUSTERED_PREDICTION: &str = "Clustered Prediction";
pub const CONSOLIDATED_PREDICTION: &str = "Consolidated Prediction";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Chart {
    pub title: String,
    pub series: BTreeMap<String, Vec<Point>>,
}

impl Chart {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            series: BTreeMap::new(),
        }
    }

    pub fn plot(&mut self, series: &str, date: NaiveDate, value: f64) {
        self.series
            .entry(series.to_string())
            .or_default()
            .push(Point { date, value });
    }

    pub fn points(&self, series: &str) -> &[Point] {
        self.series.get(series).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("cannot write chart to {}", path.display()))
    }
}
