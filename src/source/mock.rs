//! # source::mock
//!
//! Canned SPY projections for 2024-10-29 .. 2024-11-14.  Every query gets the
//! same series back regardless of ticker, timeframe or start date.

use chrono::NaiveDate;

use super::ProjectionSource;
use crate::error::AppError;
use crate::models::{PriceMap, ProjectionQuery, ProjectionSeries};

const CLUSTERED: &[((i32, u32, u32), f64)] = &[
    ((2024, 10, 29), 573.2),
    ((2024, 10, 30), 565.99),
    ((2024, 10, 31), 572.23),
    ((2024, 11, 1), 565.03),
    ((2024, 11, 4), 565.2),
    ((2024, 11, 5), 570.33),
    ((2024, 11, 6), 589.16),
    ((2024, 11, 7), 591.17),
    ((2024, 11, 8), 582.72),
    ((2024, 11, 11), 551.06),
    ((2024, 11, 12), 586.33),
    ((2024, 11, 13), 594.17),
    ((2024, 11, 14), 595.54),
];

const CONSOLIDATED: &[((i32, u32, u32), f64)] = &[
    ((2024, 10, 29), 573.6),
    ((2024, 10, 30), 565.92),
    ((2024, 10, 31), 574.18),
    ((2024, 11, 1), 567.11),
    ((2024, 11, 4), 571.32),
    ((2024, 11, 5), 578.48),
    ((2024, 11, 6), 584.61),
    ((2024, 11, 7), 583.94),
    ((2024, 11, 8), 584.55),
    ((2024, 11, 11), 565.16),
    ((2024, 11, 12), 589.03),
    ((2024, 11, 13), 591.67),
    ((2024, 11, 14), 591.31),
];

/// The fixed mock dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProjectionSource;

impl ProjectionSource for MockProjectionSource {
    fn resolve(&self, _query: &ProjectionQuery) -> Result<ProjectionSeries, AppError> {
        Ok(ProjectionSeries {
            clustered_projection: to_price_map(CLUSTERED)?,
            consolidated_projection: to_price_map(CONSOLIDATED)?,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn to_price_map(rows: &[((i32, u32, u32), f64)]) -> Result<PriceMap, AppError> {
    rows.iter()
        .map(|&((y, m, d), price)| {
            NaiveDate::from_ymd_opt(y, m, d)
                .map(|date| (date, price))
                .ok_or_else(|| AppError::from(anyhow::anyhow!("invalid mock date {y}-{m}-{d}")))
        })
        .collect()
}
