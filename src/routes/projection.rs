//! # routes::projection
//!
//! | Method | Path                        | Description                              |
//! |--------|-----------------------------|------------------------------------------|
//! | POST   | `/projection/single-ticker` | Projections for one ticker (JSON body)   |
//! | GET    | `/projection/single-ticker` | Same, via query string (browser testing) |

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::info;

use crate::{
    error::AppError,
    models::{ProjectionQuery, ProjectionResponse},
    state::SharedState,
};

// ─── POST /projection/single-ticker ───────────────────────────────────────────

/// Price projections for a single ticker.
///
/// ### Request body (JSON, every field optional)
/// ```json
/// { "ticker": "SPY", "timeframe": "daily", "start_date": "2024-10-28" }
/// ```
///
/// ### Response
/// * `200 OK` with `{ ticker, timeframe, startDate, clusteredProjection, consolidatedProjection }`;
///   the three query fields are echoed verbatim
/// * `500` with `{ "ok": false, "detail": "Error generating predictions: ..." }`
pub async fn post_projection(
    State(state): State<SharedState>,
    Json(query): Json<ProjectionQuery>,
) -> Result<Json<ProjectionResponse>, AppError> {
    resolve(&state, query)
}

// ─── GET /projection/single-ticker ────────────────────────────────────────────

/// GET form of [`post_projection`]: `?ticker=SPY&timeframe=daily&start_date=2024-10-28`.
pub async fn get_projection(
    State(state): State<SharedState>,
    Query(query): Query<ProjectionQuery>,
) -> Result<Json<ProjectionResponse>, AppError> {
    resolve(&state, query)
}

fn resolve(state: &SharedState, query: ProjectionQuery) -> Result<Json<ProjectionResponse>, AppError> {
    let series = state.source.resolve(&query)?;

    info!(
        ticker       = %query.ticker,
        timeframe    = %query.timeframe,
        start_date   = %query.start_date,
        source       = state.source.name(),
        clustered    = series.clustered_projection.len(),
        consolidated = series.consolidated_projection.len(),
        "📈 Projection served"
    );

    Ok(Json(ProjectionResponse::new(query, series)))
}
