//! HTTP surface of the mock projection API.

pub mod health;
pub mod projection;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::SharedState;

/// Build the full router: routes, CORS and request tracing.
///
/// CORS is wide open because the consumer is a hosted backtesting runtime
/// whose origin we do not control.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Service ───────────────────────────────────────────────────────────
        .route("/",                          get(health::root))
        .route("/health",                    get(health::health_check))
        // ── Projections ───────────────────────────────────────────────────────
        .route(
            "/projection/single-ticker",
            get(projection::get_projection).post(projection::post_projection),
        )
        // ── Middleware ────────────────────────────────────────────────────────
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
