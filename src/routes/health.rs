//! # routes::health
//!
//! Liveness banner and health check.  Neither touches the projection source.

use axum::Json;
use serde_json::{json, Value};

/// Human-readable service name reported by both endpoints.
pub const SERVICE_NAME: &str = "Mock Numin API";

// ─── GET / ────────────────────────────────────────────────────────────────────

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": format!("{SERVICE_NAME} is running"),
        "health":  "/health",
    }))
}

// ─── GET /health ──────────────────────────────────────────────────────────────

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status":  "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
