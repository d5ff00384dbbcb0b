//! # state
//!
//! Shared application state injected into every Axum handler.
//!
//! The provider is stateless per request: the only thing handlers share is the
//! projection source, which is chosen once at startup and never mutated, so no
//! lock is needed.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::source::{build_source, ProjectionSource};

// ─── AppState ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    /// Resolves every `/projection/single-ticker` query.
    pub source: Arc<dyn ProjectionSource>,
}

impl AppState {
    pub fn new(source: Arc<dyn ProjectionSource>) -> Self {
        Self { source }
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

/// Construct the shared state with the source selected by `config`.
pub fn build_state(config: &ServerConfig) -> SharedState {
    Arc::new(AppState::new(build_source(config)))
}
