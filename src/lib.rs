//! # Numin Mock — projection provider
//!
//! A stand-in for the Numin forecasting backend.  It answers one question,
//! "what are the projected prices for this ticker from this date?", with two
//! parallel date → price series (`clusteredProjection` and
//! `consolidatedProjection`).  The data comes from a pluggable
//! [`source::ProjectionSource`]; out of the box that is a fixed SPY dataset.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod source;
pub mod state;

pub use routes::build_router;
pub use state::{build_state, AppState, SharedState};
