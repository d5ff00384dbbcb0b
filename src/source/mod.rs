//! # source
//!
//! Where projection data comes from.
//!
//! Handlers only ever see `Arc<dyn ProjectionSource>`; swapping the canned
//! dataset for a real forecasting backend means adding an implementation here
//! and selecting it in [`build_source`], nothing in `routes` changes.

use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::models::{ProjectionQuery, ProjectionSeries};

pub mod file;
pub mod mock;

pub use file::FileProjectionSource;
pub use mock::MockProjectionSource;

/// Resolves a query into the clustered and consolidated projection series.
pub trait ProjectionSource: Send + Sync {
    fn resolve(&self, query: &ProjectionQuery) -> Result<ProjectionSeries, AppError>;

    /// Short label for logs and the health payload.
    fn name(&self) -> &'static str;
}

/// Pick the data source from configuration.
///
/// `PROJECTION_DATA_PATH` set → [`FileProjectionSource`], otherwise the
/// built-in [`MockProjectionSource`].
pub fn build_source(config: &ServerConfig) -> Arc<dyn ProjectionSource> {
    match &config.projection_data_path {
        Some(path) => {
            info!(path = %path.display(), "Serving projections from file");
            Arc::new(FileProjectionSource::new(path.clone()))
        }
        None => {
            info!("PROJECTION_DATA_PATH not set — serving MOCK projections");
            Arc::new(MockProjectionSource)
        }
    }
}
