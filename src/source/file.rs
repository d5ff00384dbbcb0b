//! # source::file
//!
//! Serves projections from a JSON file shaped like the response payload:
//!
//! ```json
//! {
//!   "clusteredProjection":    { "2024-10-29": 573.2 },
//!   "consolidatedProjection": { "2024-10-29": 573.6 }
//! }
//! ```
//!
//! The file is re-read on every request so it can be edited while the server
//! runs.  Any read or parse failure becomes a 500.

use std::path::PathBuf;

use anyhow::Context;
use tracing::debug;

use super::ProjectionSource;
use crate::error::AppError;
use crate::models::{ProjectionQuery, ProjectionSeries};

#[derive(Debug, Clone)]
pub struct FileProjectionSource {
    path: PathBuf,
}

impl FileProjectionSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ProjectionSource for FileProjectionSource {
    fn resolve(&self, query: &ProjectionQuery) -> Result<ProjectionSeries, AppError> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;

        let series: ProjectionSeries = serde_json::from_str(&raw)
            .with_context(|| format!("invalid projection file {}", self.path.display()))?;

        debug!(
            ticker       = %query.ticker,
            clustered    = series.clustered_projection.len(),
            consolidated = series.consolidated_projection.len(),
            "Projection file loaded"
        );

        Ok(series)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_both_variants() {
        let file = write_temp(
            r#"{
                "clusteredProjection":    { "2024-11-01": 565.03, "2024-10-29": 573.2 },
                "consolidatedProjection": { "2024-10-29": 573.6 }
            }"#,
        );
        let source = FileProjectionSource::new(file.path().to_path_buf());

        let series = source.resolve(&ProjectionQuery::default()).unwrap();

        let first = NaiveDate::from_ymd_opt(2024, 10, 29).unwrap();
        assert_eq!(series.clustered_projection.len(), 2);
        assert_eq!(series.clustered_projection.keys().next(), Some(&first));
        assert_eq!(series.consolidated_projection[&first], 573.6);
    }

    #[test]
    fn malformed_file_is_internal_error() {
        let file = write_temp(r#"{ "clusteredProjection": { "not-a-date": 1.0 } }"#);
        let source = FileProjectionSource::new(file.path().to_path_buf());

        let err = source.resolve(&ProjectionQuery::default()).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn missing_file_is_internal_error() {
        let source = FileProjectionSource::new(PathBuf::from("/nonexistent/projections.json"));
        let err = source.resolve(&ProjectionQuery::default()).unwrap_err();
        assert!(err.to_string().starts_with("Error generating predictions: cannot read"));
    }
}
