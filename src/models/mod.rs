//! Wire models served by the mock projection API.

pub mod projection;

pub use projection::{PriceMap, ProjectionQuery, ProjectionResponse, ProjectionSeries};
