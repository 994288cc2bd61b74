//! Geocoding of stored subjects

pub mod pipeline;
pub mod query;

pub use pipeline::{GeocodeSettings, GeocodeSummary, GeocodingPipeline};
pub use query::build_query;
