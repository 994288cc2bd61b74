//! Address geocoding
//!
//! One free-text query in, at most one coordinate pair out.

pub mod client;

pub use client::NominatimGeocoder;

use crate::domain::{Coordinates, HttpError};
use async_trait::async_trait;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves a free-text address. `Ok(None)` means the provider found
    /// nothing.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, HttpError>;
}
