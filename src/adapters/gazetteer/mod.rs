//! Region and municipality gazetteer
//!
//! The [`Gazetteer`] trait abstracts the administrative-unit lookup so the
//! region enumerator can be driven by an in-memory fake in tests.

pub mod client;
pub mod models;

pub use client::RuianGazetteer;

use crate::domain::{HttpError, Municipality, Region};
use async_trait::async_trait;

#[async_trait]
pub trait Gazetteer: Send + Sync {
    /// Lists all top-level regions
    async fn regions(&self) -> Result<Vec<Region>, HttpError>;

    /// Lists the municipalities of one region
    async fn municipalities(&self, region: &Region) -> Result<Vec<Municipality>, HttpError>;
}
