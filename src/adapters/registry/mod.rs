//! Business registry search
//!
//! The [`RegistrySource`] trait exposes one paged search call. Pagination,
//! overflow refinement and pacing live in the fetcher; implementations only
//! translate a [`SearchQuery`] into a request and classify the answer.

pub mod client;
pub mod models;

pub use client::AresRegistry;
pub use models::{RawSubject, SearchPage, SearchQuery, OVERFLOW_SUBCODE};

use crate::domain::HttpError;
use async_trait::async_trait;

#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Runs one page of a filtered search
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, HttpError>;
}
