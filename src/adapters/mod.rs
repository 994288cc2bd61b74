//! External system integrations for Prvotkar.
//!
//! - [`gazetteer`] - RÚIAN address register (regions and municipalities)
//! - [`registry`] - ARES business register search
//! - [`geocoder`] - Nominatim address geocoding
//! - [`store`] - SQLite replica
//!
//! The three remote services sit behind traits so the core pipelines can be
//! driven by test doubles. [`retry`] and [`http`] hold the request plumbing
//! they share.
//!
//! ```rust,no_run
//! use prvotkar::adapters::registry::{AresRegistry, RegistrySource, SearchQuery};
//! use prvotkar::config::RegistryConfig;
//! use prvotkar::domain::{EntityType, MunicipalityId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = AresRegistry::new(&RegistryConfig::default())?;
//! let query = SearchQuery::first_page(EntityType::Svj, MunicipalityId::new(582786), None, 1000);
//! let page = registry.search(&query).await?;
//! println!("{} records, overflow: {}", page.records.len(), page.overflow);
//! # Ok(())
//! # }
//! ```

pub mod gazetteer;
pub mod geocoder;
pub mod http;
pub mod registry;
pub mod retry;
pub mod store;
