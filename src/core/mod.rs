//! Core business logic for Prvotkar.
//!
//! # Modules
//!
//! - [`regions`] - Municipality enumeration with a built-in fallback
//! - [`sync`] - Partitioned registry fetch, upsert and the run coordinator
//! - [`geocode`] - Resumable, rate-limited geocoding pass
//! - [`pacing`] - Minimum-gap request gates
//! - [`status`] - Run status published over a watch channel
//!
//! # Sync Workflow
//!
//! 1. **Enumerate**: list every municipality from the gazetteer
//! 2. **Fetch**: page through the registry per entity type and municipality,
//!    splitting overflowing searches by name prefix
//! 3. **Upsert**: commit each page as it arrives, touching only changed rows
//! 4. **Geocode**: resolve coordinates for every pending subject
//!
//! # Example
//!
//! ```rust,no_run
//! use prvotkar::config::load_config;
//! use prvotkar::core::sync::{SyncCoordinator, SyncOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("prvotkar.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = SyncCoordinator::new(&config, shutdown_rx)?;
//! let summary = coordinator.execute(&SyncOptions::default()).await?;
//!
//! println!("Fetched: {}", summary.records_fetched);
//! println!("Written: {}", summary.records_written);
//! # Ok(())
//! # }
//! ```

pub mod geocode;
pub mod pacing;
pub mod regions;
pub mod status;
pub mod sync;
