// Prvotkar - Czech SVJ/BD registry replica with geocoding
// Copyright (c) 2025 Prvotkar Contributors
// Licensed under the MIT License

//! # Prvotkar - SVJ/BD registry replica
//!
//! Prvotkar keeps a local SQLite copy of every owners' association (SVJ) and
//! housing cooperative (BD) registered in the Czech ARES registry, and
//! attaches coordinates to their seats through a Nominatim geocoder.
//!
//! ## Overview
//!
//! A sync run:
//! - **Enumerates** municipalities region by region from the RÚIAN gazetteer,
//!   falling back to a built-in list of large municipalities
//! - **Fetches** subjects per entity type and municipality, splitting a
//!   search that overflows the registry's result window by name prefix
//! - **Upserts** normalized rows, never touching stored coordinates
//! - **Geocodes** pending rows one request at a time, committing as it goes
//!
//! Every phase stops at the next safe point on a shutdown signal, and a rerun
//! picks up where the last one stopped.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Sync orchestration, prefix refinement, geocoding, pacing, status
//! - [`adapters`] - External integrations (ARES, RÚIAN, Nominatim, SQLite)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prvotkar::config::load_config;
//! use prvotkar::core::sync::{SyncCoordinator, SyncOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("prvotkar.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//!     let coordinator = SyncCoordinator::new(&config, shutdown_rx)?;
//!     let summary = coordinator.execute(&SyncOptions::default()).await?;
//!
//!     println!("Wrote {} subjects", summary.records_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`], built on
//! [`domain::PrvotkarError`]. Problems limited to a single municipality are
//! recorded in the run summary instead of aborting the run.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
