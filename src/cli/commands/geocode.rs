//! Geocode command implementation
//!
//! Runs only the geocoding pass over subjects still pending. Safe to stop
//! and rerun at any point.

use crate::adapters::store::SubjectStore;
use crate::cli::commands::sync::format_duration;
use crate::config::load_config;
use crate::core::geocode::GeocodingPipeline;
use crate::core::status::StatusTracker;
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the geocode command
#[derive(Args, Debug)]
pub struct GeocodeArgs {}

impl GeocodeArgs {
    /// Execute the geocode command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting geocode command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let store = match SubjectStore::open(&config.store.path) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                eprintln!("Failed to open store: {e}");
                return Ok(5);
            }
        };

        let pending = store.stats()?.geocode_pending;
        println!("🌍 Geocoding {pending} pending subject(s)");
        println!(
            "   At most one request every {} ms, estimated {}",
            config.geocoding.min_delay_ms,
            format_duration(config.geocoding.min_delay() * pending.min(u32::MAX as u64) as u32)
        );
        println!();

        let pipeline = match GeocodingPipeline::from_config(
            &config,
            store,
            StatusTracker::new(),
            shutdown_signal,
        ) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to initialize geocoder: {e}");
                return Ok(4);
            }
        };

        let summary = match pipeline.run().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Geocoding failed");
                eprintln!("Geocoding failed: {e}");
                return Ok(5);
            }
        };

        println!("📊 Geocoding Summary:");
        println!("  Processed: {}/{}", summary.processed, summary.total);
        println!("  Succeeded: {}", summary.succeeded);
        println!("  Failed: {}", summary.failed);
        println!("  Without address: {}", summary.without_address);
        println!("  Duration: {}", format_duration(summary.duration));
        println!();

        if summary.interrupted {
            println!("⚠️  Geocoding interrupted. {} subject(s) still pending.", summary.remaining());
            return Ok(130);
        }

        println!("✅ Geocoding complete");
        Ok(0)
    }
}
