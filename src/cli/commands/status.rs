//! Status command implementation
//!
//! This module implements the `status` command: a summary of what the
//! replica currently holds.

use crate::adapters::store::{StoreStats, SubjectStore};
use crate::config::load_config;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking replica status");

        println!("📊 Replica Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let store = match SubjectStore::open(&config.store.path) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open store");
                println!("   Error: {e}");
                return Ok(5);
            }
        };

        let stats = match store.stats() {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to read store");
                println!("   Error: {e}");
                return Ok(5);
            }
        };

        if stats.total == 0 {
            println!("The replica at {} is empty.", config.store.path);
            println!("Run 'prvotkar sync' to populate it.");
            return Ok(0);
        }

        print_stats(&config.store.path, &stats);
        Ok(0)
    }
}

fn print_stats(path: &str, stats: &StoreStats) {
    println!("  Store: {path}");
    println!("  Subjects: {}", stats.total);
    println!("    SVJ: {}", stats.svj);
    println!("    BD: {}", stats.bd);
    println!("  Municipalities: {}", stats.municipalities);
    println!("  Geocoding:");
    println!("    Succeeded: {}", stats.geocode_succeeded);
    println!("    Failed: {}", stats.geocode_failed);
    println!("    Pending: {}", stats.geocode_pending);
    println!(
        "  Last Update: {}",
        stats
            .last_updated
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "Never".to_string())
    );
    println!(
        "  Last Sync: {}",
        stats
            .last_sync
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "Never".to_string())
    );
    println!();
}
