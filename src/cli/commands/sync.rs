//! Sync command implementation
//!
//! This module implements the `sync` command: a full refresh of the replica
//! from the registry followed by the geocoding pass.

use crate::adapters::store::SubjectStore;
use crate::config::{load_config, parse_entity_types};
use crate::core::status::{RunState, RunStatus};
use crate::core::sync::{store_is_fresh, SyncCoordinator, SyncOptions, SyncSummary};
use crate::domain::MunicipalityId;
use chrono::Utc;
use clap::Args;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Only sync these entity types (comma-separated: svj,bd)
    #[arg(long)]
    pub entity_type: Option<String>,

    /// Only sync these municipality codes (comma-separated), skipping enumeration
    #[arg(long)]
    pub municipality: Option<String>,

    /// Skip the geocoding phase
    #[arg(long)]
    pub skip_geocode: bool,

    /// Do nothing if the last completed sync finished less than N days ago
    #[arg(long, value_name = "DAYS")]
    pub if_older_than_days: Option<u32>,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting sync command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let options = match self.options() {
            Ok(o) => o,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };

        if let Some(days) = self.if_older_than_days {
            let store = match SubjectStore::open(&config.store.path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Failed to open store: {e}");
                    return Ok(5);
                }
            };
            if store_is_fresh(&store, days, Utc::now())? {
                tracing::info!(max_age_days = days, "Replica is fresh, skipping sync");
                println!("✅ Replica synced within the last {days} day(s), nothing to do.");
                return Ok(0);
            }
        }

        tracing::info!("Creating sync coordinator");
        let coordinator = match SyncCoordinator::new(&config, shutdown_signal) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create sync coordinator");
                eprintln!("Failed to initialize sync: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let printer = tokio::spawn(print_progress(coordinator.subscribe()));

        println!("🚀 Starting sync...");
        println!();

        let result = coordinator.execute(&options).await;
        printer.abort();

        let summary = match result {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Sync failed");
                eprintln!();
                eprintln!("Sync failed: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        print_summary(&summary);
        Ok(exit_code(&summary))
    }

    fn options(&self) -> anyhow::Result<SyncOptions> {
        let entity_types = match &self.entity_type {
            Some(raw) => parse_entity_types(raw)?,
            None => Vec::new(),
        };

        let municipalities = match &self.municipality {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| MunicipalityId::from_str(s).map_err(anyhow::Error::msg))
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(SyncOptions {
            entity_types,
            municipalities,
            skip_geocode: self.skip_geocode,
        })
    }
}

/// Redraws a single progress line whenever the run status changes
async fn print_progress(mut status: watch::Receiver<RunStatus>) {
    use std::io::Write;

    while status.changed().await.is_ok() {
        let snapshot = status.borrow_and_update().clone();
        if snapshot.state != RunState::Running || snapshot.total == 0 {
            continue;
        }
        let eta = snapshot
            .eta
            .map(format_duration)
            .unwrap_or_else(|| "?".to_string());
        print!(
            "\r  [{:5.1}%] {}/{} | OK: {} | Failed: {} | ~{} left | {:<30}",
            snapshot.percent,
            snapshot.processed,
            snapshot.total,
            snapshot.succeeded,
            snapshot.failed,
            eta,
            snapshot.message.chars().take(30).collect::<String>()
        );
        let _ = std::io::stdout().flush();
    }
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

fn print_summary(summary: &SyncSummary) {
    println!();
    println!();
    println!("📊 Sync Summary:");
    println!("  Municipalities: {}", summary.total_municipalities);
    if summary.degraded_regions {
        println!("  ⚠️  Gazetteer unavailable, built-in municipality list used");
    }
    println!("  Partitions: {}", summary.partitions_processed);
    println!("  Records Fetched: {}", summary.records_fetched);
    println!("  Written: {}", summary.records_written);
    println!("  Unchanged: {}", summary.records_unchanged);
    println!("  Failed Pages: {}", summary.failed_pages);
    if let Some(geocode) = &summary.geocode {
        println!("  Geocoded: {}/{}", geocode.processed, geocode.total);
        println!("    Succeeded: {}", geocode.succeeded);
        println!("    Failed: {}", geocode.failed);
    }
    println!("  Duration: {}", format_duration(summary.duration));
    println!();

    if !summary.errors.is_empty() {
        println!("⚠️  Errors encountered:");
        for error in summary.errors.iter().take(20) {
            println!("  - {:?}: {}", error.kind, error.message);
            if let Some(context) = &error.context {
                println!("    Context: {context}");
            }
        }
        if summary.errors.len() > 20 {
            println!("  ... and {} more", summary.errors.len() - 20);
        }
        println!();
    }
}

fn exit_code(summary: &SyncSummary) -> i32 {
    if summary.interrupted {
        println!("⚠️  Sync interrupted gracefully. Committed progress is kept.");
        println!("   Run the same command to continue.");
        tracing::info!("Sync interrupted by user signal");
        130
    } else if summary.is_successful() {
        println!("✅ Sync completed successfully!");
        0
    } else {
        println!("⚠️  Sync completed with errors");
        1 // Partial success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityType;

    fn args() -> SyncArgs {
        SyncArgs {
            entity_type: None,
            municipality: None,
            skip_geocode: false,
            if_older_than_days: None,
        }
    }

    #[test]
    fn test_default_options() {
        assert_eq!(args().options().unwrap(), SyncOptions::default());
    }

    #[test]
    fn test_options_with_overrides() {
        let args = SyncArgs {
            entity_type: Some("bd".to_string()),
            municipality: Some("582786, 554782".to_string()),
            skip_geocode: true,
            ..args()
        };

        let options = args.options().unwrap();
        assert_eq!(options.entity_types, vec![EntityType::Bd]);
        assert_eq!(
            options.municipalities,
            vec![MunicipalityId::new(582786), MunicipalityId::new(554782)]
        );
        assert!(options.skip_geocode);
    }

    #[test]
    fn test_invalid_municipality_rejected() {
        let args = SyncArgs {
            municipality: Some("brno".to_string()),
            ..args()
        };
        assert!(args.options().is_err());
    }

    #[test]
    fn test_exit_codes() {
        let mut summary = SyncSummary::new();
        assert_eq!(exit_code(&summary), 0);

        summary.failed_pages = 2;
        assert_eq!(exit_code(&summary), 1);

        summary.interrupted = true;
        assert_eq!(exit_code(&summary), 130);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(7260)), "2h 1m");
    }
}
