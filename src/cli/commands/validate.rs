//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Prvotkar configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let entity_types = config
            .registry
            .entity_types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Store: {}", config.store.path);
        println!("  Gazetteer: {}", config.gazetteer.base_url);
        println!(
            "  Gazetteer API Key: {}",
            if config.gazetteer.api_key.is_some() {
                "set"
            } else {
                "not set (built-in municipality list will be used)"
            }
        );
        println!("  Registry: {}", config.registry.base_url);
        println!("  Entity Types: {entity_types}");
        println!("  Page Size: {}", config.registry.page_size);
        println!("  Max Prefix Depth: {}", config.registry.max_prefix_depth);
        if config.geocoding.enabled {
            println!("  Geocoder: {}", config.geocoding.base_url);
            println!("  Geocoder Gap: {} ms", config.geocoding.min_delay_ms);
            println!("  User-Agent: {}", config.geocoding.user_agent);
        } else {
            println!("  Geocoder: disabled");
        }
        println!();
        Ok(0)
    }
}
