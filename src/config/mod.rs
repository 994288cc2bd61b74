//! Configuration management for Prvotkar.
//!
//! Prvotkar uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PRVOTKAR_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use prvotkar::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("prvotkar.toml")?;
//!
//! println!("Store: {}", config.store.path);
//! println!("Registry: {}", config.registry.base_url);
//! println!("Geocoder gap: {} ms", config.geocoding.min_delay_ms);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [store]
//! path = "prvotkar.db"
//!
//! [gazetteer]
//! api_key = "${PRVOTKAR_RUIAN_API_KEY}"
//!
//! [registry]
//! entity_types = ["svj", "bd"]
//! max_prefix_depth = 2
//!
//! [geocoding]
//! user_agent = "Prvotkar/0.3 (ops@example.com)"
//! min_delay_ms = 1100
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config, parse_entity_types};
pub use schema::{
    ApplicationConfig, GazetteerConfig, GeocodingConfig, LoggingConfig, PrvotkarConfig,
    RegistryConfig, RetryConfig, StoreConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
