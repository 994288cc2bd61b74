//! Configuration schema types
//!
//! This module defines the configuration structure for Prvotkar. Every
//! section has serde defaults so a minimal file only needs the gazetteer
//! API key.

use crate::config::SecretString;
use crate::domain::EntityType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main Prvotkar configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrvotkarConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Local replica store
    #[serde(default)]
    pub store: StoreConfig,

    /// Region/municipality gazetteer
    #[serde(default)]
    pub gazetteer: GazetteerConfig,

    /// Business registry search
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Geocoding pass
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PrvotkarConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.store.validate()?;
        self.gazetteer.validate()?;
        self.registry.validate()?;
        self.geocoding.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// SQLite replica location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the database file (created on first use)
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl StoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("store.path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Retry policy shared by the HTTP adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait before retrying a transient failure
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Wait before retrying after an HTTP 429
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,
}

impl RetryConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(format!("{section}.retry.max_attempts must be between 1 and 10"));
        }
        if self.rate_limit_backoff_ms < self.backoff_ms {
            return Err(format!(
                "{section}.retry.rate_limit_backoff_ms must be >= backoff_ms"
            ));
        }
        Ok(())
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
        }
    }
}

/// Gazetteer (RÚIAN building API) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteerConfig {
    /// Base URL of the gazetteer API
    #[serde(default = "default_gazetteer_base_url")]
    pub base_url: String,

    /// API key sent as the `apiKey` query parameter
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_gazetteer_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Pause between per-region municipality requests
    #[serde(default = "default_region_delay_ms")]
    pub region_delay_ms: u64,

    /// Retry configuration
    #[serde(default = "default_gazetteer_retry")]
    pub retry: RetryConfig,
}

impl GazetteerConfig {
    fn validate(&self) -> Result<(), String> {
        validate_url("gazetteer.base_url", &self.base_url)?;
        if self.timeout_seconds == 0 {
            return Err("gazetteer.timeout_seconds must be > 0".to_string());
        }
        self.retry.validate("gazetteer")
    }
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            base_url: default_gazetteer_base_url(),
            api_key: None,
            timeout_seconds: default_gazetteer_timeout_seconds(),
            region_delay_ms: default_region_delay_ms(),
            retry: default_gazetteer_retry(),
        }
    }
}

/// Business registry (ARES) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the registry REST API
    #[serde(default = "default_registry_base_url")]
    pub base_url: String,

    /// Entity types to sync, in order
    #[serde(default = "default_entity_types")]
    pub entity_types: Vec<EntityType>,

    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Hard stop for a partition whose pages never run short
    #[serde(default = "default_max_pages_per_partition")]
    pub max_pages_per_partition: usize,

    /// Maximum name-prefix length used to split an overflowing search
    #[serde(default = "default_max_prefix_depth")]
    pub max_prefix_depth: usize,

    /// Pause between consecutive page requests
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Pause between municipalities
    #[serde(default = "default_municipality_delay_ms")]
    pub municipality_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_registry_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl RegistryConfig {
    fn validate(&self) -> Result<(), String> {
        validate_url("registry.base_url", &self.base_url)?;

        if self.entity_types.is_empty() {
            return Err("registry.entity_types cannot be empty".to_string());
        }

        if self.page_size == 0 || self.page_size > 1000 {
            return Err("registry.page_size must be between 1 and 1000".to_string());
        }

        if self.max_pages_per_partition == 0 {
            return Err("registry.max_pages_per_partition must be > 0".to_string());
        }

        if self.max_prefix_depth == 0 || self.max_prefix_depth > 3 {
            return Err("registry.max_prefix_depth must be between 1 and 3".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("registry.timeout_seconds must be > 0".to_string());
        }

        self.retry.validate("registry")
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_base_url(),
            entity_types: default_entity_types(),
            page_size: default_page_size(),
            max_pages_per_partition: default_max_pages_per_partition(),
            max_prefix_depth: default_max_prefix_depth(),
            page_delay_ms: default_page_delay_ms(),
            municipality_delay_ms: default_municipality_delay_ms(),
            timeout_seconds: default_registry_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

/// Geocoding (Nominatim) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Run the geocoding phase at the end of `sync`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the geocoding service
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,

    /// Identifying User-Agent required by the provider's usage policy
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Country name appended to every free-text query
    #[serde(default = "default_country_name")]
    pub country_name: String,

    /// ISO country filter passed to the provider
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Minimum gap between consecutive requests
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Results buffered before a commit
    #[serde(default = "default_commit_every")]
    pub commit_every: usize,

    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Attempts after which `retry-failed` leaves a subject failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl GeocodingConfig {
    fn validate(&self) -> Result<(), String> {
        validate_url("geocoding.base_url", &self.base_url)?;

        if self.user_agent.trim().is_empty() {
            return Err("geocoding.user_agent cannot be empty".to_string());
        }

        // Nominatim usage policy: at most one request per second
        if self.min_delay_ms < 1000 {
            return Err("geocoding.min_delay_ms must be >= 1000".to_string());
        }

        if self.commit_every == 0 {
            return Err("geocoding.commit_every must be > 0".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("geocoding.timeout_seconds must be > 0".to_string());
        }

        if self.max_attempts == 0 {
            return Err("geocoding.max_attempts must be > 0".to_string());
        }

        Ok(())
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            country_name: default_country_name(),
            country_code: default_country_code(),
            min_delay_ms: default_min_delay_ms(),
            commit_every: default_commit_every(),
            timeout_seconds: default_geocoding_timeout_seconds(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    let parsed = url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!("{field} must start with http:// or https://"));
    }
    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_store_path() -> String {
    "prvotkar.db".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    5000
}

fn default_rate_limit_backoff_ms() -> u64 {
    30_000
}

fn default_gazetteer_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        backoff_ms: 3000,
        rate_limit_backoff_ms: 30_000,
    }
}

fn default_gazetteer_base_url() -> String {
    "https://ruian.fnx.io/api/v1/ruian/build".to_string()
}

fn default_gazetteer_timeout_seconds() -> u64 {
    20
}

fn default_region_delay_ms() -> u64 {
    300
}

fn default_registry_base_url() -> String {
    "https://ares.gov.cz/ekonomicke-subjekty-v-be/rest".to_string()
}

fn default_entity_types() -> Vec<EntityType> {
    EntityType::ALL.to_vec()
}

fn default_page_size() -> usize {
    1000
}

fn default_max_pages_per_partition() -> usize {
    50
}

fn default_max_prefix_depth() -> usize {
    2
}

fn default_page_delay_ms() -> u64 {
    200
}

fn default_municipality_delay_ms() -> u64 {
    120
}

fn default_registry_timeout_seconds() -> u64 {
    30
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    format!(
        "Prvotkar/{} (https://github.com/prvotkar/prvotkar)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_country_name() -> String {
    "Česká republika".to_string()
}

fn default_country_code() -> String {
    "cz".to_string()
}

fn default_min_delay_ms() -> u64 {
    1100
}

fn default_commit_every() -> usize {
    100
}

fn default_geocoding_timeout_seconds() -> u64 {
    10
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PrvotkarConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.registry.page_size, 1000);
        assert_eq!(config.geocoding.min_delay_ms, 1100);
        assert_eq!(config.registry.entity_types, vec![EntityType::Svj, EntityType::Bd]);
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_registry_config_validation() {
        let mut config = RegistryConfig::default();
        assert!(config.validate().is_ok());

        config.page_size = 0;
        assert!(config.validate().is_err());

        config.page_size = 1001;
        assert!(config.validate().is_err());

        config.page_size = 1000;
        config.max_prefix_depth = 4;
        assert!(config.validate().is_err());

        config.max_prefix_depth = 2;
        config.entity_types.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_registry_url_must_be_http() {
        let config = RegistryConfig {
            base_url: "ftp://ares.gov.cz".to_string(),
            ..RegistryConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RegistryConfig {
            base_url: "not a url".to_string(),
            ..RegistryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_geocoding_rate_floor() {
        let mut config = GeocodingConfig::default();
        config.min_delay_ms = 999;
        let err = config.validate().unwrap_err();
        assert!(err.contains("min_delay_ms"));

        config.min_delay_ms = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_geocoding_commit_every_positive() {
        let config = GeocodingConfig {
            commit_every: 0,
            ..GeocodingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_validation() {
        let mut retry = RetryConfig::default();
        assert!(retry.validate("registry").is_ok());

        retry.max_attempts = 0;
        assert!(retry.validate("registry").is_err());

        retry.max_attempts = 3;
        retry.rate_limit_backoff_ms = 10;
        assert!(retry.validate("registry").is_err());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "size".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_entity_types_deserialize_lowercase() {
        let config: RegistryConfig = toml::from_str(r#"entity_types = ["bd"]"#).unwrap();
        assert_eq!(config.entity_types, vec![EntityType::Bd]);
        assert_eq!(config.page_size, 1000);
    }
}
