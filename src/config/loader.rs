//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::PrvotkarConfig;
use super::secret::secret_string;
use crate::domain::errors::PrvotkarError;
use crate::domain::result::Result;
use crate::domain::EntityType;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PrvotkarConfig
/// 4. Applies environment variable overrides (PRVOTKAR_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use prvotkar::config::loader::load_config;
///
/// let config = load_config("prvotkar.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PrvotkarConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PrvotkarError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PrvotkarError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text, applying the same substitution,
/// overrides and validation as [`load_config`]
pub fn parse_config(contents: &str) -> Result<PrvotkarConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: PrvotkarConfig = toml::from_str(&contents)
        .map_err(|e| PrvotkarError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        PrvotkarError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched so commented-out examples don't demand
/// variables that are never used.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| PrvotkarError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(PrvotkarError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the PRVOTKAR_* prefix
///
/// Environment variables follow the pattern: PRVOTKAR_<SECTION>_<KEY>
/// For example: PRVOTKAR_STORE_PATH, PRVOTKAR_REGISTRY_PAGE_SIZE
fn apply_env_overrides(config: &mut PrvotkarConfig) -> Result<()> {
    if let Ok(val) = std::env::var("PRVOTKAR_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("PRVOTKAR_STORE_PATH") {
        config.store.path = val;
    }

    // Gazetteer overrides
    if let Ok(val) = std::env::var("PRVOTKAR_GAZETTEER_BASE_URL") {
        config.gazetteer.base_url = val;
    }
    if let Ok(val) = std::env::var("PRVOTKAR_GAZETTEER_API_KEY") {
        config.gazetteer.api_key = Some(secret_string(val));
    }

    // Registry overrides
    if let Ok(val) = std::env::var("PRVOTKAR_REGISTRY_BASE_URL") {
        config.registry.base_url = val;
    }
    if let Ok(val) = std::env::var("PRVOTKAR_REGISTRY_ENTITY_TYPES") {
        config.registry.entity_types = parse_entity_types(&val)?;
    }
    if let Ok(val) = std::env::var("PRVOTKAR_REGISTRY_PAGE_SIZE") {
        config.registry.page_size = parse_number("PRVOTKAR_REGISTRY_PAGE_SIZE", &val)?;
    }
    if let Ok(val) = std::env::var("PRVOTKAR_REGISTRY_MAX_PREFIX_DEPTH") {
        config.registry.max_prefix_depth =
            parse_number("PRVOTKAR_REGISTRY_MAX_PREFIX_DEPTH", &val)?;
    }

    // Geocoding overrides
    if let Ok(val) = std::env::var("PRVOTKAR_GEOCODING_ENABLED") {
        config.geocoding.enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("PRVOTKAR_GEOCODING_BASE_URL") {
        config.geocoding.base_url = val;
    }
    if let Ok(val) = std::env::var("PRVOTKAR_GEOCODING_USER_AGENT") {
        config.geocoding.user_agent = val;
    }
    if let Ok(val) = std::env::var("PRVOTKAR_GEOCODING_MIN_DELAY_MS") {
        config.geocoding.min_delay_ms = parse_number("PRVOTKAR_GEOCODING_MIN_DELAY_MS", &val)?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("PRVOTKAR_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("PRVOTKAR_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PrvotkarError::Configuration(format!("{name} must be a number, got '{raw}'")))
}

/// Parses a comma-separated entity type list such as `svj,bd`
pub fn parse_entity_types(raw: &str) -> Result<Vec<EntityType>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| EntityType::from_str(s).map_err(PrvotkarError::Configuration))
        .collect()
}
