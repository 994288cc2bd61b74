//! Logging and observability
//!
//! Structured logging through `tracing`, with console output and optional
//! JSON files rotated by `tracing-appender`.
//!
//! # Example
//!
//! ```no_run
//! use prvotkar::logging::init_logging;
//! use prvotkar::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(municipality = 582786, "Fetching subjects");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use prvotkar::log_retry_attempt;
///
/// log_retry_attempt!("registry search", 2, 3, 5000u64, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($operation:expr, $attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            operation = $operation,
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying request after error"
        );
    };
}

/// Log that an overflowing search partition is being split by name prefix
///
/// # Example
///
/// ```no_run
/// use prvotkar::log_partition_refined;
///
/// log_partition_refined!("svj", 582786u32, "S", 2usize);
/// ```
#[macro_export]
macro_rules! log_partition_refined {
    ($entity_type:expr, $municipality:expr, $prefix:expr, $depth:expr) => {
        tracing::info!(
            entity_type = %$entity_type,
            municipality = %$municipality,
            prefix = $prefix,
            next_depth = $depth,
            "Result ceiling exceeded, splitting by name prefix"
        );
    };
}
