//! Domain error types
//!
//! This module defines the error hierarchy for Prvotkar.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Prvotkar error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum PrvotkarError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors talking to the gazetteer, registry or geocoding service
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Local replica store errors
    #[error("Store error: {0}")]
    Store(String),

    /// A partition still reported overflow at the deepest allowed prefix
    #[error(
        "Unresolved coverage for {entity_type} in municipality {municipality}: prefixes {prefixes:?} still exceed the result ceiling"
    )]
    UnresolvedCoverage {
        entity_type: String,
        municipality: u32,
        prefixes: Vec<String>,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// HTTP-level errors
///
/// Shared by all three upstream services. The variants carry enough
/// classification for the retry policy to decide what to do next.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// Failed to reach the server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request exceeded its timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// HTTP 429
    #[error("Rate limited by upstream service: {0}")]
    RateLimited(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx other than 429)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Body could not be decoded into the expected shape
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl HttpError {
    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HttpError::ConnectionFailed(_)
                | HttpError::Timeout(_)
                | HttpError::RateLimited(_)
                | HttpError::ServerError { .. }
        )
    }

    /// Whether the upstream asked us to slow down
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, HttpError::RateLimited(_))
    }

    /// Classifies a transport error raised by reqwest
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_decode() {
            HttpError::InvalidResponse(err.to_string())
        } else {
            HttpError::ConnectionFailed(err.to_string())
        }
    }

    /// Classifies a non-success status code
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => HttpError::RateLimited(message),
            500..=599 => HttpError::ServerError { status, message },
            _ => HttpError::ClientError { status, message },
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for PrvotkarError {
    fn from(err: std::io::Error) -> Self {
        PrvotkarError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PrvotkarError {
    fn from(err: serde_json::Error) -> Self {
        PrvotkarError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PrvotkarError {
    fn from(err: toml::de::Error) -> Self {
        PrvotkarError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from SQLite errors
impl From<rusqlite::Error> for PrvotkarError {
    fn from(err: rusqlite::Error) -> Self {
        PrvotkarError::Store(err.to_string())
    }
}
