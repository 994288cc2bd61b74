//! reqwest plumbing shared by the upstream clients

use crate::domain::{HttpError, PrvotkarError, Result};
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Builds an HTTP client with the given request timeout and User-Agent
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(user_agent)
        .build()
        .map_err(|e| PrvotkarError::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Default User-Agent for the gazetteer and registry clients
pub fn default_user_agent() -> String {
    format!("prvotkar/{}", env!("CARGO_PKG_VERSION"))
}

/// Maps a non-success status to an [`HttpError`], otherwise decodes the body
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> std::result::Result<T, HttpError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(HttpError::from_status(status.as_u16(), truncate(&body, 300)));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| HttpError::InvalidResponse(e.to_string()))
}

/// Shortens upstream bodies before they end up in error messages
pub fn truncate(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        body.to_string()
    } else {
        let mut short: String = body.chars().take(max_chars).collect();
        short.push('…');
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_bodies() {
        assert_eq!(truncate("ok", 10), "ok");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "ěščřžýáíé";
        assert_eq!(truncate(body, 3), "ěšč…");
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(5), "prvotkar-test").is_ok());
    }
}
