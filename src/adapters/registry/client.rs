//! ARES economic-subject search client

use super::models::{SearchPage, SearchQuery, SearchResponse};
use super::RegistrySource;
use crate::adapters::http::{build_client, default_user_agent, truncate};
use crate::adapters::retry::RetryPolicy;
use crate::config::RegistryConfig;
use crate::domain::{HttpError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const SEARCH_PATH: &str = "ekonomicke-subjekty/vyhledat";

/// Registry source backed by the ARES REST API
pub struct AresRegistry {
    search_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl AresRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = build_client(
            Duration::from_secs(config.timeout_seconds),
            &default_user_agent(),
        )?;

        Ok(Self {
            search_url: format!("{}/{}", config.base_url.trim_end_matches('/'), SEARCH_PATH),
            client,
            retry: RetryPolicy::from(&config.retry),
        })
    }

    async fn search_once(&self, query: &SearchQuery) -> std::result::Result<SearchPage, HttpError> {
        let response = self
            .client
            .post(&self.search_url)
            .json(&query.to_request())
            .send()
            .await
            .map_err(|e| HttpError::from_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::from_transport(&e))?;

        // Overflow is reported as a 400 carrying the same body shape
        if status.is_success() || status == StatusCode::BAD_REQUEST {
            if let Ok(parsed) = serde_json::from_str::<SearchResponse>(&body) {
                if parsed.is_overflow() {
                    return Ok(SearchPage::overflow());
                }
                if status.is_success() {
                    return Ok(SearchPage::from(parsed));
                }
            } else if status.is_success() {
                return Err(HttpError::InvalidResponse(format!(
                    "Unparseable search response: {}",
                    truncate(&body, 200)
                )));
            }
        }

        Err(HttpError::from_status(status.as_u16(), truncate(&body, 300)))
    }
}

#[async_trait]
impl RegistrySource for AresRegistry {
    async fn search(&self, query: &SearchQuery) -> std::result::Result<SearchPage, HttpError> {
        let page = self
            .retry
            .run("registry search", || self.search_once(query))
            .await?;

        tracing::debug!(
            entity_type = %query.entity_type,
            municipality = %query.municipality,
            prefix = query.name_prefix.as_deref().unwrap_or(""),
            offset = query.offset,
            records = page.records.len(),
            overflow = page.overflow,
            "Registry page received"
        );

        Ok(page)
    }
}
