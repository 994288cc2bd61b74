//! RÚIAN building API client

use super::models::{DataEnvelope, MunicipalityDto, RegionDto};
use super::Gazetteer;
use crate::adapters::http::{build_client, decode_json, default_user_agent};
use crate::adapters::retry::RetryPolicy;
use crate::config::GazetteerConfig;
use crate::domain::{HttpError, Municipality, MunicipalityId, Region, RegionId, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Gazetteer backed by the RÚIAN building API
///
/// # Example
///
/// ```no_run
/// use prvotkar::adapters::gazetteer::{Gazetteer, RuianGazetteer};
/// use prvotkar::config::GazetteerConfig;
///
/// # async fn example() -> prvotkar::domain::Result<()> {
/// let gazetteer = RuianGazetteer::new(&GazetteerConfig::default())?;
/// let regions = gazetteer.regions().await?;
/// println!("{} regions", regions.len());
/// # Ok(())
/// # }
/// ```
pub struct RuianGazetteer {
    base_url: String,
    api_key: Option<String>,
    client: Client,
    retry: RetryPolicy,
}

impl RuianGazetteer {
    pub fn new(config: &GazetteerConfig) -> Result<Self> {
        let client = build_client(
            Duration::from_secs(config.timeout_seconds),
            &default_user_agent(),
        )?;

        let api_key = config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().as_ref().to_string())
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("No gazetteer API key configured, requests will likely be rejected");
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            retry: RetryPolicy::from(&config.retry),
        })
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> std::result::Result<Vec<T>, HttpError> {
        let url = format!("{}/{}", self.base_url, path);

        let envelope: DataEnvelope = self
            .retry
            .run(path, || async {
                let mut request = self.client.get(&url).query(params);
                if let Some(key) = &self.api_key {
                    request = request.query(&[("apiKey", key.as_str())]);
                }

                let response = request
                    .send()
                    .await
                    .map_err(|e| HttpError::from_transport(&e))?;
                decode_json(response).await
            })
            .await?;

        Ok(envelope.entries(path))
    }
}

#[async_trait]
impl Gazetteer for RuianGazetteer {
    async fn regions(&self) -> std::result::Result<Vec<Region>, HttpError> {
        let regions: Vec<RegionDto> = self.get_list("regions", &[]).await?;
        tracing::debug!(count = regions.len(), "Fetched regions from gazetteer");

        Ok(regions
            .into_iter()
            .map(|dto| Region {
                id: RegionId::new(dto.region_id),
                name: dto.region_name,
            })
            .collect())
    }

    async fn municipalities(
        &self,
        region: &Region,
    ) -> std::result::Result<Vec<Municipality>, HttpError> {
        let municipalities: Vec<MunicipalityDto> = self
            .get_list(
                "municipalities",
                &[("regionId", region.id.get().to_string())],
            )
            .await?;

        Ok(municipalities
            .into_iter()
            .map(|dto| {
                Municipality::new(
                    MunicipalityId::new(dto.municipality_id),
                    dto.municipality_name,
                    Some(region.id),
                )
            })
            .collect())
    }
}
