//! Nominatim search client
//!
//! Issues exactly one request per call. Pacing and failure bookkeeping are
//! the pipeline's job, so nothing here retries.

use super::Geocoder;
use crate::adapters::http::{build_client, decode_json};
use crate::config::GeocodingConfig;
use crate::domain::{Coordinates, HttpError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub struct NominatimGeocoder {
    search_url: String,
    country_code: String,
    client: Client,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = build_client(
            Duration::from_secs(config.timeout_seconds),
            &config.user_agent,
        )?;

        Ok(Self {
            search_url: format!("{}/search", config.base_url.trim_end_matches('/')),
            country_code: config.country_code.clone(),
            client,
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> std::result::Result<Option<Coordinates>, HttpError> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", "1"),
                ("countrycodes", self.country_code.as_str()),
                ("addressdetails", "0"),
            ])
            .send()
            .await
            .map_err(|e| HttpError::from_transport(&e))?;

        let places: Vec<Value> = decode_json(response).await?;
        match places.first() {
            Some(place) => parse_place(place).map(Some),
            None => Ok(None),
        }
    }
}

/// Nominatim returns coordinates as decimal strings
fn parse_place(place: &Value) -> std::result::Result<Coordinates, HttpError> {
    let lat = parse_coordinate(place.get("lat"), "lat")?;
    let lng = parse_coordinate(place.get("lon"), "lon")?;
    Ok(Coordinates::new(lat, lng))
}

fn parse_coordinate(value: Option<&Value>, field: &str) -> std::result::Result<f64, HttpError> {
    let parsed = match value {
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| HttpError::InvalidResponse(format!("Missing or invalid '{field}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config_for(server: &mockito::Server) -> GeocodingConfig {
        GeocodingConfig {
            base_url: server.url(),
            user_agent: "prvotkar-tests/1.0 (ops@example.com)".to_string(),
            ..GeocodingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_geocode_parses_string_coordinates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_header("user-agent", "prvotkar-tests/1.0 (ops@example.com)")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "11000 Praha, Česká republika".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
                Matcher::UrlEncoded("countrycodes".into(), "cz".into()),
            ]))
            .with_status(200)
            .with_body(json!([{"lat": "50.0755", "lon": "14.4378"}]).to_string())
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(&server)).unwrap();
        let result = geocoder
            .geocode("11000 Praha, Česká republika")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, Some(Coordinates::new(50.0755, 14.4378)));
    }

    #[tokio::test]
    async fn test_geocode_empty_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(&server)).unwrap();
        assert_eq!(geocoder.geocode("Nowhere").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_geocode_server_error_is_single_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(&server)).unwrap();
        assert!(geocoder.geocode("Brno").await.is_err());
        mock.assert_async().await;
    }

    #[test]
    fn test_parse_place_rejects_garbage() {
        assert!(parse_place(&json!({"lat": "north", "lon": "14.4"})).is_err());
        assert!(parse_place(&json!({"lat": "50.1"})).is_err());
        assert_eq!(
            parse_place(&json!({"lat": 49.19, "lon": 16.61})).unwrap(),
            Coordinates::new(49.19, 16.61)
        );
    }
}
