//! Google Maps web service client
//!
//! Backs three sources: geocoding, nearby search and the distance matrix.
//! Responses are returned with their service status intact; interpreting
//! "OK" / "ZERO_RESULTS" / "OVER_QUERY_LIMIT" is left to the caller.
//!
//! # API Reference
//! - Geocoding: https://maps.googleapis.com/maps/api/geocode/json
//! - Nearby search: https://maps.googleapis.com/maps/api/place/nearbysearch/json
//! - Distance matrix: https://maps.googleapis.com/maps/api/distancematrix/json

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{
    Destination, Geocoder, NearbyResponse, PlacesSearch, SourceError, TravelMode,
    TravelTimeMatrix,
};
use crate::models::{DistanceMatrix, GeocodeInfo, LatLng};

/// Google Maps API base URL
const GOOGLE_MAPS_API_URL: &str = "https://maps.googleapis.com/maps/api";

/// Transport timeout for a single request
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("dng/", env!("CARGO_PKG_VERSION"));

/// Google Maps client
pub struct GoogleMapsClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleMapsClient {
    pub fn new(api_key: String) -> Result<Self, SourceError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: GOOGLE_MAPS_API_URL.to_string(),
        })
    }

    /// Point the client at another host (local proxies, fakes)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}/json", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        mut query: Vec<(&'static str, String)>,
    ) -> Result<T, SourceError> {
        let url = self.endpoint_url(path);
        debug!(url = %url, "Querying Google Maps API");

        query.push(("key", self.api_key.clone()));

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Google Maps request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse Google Maps response: {}", e)))
    }
}

/// Pipe-separated destination list for the distance matrix
fn join_destinations(destinations: &[Destination]) -> String {
    destinations
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

#[async_trait]
impl Geocoder for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<GeocodeInfo, SourceError> {
        self.get_json("geocode", vec![("address", address.to_string())])
            .await
    }
}

#[async_trait]
impl PlacesSearch for GoogleMapsClient {
    async fn nearby(
        &self,
        location: LatLng,
        place_type: &str,
    ) -> Result<NearbyResponse, SourceError> {
        self.get_json(
            "place/nearbysearch",
            vec![
                ("location", location.to_string()),
                ("rankby", "distance".to_string()),
                ("type", place_type.to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl TravelTimeMatrix for GoogleMapsClient {
    async fn matrix(
        &self,
        origin: LatLng,
        destinations: &[Destination],
        mode: TravelMode,
    ) -> Result<DistanceMatrix, SourceError> {
        self.get_json(
            "distancematrix",
            vec![
                ("origins", origin.to_string()),
                ("destinations", join_destinations(destinations)),
                ("mode", mode.as_str().to_string()),
            ],
        )
        .await
    }
}
