//! JSON endpoint client for the regional sources
//!
//! Broadband rollout, listings (with images and inspections) and line
//! quality are fetched from operator-configured URL templates that return
//! JSON in the record's sub-result shape. A source without a template
//! reports `SourceError::NotConfigured`, which the pipeline treats like any
//! other degraded source.

use async_trait::async_trait;
use dng_common::config::SourceEndpoints;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{BroadbandLookup, LineQualityLookup, ListingsLookup, SourceError};
use crate::models::{BroadbandInfo, Inspection, LatLng, LineQualityInfo, ListingInfo};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("dng/", env!("CARGO_PKG_VERSION"));

/// Client for the templated JSON sources
pub struct EndpointClient {
    http_client: Client,
    endpoints: SourceEndpoints,
}

impl EndpointClient {
    pub fn new(endpoints: SourceEndpoints) -> Result<Self, SourceError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoints,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        source: &'static str,
        template: Option<&String>,
        values: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let template = template.ok_or(SourceError::NotConfigured(source))?;
        let url = fill_template(template, values);

        debug!(source, url = %url, "Querying endpoint source");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("{} request failed: {}", source, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse {} response: {}", source, e)))
    }
}

/// Substitute `{name}` placeholders with query-escaped values
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |url, (name, value)| {
        let escaped: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
        url.replace(&format!("{{{}}}", name), &escaped)
    })
}

#[async_trait]
impl BroadbandLookup for EndpointClient {
    async fn rollout_info(&self, location: LatLng) -> Result<BroadbandInfo, SourceError> {
        let lat = location.lat.to_string();
        let lng = location.lng.to_string();
        self.get_json(
            "broadband",
            self.endpoints.broadband_url.as_ref(),
            &[("lat", lat.as_str()), ("lng", lng.as_str())],
        )
        .await
    }
}

#[async_trait]
impl ListingsLookup for EndpointClient {
    async fn lookup(&self, address: &str) -> Result<ListingInfo, SourceError> {
        self.get_json(
            "listings",
            self.endpoints.listings_url.as_ref(),
            &[("address", address)],
        )
        .await
    }

    async fn images(&self, listing: &ListingInfo) -> Result<Vec<String>, SourceError> {
        self.get_json(
            "listing images",
            self.endpoints.listing_images_url.as_ref(),
            &[("listing", listing.url.as_str())],
        )
        .await
    }

    async fn inspections(&self, listing: &ListingInfo) -> Result<Vec<Inspection>, SourceError> {
        self.get_json(
            "listing inspections",
            self.endpoints.listing_inspections_url.as_ref(),
            &[("listing", listing.url.as_str())],
        )
        .await
    }
}

#[async_trait]
impl LineQualityLookup for EndpointClient {
    async fn lookup(&self, address: &str) -> Result<LineQualityInfo, SourceError> {
        self.get_json(
            "line quality",
            self.endpoints.line_quality_url.as_ref(),
            &[("address", address)],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_escapes_values() {
        let url = fill_template(
            "https://listings.example/search?q={address}",
            &[("address", "1 Example St, Newtown")],
        );
        assert_eq!(url, "https://listings.example/search?q=1+Example+St%2C+Newtown");
    }

    #[test]
    fn test_fill_template_replaces_every_placeholder() {
        let url = fill_template(
            "https://nbn.example/{lat}/{lng}?lat={lat}",
            &[("lat", "-33.9"), ("lng", "151.2")],
        );
        assert_eq!(url, "https://nbn.example/-33.9/151.2?lat=-33.9");
    }

    #[tokio::test]
    async fn test_unconfigured_source_reports_not_configured() {
        let client = EndpointClient::new(SourceEndpoints::default()).unwrap();

        let result = BroadbandLookup::rollout_info(&client, LatLng::new(-33.9, 151.2)).await;
        assert!(matches!(result, Err(SourceError::NotConfigured("broadband"))));

        let result = LineQualityLookup::lookup(&client, "1 Example St").await;
        assert!(matches!(result, Err(SourceError::NotConfigured("line quality"))));
    }
}
