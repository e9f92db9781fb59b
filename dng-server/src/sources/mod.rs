//! External data sources
//!
//! Every source the scrape pipeline queries sits behind an async trait so the
//! aggregator can run against the real HTTP clients or test stubs alike.
//!
//! # Sources
//! 1. Geocoder - address → candidate coordinates (fatal when it fails)
//! 2. Broadband rollout lookup - coordinates → serving-area status
//! 3. Listings lookup - address → listing, plus image and inspection sub-fetches
//! 4. Line-quality lookup - address → exchange distance and speed estimate
//! 5. Places search - coordinates + place type → places ranked by distance
//! 6. Travel-time matrix - origin + destinations → walking durations

pub mod endpoint;
pub mod google;

pub use endpoint::EndpointClient;
pub use google::GoogleMapsClient;

use async_trait::async_trait;
use dng_common::Settings;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    BroadbandInfo, DistanceMatrix, GeocodeInfo, Geometry, Inspection, LatLng, LineQualityInfo,
    ListingInfo,
};

/// External source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// The service answered but reported a non-success status
    #[error("Unexpected status: {0}")]
    Status(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Source not configured: {0}")]
    NotConfigured(&'static str),
}

/// Address → coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodeInfo, SourceError>;
}

/// Broadband rollout status at a location
#[async_trait]
pub trait BroadbandLookup: Send + Sync {
    async fn rollout_info(&self, location: LatLng) -> Result<BroadbandInfo, SourceError>;
}

/// Real-estate listing lookup with independent enrichment fetches
#[async_trait]
pub trait ListingsLookup: Send + Sync {
    async fn lookup(&self, address: &str) -> Result<ListingInfo, SourceError>;

    async fn images(&self, listing: &ListingInfo) -> Result<Vec<String>, SourceError>;

    async fn inspections(&self, listing: &ListingInfo) -> Result<Vec<Inspection>, SourceError>;
}

/// Fixed-line quality lookup
#[async_trait]
pub trait LineQualityLookup: Send + Sync {
    async fn lookup(&self, address: &str) -> Result<LineQualityInfo, SourceError>;
}

/// Nearby-place search, ranked by distance from `location`
#[async_trait]
pub trait PlacesSearch: Send + Sync {
    async fn nearby(&self, location: LatLng, place_type: &str)
        -> Result<NearbyResponse, SourceError>;
}

/// Travel-time matrix from a single origin
///
/// The returned matrix may carry the over-query-limit status; retrying is
/// the caller's decision.
#[async_trait]
pub trait TravelTimeMatrix: Send + Sync {
    async fn matrix(
        &self,
        origin: LatLng,
        destinations: &[Destination],
        mode: TravelMode,
    ) -> Result<DistanceMatrix, SourceError>;
}

/// Nearby-search response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbyResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub results: Vec<Place>,
}

/// One nearby-search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub vicinity: String,
    pub geometry: Geometry,
}

/// Matrix destination: a free-form address or a coordinate pair
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Address(String),
    Location(LatLng),
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Address(address) => f.write_str(address),
            Destination::Location(location) => write!(f, "{}", location),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Walking,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
        }
    }
}

/// The full set of sources the aggregator queries
#[derive(Clone)]
pub struct Sources {
    pub geocoder: Arc<dyn Geocoder>,
    pub broadband: Arc<dyn BroadbandLookup>,
    pub listings: Arc<dyn ListingsLookup>,
    pub line_quality: Arc<dyn LineQualityLookup>,
    pub places: Arc<dyn PlacesSearch>,
    pub matrix: Arc<dyn TravelTimeMatrix>,
}

impl Sources {
    /// Build the HTTP-backed sources described by the settings
    pub fn from_settings(settings: &Settings) -> Result<Self, SourceError> {
        let google = Arc::new(GoogleMapsClient::new(settings.google_api_key.clone())?);
        let endpoints = Arc::new(EndpointClient::new(settings.sources.clone())?);

        Ok(Self {
            geocoder: google.clone(),
            broadband: endpoints.clone(),
            listings: endpoints.clone(),
            line_quality: endpoints,
            places: google.clone(),
            matrix: google,
        })
    }
}
