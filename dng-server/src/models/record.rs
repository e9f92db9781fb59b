//! Aggregated address record
//!
//! One record per address, serialized whole as JSON into the record store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::amenity::AmenityInfo;

/// Serving-area status used when the broadband source reports none
pub const BROADBAND_UNAVAILABLE: &str = "unavailable";

/// Merged, cached dataset for one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    /// Store key; never changes once the record exists
    pub address: String,

    /// Geocoder result; always present and "OK" on persisted records
    #[serde(default)]
    pub geocode: Option<GeocodeInfo>,

    /// Broadband rollout status for the geocoded location
    #[serde(default)]
    pub broadband: BroadbandInfo,

    /// Real-estate listing, absent when the listings source failed
    #[serde(default)]
    pub listing: Option<ListingInfo>,

    /// Line-quality lookup, absent when the source failed
    #[serde(default)]
    pub line_quality: Option<LineQualityInfo>,

    /// Embeddable map URL for the address
    #[serde(default)]
    pub maps_embed: String,

    /// Walking travel times to nearby amenities
    #[serde(default)]
    pub amenities: AmenityInfo,

    /// Free-text user notes; only the notes annotator writes this
    #[serde(default)]
    pub notes: String,

    /// When the scrape pipeline last completed for this record
    #[serde(default)]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl AggregatedRecord {
    /// Empty record shell for an address that has never been scraped
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            geocode: None,
            broadband: BroadbandInfo::default(),
            listing: None,
            line_quality: None,
            maps_embed: String::new(),
            amenities: AmenityInfo::default(),
            notes: String::new(),
            scraped_at: None,
        }
    }

    /// A record is usable only with a successful geocode
    pub fn is_usable(&self) -> bool {
        self.geocode
            .as_ref()
            .map(|g| g.is_ok() && g.first_location().is_some())
            .unwrap_or(false)
    }
}

/// Latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Geocoder response: status code plus candidate locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeInfo {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

impl GeocodeInfo {
    pub fn is_ok(&self) -> bool {
        self.status == super::amenity::STATUS_OK
    }

    /// Location of the first (best) candidate
    pub fn first_location(&self) -> Option<LatLng> {
        self.results.first().map(|r| r.geometry.location)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: String,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

/// Broadband rollout lookup result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadbandInfo {
    #[serde(default)]
    pub serving_area: ServingArea,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServingArea {
    /// Rollout status, e.g. "available", "in_construction"
    #[serde(default)]
    pub service_status: String,
    #[serde(default)]
    pub service_category: String,
    #[serde(default)]
    pub description: String,
}

/// Real-estate listing with optional enrichment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingInfo {
    /// Listing page URL, also the handle for image/inspection sub-fetches
    pub url: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub car_spaces: Option<u32>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub inspections: Vec<Inspection>,
}

/// Scheduled open-house inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub starts_at: String,
    pub ends_at: String,
}

/// Fixed-line quality lookup result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineQualityInfo {
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub distance_to_exchange_m: Option<u32>,
    #[serde(default)]
    pub estimated_speed_kbps: Option<u32>,
}
