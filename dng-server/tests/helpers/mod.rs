//! Test helper utilities
//!
//! Stub sources with call counters, plus builders for stores, resolvers and
//! aggregators wired to them.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use dng_server::db::RecordStore;
use dng_server::models::{
    BroadbandInfo, DistanceMatrix, GeocodeInfo, GeocodeResult, Geometry, Inspection, LatLng,
    LineQualityInfo, ListingInfo, MatrixElement, MatrixRow, ServingArea, TextValue, STATUS_OK,
    STATUS_OVER_QUERY_LIMIT, STATUS_ZERO_RESULTS,
};
use dng_server::services::{Aggregator, AmenityResolver};
use dng_server::sources::{
    BroadbandLookup, Destination, Geocoder, LineQualityLookup, ListingsLookup, NearbyResponse,
    Place, PlacesSearch, SourceError, Sources, TravelMode, TravelTimeMatrix,
};

pub const TEST_API_KEY: &str = "test-key";

pub const ORIGIN: LatLng = LatLng {
    lat: -33.8688,
    lng: 151.2093,
};

/// Open an empty store in a temporary directory
pub async fn temp_store() -> (TempDir, RecordStore) {
    let dir = TempDir::new().unwrap();
    let store = RecordStore::open(&dir.path().join("dng.db")).await.unwrap();
    (dir, store)
}

fn network_error(source: &str) -> SourceError {
    SourceError::Network(format!("{} unreachable", source))
}

// ----------------------------------------------------------------------------
// Geocoder
// ----------------------------------------------------------------------------

/// What the stub geocoder answers
#[derive(Debug, Clone)]
pub enum GeocodeReply {
    /// "OK" with one candidate
    Ok,
    /// The given status with no candidates
    Status(&'static str),
    /// Transport failure
    Error,
}

pub struct StubGeocoder {
    pub calls: AtomicUsize,
    reply: GeocodeReply,
    /// Addresses that fail with a transport error regardless of `reply`
    failing_addresses: Vec<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl StubGeocoder {
    pub fn new(reply: GeocodeReply) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply,
            failing_addresses: Vec::new(),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing_for(mut self, addresses: &[&str]) -> Self {
        self.failing_addresses = addresses.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodeInfo, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_addresses.iter().any(|a| a == address) {
            return Err(network_error("geocoder"));
        }

        match self.reply {
            GeocodeReply::Ok => Ok(GeocodeInfo {
                status: STATUS_OK.to_string(),
                results: vec![GeocodeResult {
                    formatted_address: address.to_string(),
                    geometry: Geometry { location: ORIGIN },
                }],
            }),
            GeocodeReply::Status(status) => Ok(GeocodeInfo {
                status: status.to_string(),
                results: Vec::new(),
            }),
            GeocodeReply::Error => Err(network_error("geocoder")),
        }
    }
}

// ----------------------------------------------------------------------------
// Regional sources
// ----------------------------------------------------------------------------

pub struct StubBroadband {
    pub calls: AtomicUsize,
    fail: bool,
    empty_status: bool,
}

impl StubBroadband {
    pub fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
            empty_status: false,
        }
    }

    /// Answer successfully but without a serving-area status
    pub fn empty_status() -> Self {
        Self {
            empty_status: true,
            ..Self::new(false)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BroadbandLookup for StubBroadband {
    async fn rollout_info(&self, _location: LatLng) -> Result<BroadbandInfo, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(network_error("broadband"));
        }

        if self.empty_status {
            return Ok(BroadbandInfo::default());
        }

        Ok(BroadbandInfo {
            serving_area: ServingArea {
                service_status: "available".to_string(),
                service_category: "brownfields".to_string(),
                description: "Fibre to the node".to_string(),
            },
        })
    }
}

pub struct StubListings {
    pub calls: AtomicUsize,
    fail_lookup: bool,
    fail_images: bool,
}

impl StubListings {
    pub fn new(fail_lookup: bool, fail_images: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_lookup,
            fail_images,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingsLookup for StubListings {
    async fn lookup(&self, address: &str) -> Result<ListingInfo, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup {
            return Err(network_error("listings"));
        }

        Ok(ListingInfo {
            url: format!("https://listings.example/{}", address.replace(' ', "-")),
            price: Some("$1,200,000".to_string()),
            bedrooms: Some(3),
            ..ListingInfo::default()
        })
    }

    async fn images(&self, listing: &ListingInfo) -> Result<Vec<String>, SourceError> {
        if self.fail_images {
            return Err(network_error("listing images"));
        }
        Ok(vec![format!("{}/1.jpg", listing.url)])
    }

    async fn inspections(&self, _listing: &ListingInfo) -> Result<Vec<Inspection>, SourceError> {
        Ok(vec![Inspection {
            starts_at: "2026-10-24T10:00:00+11:00".to_string(),
            ends_at: "2026-10-24T10:30:00+11:00".to_string(),
        }])
    }
}

pub struct StubLineQuality {
    pub calls: AtomicUsize,
    fail: bool,
}

impl StubLineQuality {
    pub fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
        }
    }
}

#[async_trait]
impl LineQualityLookup for StubLineQuality {
    async fn lookup(&self, _address: &str) -> Result<LineQualityInfo, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(network_error("line quality"));
        }

        Ok(LineQualityInfo {
            exchange: Some("Newtown".to_string()),
            distance_to_exchange_m: Some(850),
            estimated_speed_kbps: Some(24_000),
        })
    }
}

// ----------------------------------------------------------------------------
// Places and matrix
// ----------------------------------------------------------------------------

pub struct StubPlaces {
    pub calls: AtomicUsize,
    /// Place types requested, in order
    pub requested: Mutex<Vec<String>>,
    results_per_type: usize,
    failing_type: Option<&'static str>,
    fail_all: bool,
    empty_type: Option<&'static str>,
}

impl StubPlaces {
    pub fn new(results_per_type: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
            results_per_type,
            failing_type: None,
            fail_all: false,
            empty_type: None,
        }
    }

    /// Fail searches for `place_type` with a transport error
    pub fn failing_for(mut self, place_type: &'static str) -> Self {
        self.failing_type = Some(place_type);
        self
    }

    /// Fail every search with a transport error
    pub fn failing_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Answer ZERO_RESULTS for `place_type`
    pub fn empty_for(mut self, place_type: &'static str) -> Self {
        self.empty_type = Some(place_type);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlacesSearch for StubPlaces {
    async fn nearby(
        &self,
        location: LatLng,
        place_type: &str,
    ) -> Result<NearbyResponse, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(place_type.to_string());

        if self.fail_all || self.failing_type == Some(place_type) {
            return Err(network_error("places"));
        }

        if self.empty_type == Some(place_type) {
            return Ok(NearbyResponse {
                status: STATUS_ZERO_RESULTS.to_string(),
                results: Vec::new(),
            });
        }

        let results = (0..self.results_per_type)
            .map(|i| Place {
                name: format!("{} {}", place_type, i),
                vicinity: String::new(),
                geometry: Geometry {
                    location: LatLng::new(location.lat + 0.001 * i as f64, location.lng),
                },
            })
            .collect();

        Ok(NearbyResponse {
            status: STATUS_OK.to_string(),
            results,
        })
    }
}

pub struct StubMatrix {
    pub calls: AtomicUsize,
    /// Remaining calls answered with OVER_QUERY_LIMIT
    over_limit_remaining: AtomicUsize,
    /// Status answered once this many calls have succeeded
    failing_after: Option<(usize, &'static str)>,
    /// Destination count of every call, in order
    pub destination_counts: Mutex<Vec<usize>>,
}

impl StubMatrix {
    pub fn new() -> Self {
        Self::over_limit_times(0)
    }

    pub fn over_limit_times(times: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            over_limit_remaining: AtomicUsize::new(times),
            failing_after: None,
            destination_counts: Mutex::new(Vec::new()),
        }
    }

    /// Answer `status` on every call after the first `ok_calls`
    pub fn status_after(ok_calls: usize, status: &'static str) -> Self {
        Self {
            failing_after: Some((ok_calls, status)),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn destination_counts(&self) -> Vec<usize> {
        self.destination_counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TravelTimeMatrix for StubMatrix {
    async fn matrix(
        &self,
        origin: LatLng,
        destinations: &[Destination],
        mode: TravelMode,
    ) -> Result<DistanceMatrix, SourceError> {
        assert_eq!(mode, TravelMode::Walking);
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some((ok_calls, status)) = self.failing_after {
            if call >= ok_calls {
                return Ok(DistanceMatrix {
                    status: status.to_string(),
                    ..DistanceMatrix::default()
                });
            }
        }

        let over_limit = self
            .over_limit_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if over_limit {
            return Ok(DistanceMatrix {
                status: STATUS_OVER_QUERY_LIMIT.to_string(),
                ..DistanceMatrix::default()
            });
        }

        self.destination_counts
            .lock()
            .unwrap()
            .push(destinations.len());

        let elements = destinations
            .iter()
            .enumerate()
            .map(|(i, _)| MatrixElement {
                status: STATUS_OK.to_string(),
                duration: Some(TextValue {
                    text: format!("{} mins", i + 1),
                    value: 60 * (i as i64 + 1),
                }),
                distance: Some(TextValue {
                    text: format!("{} m", 100 * (i + 1)),
                    value: 100 * (i as i64 + 1),
                }),
            })
            .collect();

        Ok(DistanceMatrix {
            status: STATUS_OK.to_string(),
            origin_addresses: vec![origin.to_string()],
            destination_addresses: destinations.iter().map(|d| format!("near {}", d)).collect(),
            rows: vec![MatrixRow { elements }],
        })
    }
}

// ----------------------------------------------------------------------------
// Wiring
// ----------------------------------------------------------------------------

/// A full set of stub sources, kept typed so tests can read the counters
pub struct Stubs {
    pub geocoder: Arc<StubGeocoder>,
    pub broadband: Arc<StubBroadband>,
    pub listings: Arc<StubListings>,
    pub line_quality: Arc<StubLineQuality>,
    pub places: Arc<StubPlaces>,
    pub matrix: Arc<StubMatrix>,
    pub landmarks: Vec<String>,
}

impl Stubs {
    /// Every source answers successfully
    pub fn healthy() -> Self {
        Self {
            geocoder: Arc::new(StubGeocoder::new(GeocodeReply::Ok)),
            broadband: Arc::new(StubBroadband::new(false)),
            listings: Arc::new(StubListings::new(false, false)),
            line_quality: Arc::new(StubLineQuality::new(false)),
            places: Arc::new(StubPlaces::new(3)),
            matrix: Arc::new(StubMatrix::new()),
            landmarks: vec!["Town Hall".to_string(), "Central Station".to_string()],
        }
    }

    /// Every source except the geocoder and amenity services fails
    pub fn degraded() -> Self {
        Self {
            broadband: Arc::new(StubBroadband::new(true)),
            listings: Arc::new(StubListings::new(true, false)),
            line_quality: Arc::new(StubLineQuality::new(true)),
            ..Self::healthy()
        }
    }

    pub fn with_geocoder(mut self, geocoder: StubGeocoder) -> Self {
        self.geocoder = Arc::new(geocoder);
        self
    }

    pub fn with_broadband(mut self, broadband: StubBroadband) -> Self {
        self.broadband = Arc::new(broadband);
        self
    }

    pub fn with_listings(mut self, listings: StubListings) -> Self {
        self.listings = Arc::new(listings);
        self
    }

    pub fn with_places(mut self, places: StubPlaces) -> Self {
        self.places = Arc::new(places);
        self
    }

    pub fn with_matrix(mut self, matrix: StubMatrix) -> Self {
        self.matrix = Arc::new(matrix);
        self
    }

    pub fn with_landmarks(mut self, landmarks: Vec<String>) -> Self {
        self.landmarks = landmarks;
        self
    }

    pub fn sources(&self) -> Sources {
        Sources {
            geocoder: self.geocoder.clone(),
            broadband: self.broadband.clone(),
            listings: self.listings.clone(),
            line_quality: self.line_quality.clone(),
            places: self.places.clone(),
            matrix: self.matrix.clone(),
        }
    }

    pub fn amenity_resolver(&self) -> AmenityResolver {
        AmenityResolver::new(
            self.places.clone(),
            self.matrix.clone(),
            self.landmarks.clone(),
        )
        .with_retry_interval(Duration::from_millis(1))
    }

    pub fn aggregator(&self, store: RecordStore) -> Aggregator {
        Aggregator::new(store, self.sources(), self.amenity_resolver(), TEST_API_KEY)
    }
}
