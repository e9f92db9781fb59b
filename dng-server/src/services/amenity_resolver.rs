//! Amenity resolver
//!
//! Produces walking travel-time matrices from an address to the nearest
//! places of each amenity category.
//!
//! # Architecture
//! Categories are resolved strictly in table order. The first category that
//! fails stops the run: categories already resolved are kept, the rest stay
//! empty, and the failure is reported alongside the partial result.
//!
//! Landmarks measure against the configured landmark addresses. Every other
//! category searches nearby places of its type, keeps the nearest five and
//! relabels the matrix destinations with the place names.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    AmenityInfo, AmenityKind, DistanceMatrix, LatLng, STATUS_OK, STATUS_ZERO_RESULTS,
};
use crate::sources::{
    Destination, NearbyResponse, PlacesSearch, SourceError, TravelMode, TravelTimeMatrix,
};
use crate::utils::{retry_on_quota, DEFAULT_QUOTA_RETRY_INTERVAL};

/// Maximum destinations measured per nearby-search category
pub const MAX_DESTINATIONS: usize = 5;

/// One amenity category: what it is called and how its destinations are found
#[derive(Debug, Clone, Copy)]
pub struct AmenityCategory {
    pub kind: AmenityKind,
    pub name: &'static str,
    /// Places search type; `None` means the configured landmark list
    pub place_type: Option<&'static str>,
}

impl AmenityCategory {
    pub fn uses_landmarks(&self) -> bool {
        self.place_type.is_none()
    }
}

/// Resolution order
pub const AMENITY_CATEGORIES: [AmenityCategory; 10] = [
    AmenityCategory {
        kind: AmenityKind::Landmarks,
        name: "landmarks",
        place_type: None,
    },
    AmenityCategory {
        kind: AmenityKind::BusStops,
        name: "bus stops",
        place_type: Some("bus_station"),
    },
    AmenityCategory {
        kind: AmenityKind::TrainStations,
        name: "train stations",
        place_type: Some("train_station"),
    },
    AmenityCategory {
        kind: AmenityKind::Grocers,
        name: "grocers",
        place_type: Some("grocery_or_supermarket"),
    },
    AmenityCategory {
        kind: AmenityKind::Cafes,
        name: "cafes",
        place_type: Some("cafe"),
    },
    AmenityCategory {
        kind: AmenityKind::Gyms,
        name: "gyms",
        place_type: Some("gym"),
    },
    AmenityCategory {
        kind: AmenityKind::Schools,
        name: "schools",
        place_type: Some("school"),
    },
    AmenityCategory {
        kind: AmenityKind::DepartmentStores,
        name: "department stores",
        place_type: Some("department_store"),
    },
    AmenityCategory {
        kind: AmenityKind::Malls,
        name: "malls",
        place_type: Some("shopping_mall"),
    },
    AmenityCategory {
        kind: AmenityKind::Bars,
        name: "bars",
        place_type: Some("bar"),
    },
];

/// Failure of one amenity category
#[derive(Debug, Error)]
#[error("Amenity category '{category}' failed: {source}")]
pub struct AmenityError {
    pub category: &'static str,
    #[source]
    pub source: SourceError,
}

/// Result of an amenity run: whatever resolved, plus the failure that stopped it
#[derive(Debug)]
pub struct AmenityOutcome {
    pub info: AmenityInfo,
    pub error: Option<AmenityError>,
}

pub struct AmenityResolver {
    places: Arc<dyn PlacesSearch>,
    matrix: Arc<dyn TravelTimeMatrix>,
    landmarks: Vec<String>,
    retry_interval: Duration,
}

impl AmenityResolver {
    pub fn new(
        places: Arc<dyn PlacesSearch>,
        matrix: Arc<dyn TravelTimeMatrix>,
        landmarks: Vec<String>,
    ) -> Self {
        Self {
            places,
            matrix,
            landmarks,
            retry_interval: DEFAULT_QUOTA_RETRY_INTERVAL,
        }
    }

    /// Override the fixed quota-backoff delay
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Resolve every category in order, stopping at the first failure
    pub async fn resolve(&self, origin: LatLng) -> AmenityOutcome {
        let mut info = AmenityInfo::default();

        for category in AMENITY_CATEGORIES.iter() {
            match self.resolve_category(category, origin).await {
                Ok(matrix) => {
                    debug!(
                        category = category.name,
                        destinations = matrix.destination_addresses.len(),
                        "Amenity category resolved"
                    );
                    *info.get_mut(category.kind) = matrix;
                }
                Err(source) => {
                    warn!(
                        category = category.name,
                        error = %source,
                        "Amenity category failed, skipping remaining categories"
                    );
                    return AmenityOutcome {
                        info,
                        error: Some(AmenityError {
                            category: category.name,
                            source,
                        }),
                    };
                }
            }
        }

        AmenityOutcome { info, error: None }
    }

    /// Resolve a single category
    pub async fn resolve_category(
        &self,
        category: &AmenityCategory,
        origin: LatLng,
    ) -> Result<DistanceMatrix, SourceError> {
        match category.place_type {
            None => self.landmark_matrix(origin).await,
            Some(place_type) => self.nearby_matrix(origin, place_type).await,
        }
    }

    async fn landmark_matrix(&self, origin: LatLng) -> Result<DistanceMatrix, SourceError> {
        let destinations: Vec<Destination> = self
            .landmarks
            .iter()
            .map(|address| Destination::Address(address.clone()))
            .collect();

        self.walking_matrix(origin, &destinations).await
    }

    async fn nearby_matrix(
        &self,
        origin: LatLng,
        place_type: &str,
    ) -> Result<DistanceMatrix, SourceError> {
        let nearby = self.places.nearby(origin, place_type).await?;
        let places = nearest_places(nearby)?;

        let destinations: Vec<Destination> = places
            .iter()
            .map(|place| Destination::Location(place.geometry.location))
            .collect();

        let mut matrix = self.walking_matrix(origin, &destinations).await?;

        // Geocoded destination strings are less useful than place names
        for (label, place) in matrix.destination_addresses.iter_mut().zip(places.iter()) {
            *label = place.name.clone();
        }

        Ok(matrix)
    }

    /// Walking matrix with quota-backoff retry
    async fn walking_matrix(
        &self,
        origin: LatLng,
        destinations: &[Destination],
    ) -> Result<DistanceMatrix, SourceError> {
        if destinations.is_empty() {
            return Ok(DistanceMatrix::zero_results());
        }

        let service: &dyn TravelTimeMatrix = self.matrix.as_ref();
        let matrix = retry_on_quota("distance matrix", self.retry_interval, move || {
            service.matrix(origin, destinations, TravelMode::Walking)
        })
        .await?;

        if matrix.status != STATUS_OK {
            return Err(SourceError::Status(matrix.status));
        }

        Ok(matrix)
    }
}

/// Nearest places from a search response, at most `MAX_DESTINATIONS`
fn nearest_places(nearby: NearbyResponse) -> Result<Vec<crate::sources::Place>, SourceError> {
    if nearby.status != STATUS_OK && nearby.status != STATUS_ZERO_RESULTS {
        return Err(SourceError::Status(nearby.status));
    }

    Ok(nearby
        .results
        .into_iter()
        .take(MAX_DESTINATIONS)
        .collect())
}
