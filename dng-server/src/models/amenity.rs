//! Nearby-amenity travel times
//!
//! Each amenity category holds one walking travel-time matrix from the
//! address to the nearest places of that category.

use serde::{Deserialize, Serialize};

/// Successful response status shared by the Google Maps web services
pub const STATUS_OK: &str = "OK";

/// Status reported when a search or matrix legitimately found nothing
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Rate-limit sentinel reported when the request quota is exhausted
pub const STATUS_OVER_QUERY_LIMIT: &str = "OVER_QUERY_LIMIT";

/// Travel-time matrix from one origin to a set of destinations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub origin_addresses: Vec<String>,
    /// Destination labels; nearby-search place names replace the geocoded strings
    #[serde(default)]
    pub destination_addresses: Vec<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

impl DistanceMatrix {
    /// True for the default (unresolved or failed) matrix
    pub fn is_empty(&self) -> bool {
        self.status.is_empty() && self.rows.is_empty() && self.destination_addresses.is_empty()
    }

    pub fn is_over_query_limit(&self) -> bool {
        self.status == STATUS_OVER_QUERY_LIMIT
    }

    /// Matrix for a category with no destinations to measure
    pub fn zero_results() -> Self {
        Self {
            status: STATUS_ZERO_RESULTS.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixElement {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub duration: Option<TextValue>,
    #[serde(default)]
    pub distance: Option<TextValue>,
}

/// Human-readable text with its raw value (seconds or metres)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    pub text: String,
    pub value: i64,
}

/// The ten amenity categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmenityKind {
    Landmarks,
    BusStops,
    TrainStations,
    Grocers,
    Cafes,
    Gyms,
    Schools,
    DepartmentStores,
    Malls,
    Bars,
}

/// Travel-time matrices for every amenity category
///
/// A category left at its default value either failed or was never
/// reached because an earlier category failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmenityInfo {
    #[serde(default)]
    pub landmarks: DistanceMatrix,
    #[serde(default)]
    pub bus_stops: DistanceMatrix,
    #[serde(default)]
    pub train_stations: DistanceMatrix,
    #[serde(default)]
    pub grocers: DistanceMatrix,
    #[serde(default)]
    pub cafes: DistanceMatrix,
    #[serde(default)]
    pub gyms: DistanceMatrix,
    #[serde(default)]
    pub schools: DistanceMatrix,
    #[serde(default)]
    pub department_stores: DistanceMatrix,
    #[serde(default)]
    pub malls: DistanceMatrix,
    #[serde(default)]
    pub bars: DistanceMatrix,
}

impl AmenityInfo {
    pub fn get(&self, kind: AmenityKind) -> &DistanceMatrix {
        match kind {
            AmenityKind::Landmarks => &self.landmarks,
            AmenityKind::BusStops => &self.bus_stops,
            AmenityKind::TrainStations => &self.train_stations,
            AmenityKind::Grocers => &self.grocers,
            AmenityKind::Cafes => &self.cafes,
            AmenityKind::Gyms => &self.gyms,
            AmenityKind::Schools => &self.schools,
            AmenityKind::DepartmentStores => &self.department_stores,
            AmenityKind::Malls => &self.malls,
            AmenityKind::Bars => &self.bars,
        }
    }

    pub fn get_mut(&mut self, kind: AmenityKind) -> &mut DistanceMatrix {
        match kind {
            AmenityKind::Landmarks => &mut self.landmarks,
            AmenityKind::BusStops => &mut self.bus_stops,
            AmenityKind::TrainStations => &mut self.train_stations,
            AmenityKind::Grocers => &mut self.grocers,
            AmenityKind::Cafes => &mut self.cafes,
            AmenityKind::Gyms => &mut self.gyms,
            AmenityKind::Schools => &mut self.schools,
            AmenityKind::DepartmentStores => &mut self.department_stores,
            AmenityKind::Malls => &mut self.malls,
            AmenityKind::Bars => &mut self.bars,
        }
    }
}
