//! Data models for dng-server
//!
//! The aggregated record and the sub-results each external source contributes.

pub mod amenity;
pub mod record;

pub use amenity::{
    AmenityInfo, AmenityKind, DistanceMatrix, MatrixElement, MatrixRow, TextValue,
    STATUS_OK, STATUS_OVER_QUERY_LIMIT, STATUS_ZERO_RESULTS,
};
pub use record::{
    AggregatedRecord, BroadbandInfo, GeocodeInfo, GeocodeResult, Geometry, Inspection, LatLng,
    LineQualityInfo, ListingInfo, ServingArea, BROADBAND_UNAVAILABLE,
};
