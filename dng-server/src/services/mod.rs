//! Aggregation services
//!
//! - Aggregator: fetch-or-reuse per address, scrape pipeline
//! - Amenity resolver: travel times to nearby amenities
//! - Batch refresh: concurrent aggregation over many addresses
//! - Notes: user notes on records

pub mod aggregator;
pub mod amenity_resolver;
pub mod batch_refresh;
pub mod notes;

pub use aggregator::{maps_embed_url, AggregateError, Aggregator, Resolved};
pub use amenity_resolver::{
    AmenityCategory, AmenityError, AmenityOutcome, AmenityResolver, AMENITY_CATEGORIES,
    MAX_DESTINATIONS,
};
pub use batch_refresh::{BatchRefresher, RefreshMode, RefreshOutcome, RefreshSummary};
pub use notes::NotesAnnotator;
