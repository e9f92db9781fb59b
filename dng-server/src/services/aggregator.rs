//! Aggregator
//!
//! Serves an address's record from the store, or builds it by running the
//! scrape pipeline and writes it back.
//!
//! # Scrape pipeline
//! Sequential, one address at a time:
//! Geocode → Broadband → Listing (+ images, inspections) → Line quality → Map embed → Amenities
//!
//! Only the geocode step is fatal: when it fails nothing is persisted. Every
//! later source is best-effort; its failure is logged and leaves the
//! sub-field empty, and the pipeline still reports success.
//!
//! # Concurrency
//! Builds, rebuilds and updates of one address are serialized by a
//! per-address lock, so concurrent first-time lookups scrape once and the
//! waiting callers are served the stored result.

use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::amenity_resolver::AmenityResolver;
use crate::db::RecordStore;
use crate::models::{AggregatedRecord, BroadbandInfo, GeocodeInfo, LatLng, BROADBAND_UNAVAILABLE};
use crate::sources::Sources;

/// Fixed template for the embeddable map link
const MAPS_EMBED_URL: &str = "https://www.google.com/maps/embed/v1/place";

/// Aggregation errors surfaced to callers
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The geocoder errored or did not return a usable "OK" result
    #[error("Geocode failed for '{address}': {reason}")]
    GeocodeFailed { address: String, reason: String },

    /// Record store read or write failed
    #[error("Record store error: {0}")]
    Store(#[from] dng_common::Error),
}

/// A record together with whether this call built it
#[derive(Debug, Clone)]
pub struct Resolved {
    pub record: AggregatedRecord,
    pub freshly_built: bool,
}

pub struct Aggregator {
    store: RecordStore,
    sources: Sources,
    amenities: AmenityResolver,
    maps_api_key: String,
    /// Per-address locks for in-flight builds
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Aggregator {
    pub fn new(
        store: RecordStore,
        sources: Sources,
        amenities: AmenityResolver,
        maps_api_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sources,
            amenities,
            maps_api_key: maps_api_key.into(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Return the stored record, or build, persist and return a new one
    pub async fn resolve(&self, address: &str) -> Result<Resolved, AggregateError> {
        if let Some(record) = self.store.get(address).await? {
            debug!(address = %address, "Record served from store");
            return Ok(Resolved {
                record,
                freshly_built: false,
            });
        }

        self.with_address_lock(address, || self.resolve_locked(address))
            .await
    }

    /// Re-run the scrape pipeline for an address, keeping its notes
    pub async fn rebuild(&self, address: &str) -> Result<AggregatedRecord, AggregateError> {
        self.with_address_lock(address, move || async move {
            let shell = self
                .store
                .get(address)
                .await?
                .unwrap_or_else(|| AggregatedRecord::new(address));

            self.build_and_store(shell).await
        })
        .await
    }

    /// Resolve (building if needed), apply `change` and persist the result
    pub async fn update<F>(
        &self,
        address: &str,
        change: F,
    ) -> Result<AggregatedRecord, AggregateError>
    where
        F: FnOnce(&mut AggregatedRecord),
    {
        self.with_address_lock(address, move || async move {
            let mut record = self.resolve_locked(address).await?.record;
            change(&mut record);
            self.store.put(&record).await?;
            Ok::<_, AggregateError>(record)
        })
        .await
    }

    /// Run the scrape pipeline over `record` without persisting it.
    ///
    /// Every sub-field except the address and notes is overwritten.
    pub async fn scrape(
        &self,
        mut record: AggregatedRecord,
    ) -> Result<AggregatedRecord, AggregateError> {
        let address = record.address.clone();
        info!(address = %address, "Scraping address");

        // Step 1-2: geocode (fatal)
        let geocode = self.geocode(&address).await?;
        let location = geocode
            .first_location()
            .ok_or_else(|| AggregateError::GeocodeFailed {
                address: address.clone(),
                reason: "no candidates returned".to_string(),
            })?;
        record.geocode = Some(geocode);

        // Step 3: broadband rollout
        record.broadband = self.broadband(&address, location).await;

        // Step 4: listing with images and inspections
        record.listing = self.listing(&address).await;

        // Step 5: line quality
        record.line_quality = match self.sources.line_quality.lookup(&address).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(address = %address, error = %e, "Could not get line quality info");
                None
            }
        };

        // Step 6: map embed
        record.maps_embed = maps_embed_url(&self.maps_api_key, &address);

        // Step 7: amenities (partial results kept)
        let outcome = self.amenities.resolve(location).await;
        if let Some(e) = &outcome.error {
            warn!(address = %address, error = %e, "Could not get all nearby amenities");
        }
        record.amenities = outcome.info;

        record.scraped_at = Some(Utc::now());
        info!(address = %address, "Scrape complete");

        Ok(record)
    }

    async fn resolve_locked(&self, address: &str) -> Result<Resolved, AggregateError> {
        // Another caller may have built it while we waited for the lock
        if let Some(record) = self.store.get(address).await? {
            return Ok(Resolved {
                record,
                freshly_built: false,
            });
        }

        let record = self
            .build_and_store(AggregatedRecord::new(address))
            .await?;

        Ok(Resolved {
            record,
            freshly_built: true,
        })
    }

    async fn build_and_store(
        &self,
        shell: AggregatedRecord,
    ) -> Result<AggregatedRecord, AggregateError> {
        let record = self.scrape(shell).await?;
        self.store.put(&record).await?;
        Ok(record)
    }

    async fn geocode(&self, address: &str) -> Result<GeocodeInfo, AggregateError> {
        let geocode = self.sources.geocoder.geocode(address).await.map_err(|e| {
            AggregateError::GeocodeFailed {
                address: address.to_string(),
                reason: e.to_string(),
            }
        })?;

        if !geocode.is_ok() {
            return Err(AggregateError::GeocodeFailed {
                address: address.to_string(),
                reason: format!("status {}", geocode.status),
            });
        }

        Ok(geocode)
    }

    async fn broadband(&self, address: &str, location: LatLng) -> BroadbandInfo {
        let mut info = match self.sources.broadband.rollout_info(location).await {
            Ok(info) => info,
            Err(e) => {
                warn!(address = %address, error = %e, "Could not get broadband rollout info");
                BroadbandInfo::default()
            }
        };

        if info.serving_area.service_status.is_empty() {
            info.serving_area.service_status = BROADBAND_UNAVAILABLE.to_string();
        }

        info
    }

    async fn listing(&self, address: &str) -> Option<crate::models::ListingInfo> {
        let listings = &self.sources.listings;

        let mut listing = match listings.lookup(address).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(address = %address, error = %e, "Could not get listing info");
                return None;
            }
        };

        match listings.images(&listing).await {
            Ok(images) => listing.images = images,
            Err(e) => warn!(address = %address, error = %e, "Could not get listing images"),
        }

        match listings.inspections(&listing).await {
            Ok(inspections) => listing.inspections = inspections,
            Err(e) => warn!(address = %address, error = %e, "Could not get listing inspections"),
        }

        Some(listing)
    }

    /// Run `operation` while holding the lock for `address`
    async fn with_address_lock<F, Fut, T>(&self, address: &str, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lock = {
            let mut locks = self.inflight.lock().await;
            Arc::clone(
                locks
                    .entry(address.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let result = {
            let _guard = lock.lock().await;
            operation().await
        };

        // Drop the entry once no other caller holds or waits on it
        let mut locks = self.inflight.lock().await;
        if let Some(entry) = locks.get(address) {
            if Arc::ptr_eq(entry, &lock) && Arc::strong_count(&lock) == 2 {
                locks.remove(address);
            }
        }

        result
    }
}

/// Embeddable map URL for an address
pub fn maps_embed_url(api_key: &str, address: &str) -> String {
    let query: String = url::form_urlencoded::byte_serialize(address.as_bytes()).collect();
    format!("{}?key={}&q={}&zoom=13", MAPS_EMBED_URL, api_key, query)
}
