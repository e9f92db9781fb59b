//! dng-server library interface
//!
//! Exposes the record model, source clients, record store, aggregation
//! services and HTTP API for the `dng` binary and for integration tests.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sources;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use crate::services::{Aggregator, NotesAnnotator};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub notes: Arc<NotesAnnotator>,
    /// Configured address list
    pub addresses: Arc<Vec<String>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Front-end directory served at `/` and `/static`
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>, addresses: Vec<String>) -> Self {
        Self {
            notes: Arc::new(NotesAnnotator::new(Arc::clone(&aggregator))),
            aggregator,
            addresses: Arc::new(addresses),
            startup_time: Utc::now(),
            static_dir: None,
        }
    }

    pub fn with_static_dir(mut self, static_dir: Option<PathBuf>) -> Self {
        self.static_dir = static_dir;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();

    Router::new()
        .merge(api::address_routes())
        .merge(api::health_routes())
        .merge(api::static_routes(static_dir.as_deref()))
        .with_state(state)
}
