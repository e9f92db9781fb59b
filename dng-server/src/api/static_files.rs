//! Front-end file serving
//!
//! `/` serves `index.html` and `/static/*` serves the rest of the configured
//! directory. Without a configured directory no routes are added.

use axum::{
    http::{header, HeaderValue},
    Router,
};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::AppState;

/// Build static file routes rooted at `dir`
pub fn static_routes(dir: Option<&Path>) -> Router<AppState> {
    let Some(dir) = dir else {
        return Router::new();
    };

    Router::new()
        .route_service("/", ServeFile::new(dir.join("index.html")))
        .nest_service("/static", ServeDir::new(dir))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
}
