//! HTTP API handlers
//!
//! - `GET /addresses`: configured address list
//! - `GET /addressinfo?address=`: aggregated record, built on first request
//! - `POST /savenotes`: form fields `address`, `notes`
//! - `GET /health`
//! - `GET /`, `/static/*`: front-end files, when a static directory is configured

pub mod addresses;
pub mod health;
pub mod static_files;

pub use addresses::address_routes;
pub use health::health_routes;
pub use static_files::static_routes;
