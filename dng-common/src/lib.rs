//! # DNG Common Library
//!
//! Shared code for the dng aggregation service:
//! - Error and result types
//! - Settings loading (TOML)
//! - Record store database initialization

pub mod config;
pub mod db;
pub mod error;

pub use config::Settings;
pub use error::{Error, Result};
