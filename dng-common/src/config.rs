//! Settings loading and config file resolution
//!
//! Settings are read once at process start and never reloaded.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the settings file
pub const CONFIG_ENV_VAR: &str = "DNG_CONFIG";

/// Environment variable overriding the Google API key from the settings file
pub const API_KEY_ENV_VAR: &str = "DNG_GOOGLE_API_KEY";

/// Settings file used when neither CLI nor environment name one
pub const DEFAULT_CONFIG_PATH: &str = "settings/settings.toml";

/// Service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Interface the HTTP front binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP front binds to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the record store file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Addresses tracked by batch refresh
    #[serde(default)]
    pub addresses: Vec<String>,

    /// Landmark addresses used as the destinations of the landmarks category
    #[serde(default)]
    pub landmarks: Vec<String>,

    /// Google Maps platform key (geocoding, places, distance matrix, map embeds)
    #[serde(default)]
    pub google_api_key: String,

    /// Maximum concurrent scrapes during batch refresh (unbounded when absent)
    #[serde(default)]
    pub refresh_concurrency: Option<usize>,

    /// Fixed delay between travel-time matrix retries on quota exhaustion
    #[serde(default = "default_quota_retry_interval_ms")]
    pub quota_retry_interval_ms: u64,

    /// Directory holding the front-end static files (index.html, static/)
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub sources: SourceEndpoints,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// URL templates for the JSON endpoint sources
///
/// Placeholders: `{lat}`, `{lng}`, `{address}`, `{listing}`. A source
/// without a template is reported as not configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceEndpoints {
    pub broadband_url: Option<String>,
    pub listings_url: Option<String>,
    pub listing_images_url: Option<String>,
    pub listing_inspections_url: Option<String>,
    pub line_quality_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            addresses: Vec::new(),
            landmarks: Vec::new(),
            google_api_key: String::new(),
            refresh_concurrency: None,
            quota_retry_interval_ms: default_quota_retry_interval_ms(),
            static_dir: None,
            logging: LoggingConfig::default(),
            sources: SourceEndpoints::default(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> PathBuf {
    PathBuf::from("dng.db")
}

fn default_quota_retry_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// `host:port` string for binding the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse settings from TOML text and validate them
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse settings failed: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }

        if !self.google_api_key.is_empty() && !is_valid_key(&self.google_api_key) {
            return Err(Error::Config(
                "google_api_key must not be whitespace".to_string(),
            ));
        }

        if self.refresh_concurrency == Some(0) {
            return Err(Error::Config(
                "refresh_concurrency must be at least 1 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply environment overrides (currently the API key only)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV_VAR) {
            if is_valid_key(&key) {
                if is_valid_key(&self.google_api_key) {
                    warn!(
                        "Google API key found in both {} and settings file. Using environment.",
                        API_KEY_ENV_VAR
                    );
                }
                info!("Google API key loaded from environment variable");
                self.google_api_key = key;
            }
        }
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Settings file resolution priority:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Compiled default path
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Load settings from a TOML file, then apply environment overrides
///
/// A missing file is an error: the tracked addresses and landmarks have
/// no sensible defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read settings {} failed: {}", path.display(), e))
    })?;

    let mut settings = Settings::from_toml_str(&content)?;
    settings.apply_env_overrides();

    if !is_valid_key(&settings.google_api_key) {
        warn!("No Google API key configured; geocoding and amenity lookups will fail");
    }

    info!(
        path = %path.display(),
        addresses = settings.addresses.len(),
        landmarks = settings.landmarks.len(),
        "Settings loaded"
    );

    Ok(settings)
}
