//! dng - address information aggregator
//!
//! Serves aggregated address records over HTTP, building each record on
//! first request. With `--refresh` the configured addresses are aggregated
//! before the server starts.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Subscriber};
use tracing_subscriber::EnvFilter;

use dng_common::config::{load_settings, resolve_config_path};
use dng_common::Settings;
use dng_server::db::RecordStore;
use dng_server::services::{Aggregator, AmenityResolver, BatchRefresher, RefreshMode};
use dng_server::sources::Sources;
use dng_server::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "dng", version, about = "Address information aggregator")]
struct Args {
    /// Refresh the configured addresses before serving
    #[arg(short, long)]
    refresh: bool,

    /// Rebuild records that already exist during refresh (notes are kept)
    #[arg(long, requires = "refresh")]
    force: bool,

    /// Exit after refreshing instead of serving
    #[arg(long, requires = "refresh")]
    refresh_only: bool,

    /// Debug logging with source locations
    #[arg(short, long)]
    debug: bool,

    /// Settings file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// `debug` wins, then RUST_LOG, then `default_level`
fn env_filter(default_level: &str, debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    }
}

/// Load settings with `subscriber` receiving their log output
fn load_settings_with<S>(subscriber: S, path: &Path) -> dng_common::Result<Settings>
where
    S: Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::with_default(subscriber, || load_settings(path))
}

fn init_tracing(default_level: &str, debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level, debug))
        .with_file(debug)
        .with_line_number(debug)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());

    // Settings carry the log level; load them under a bootstrap subscriber
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter("info", args.debug))
        .finish();
    let settings = load_settings_with(bootstrap, &config_path)
        .with_context(|| format!("Failed to load settings from {}", config_path.display()))?;

    init_tracing(&settings.logging.level, args.debug);

    info!(
        "Starting dng v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );
    info!("Settings: {}", config_path.display());
    info!("Database: {}", settings.db_path.display());

    let store = RecordStore::open(&settings.db_path).await?;
    let stored = store.addresses().await?;
    let untracked = stored
        .iter()
        .filter(|address| !settings.addresses.contains(address))
        .count();
    info!(records = stored.len(), untracked, "Record store ready");

    let sources = Sources::from_settings(&settings)?;
    let amenities = AmenityResolver::new(
        Arc::clone(&sources.places),
        Arc::clone(&sources.matrix),
        settings.landmarks.clone(),
    )
    .with_retry_interval(Duration::from_millis(settings.quota_retry_interval_ms));

    let aggregator = Arc::new(Aggregator::new(
        store,
        sources,
        amenities,
        settings.google_api_key.clone(),
    ));

    if args.refresh {
        let mode = if args.force {
            RefreshMode::Force
        } else {
            RefreshMode::MissingOnly
        };

        let refresher = BatchRefresher::new(Arc::clone(&aggregator), settings.refresh_concurrency);
        let summary = refresher.refresh_all(&settings.addresses, mode).await;
        info!(
            "Refresh complete: {} addresses, {} built, {} rebuilt, {} cached, {} failed",
            summary.completed, summary.built, summary.rebuilt, summary.cached, summary.failed
        );

        if args.refresh_only {
            return Ok(());
        }
    }

    let state = AppState::new(aggregator, settings.addresses.clone())
        .with_static_dir(settings.static_dir.clone());
    let app = build_router(state);

    let bind_address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_settings_logs_reach_bootstrap_subscriber() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "addresses = [\"1 Example St\"]\n").unwrap();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("info"))
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let settings = load_settings_with(subscriber, &path).unwrap();
        assert_eq!(settings.addresses, vec!["1 Example St"]);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Settings loaded"), "captured: {}", output);
    }

    #[test]
    fn test_debug_flag_overrides_level() {
        assert_eq!(env_filter("warn", true).to_string(), "debug");
    }
}
