//! Database initialization
//!
//! Opens (creating if absent) the single SQLite file backing the record
//! store and ensures its one table exists.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Name of the single table holding serialized records keyed by address
pub const ADDRESSES_TABLE: &str = "addresses";

/// How long a connection waits on a locked database before failing
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize database connection and create the addresses table if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL: batch refresh writes while the HTTP front reads
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_addresses_table(&pool).await?;

    Ok(pool)
}

/// Create the addresses table (idempotent)
pub async fn create_addresses_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (
            address TEXT PRIMARY KEY,
            record TEXT NOT NULL
        )",
        ADDRESSES_TABLE
    );

    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}
