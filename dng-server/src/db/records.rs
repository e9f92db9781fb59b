//! Record store
//!
//! Address → serialized record, held in the single `addresses` table. Every
//! write replaces the whole record; there are no partial-field updates.
//!
//! The handle is opened once at startup and cloned into every component
//! that needs it (the pool is reference counted).

use dng_common::{db::init_database, Result};
use sqlx::SqlitePool;
use std::path::Path;

use crate::models::AggregatedRecord;

#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Open (creating if absent) the store file and its table
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = init_database(db_path).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Load and deserialize the record for an address
    pub async fn get(&self, address: &str) -> Result<Option<AggregatedRecord>> {
        match self.get_raw(address).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Stored JSON document for an address, exactly as written
    pub async fn get_raw(&self, address: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT record FROM addresses WHERE address = ?")
                .bind(address)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(record,)| record))
    }

    /// Write the whole record under its address
    pub async fn put(&self, record: &AggregatedRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;

        sqlx::query(
            r#"
            INSERT INTO addresses (address, record) VALUES (?, ?)
            ON CONFLICT(address) DO UPDATE SET record = excluded.record
            "#,
        )
        .bind(&record.address)
        .bind(json)
        .execute(&self.pool)
        .await?;

        tracing::debug!(address = %record.address, "Record stored");

        Ok(())
    }

    /// Addresses with a stored record, in key order
    pub async fn addresses(&self) -> Result<Vec<String>> {
        let addresses = sqlx::query_scalar("SELECT address FROM addresses ORDER BY address")
            .fetch_all(&self.pool)
            .await?;

        Ok(addresses)
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM addresses")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
