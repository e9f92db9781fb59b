//! Notes annotator
//!
//! Attaches a free-text note to an address's record, building the record
//! first if it does not exist yet. A note that cannot be saved is logged
//! and dropped; there is no queued retry.

use std::sync::Arc;
use tracing::{info, warn};

use super::aggregator::{AggregateError, Aggregator};
use crate::models::AggregatedRecord;

pub struct NotesAnnotator {
    aggregator: Arc<Aggregator>,
}

impl NotesAnnotator {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }

    /// Overwrite the notes of `address` and persist the record
    pub async fn set_notes(
        &self,
        address: &str,
        notes: &str,
    ) -> Result<AggregatedRecord, AggregateError> {
        let notes = notes.to_string();

        match self
            .aggregator
            .update(address, move |record| record.notes = notes)
            .await
        {
            Ok(record) => {
                info!(address = %address, "Notes saved");
                Ok(record)
            }
            Err(e) => {
                warn!(address = %address, error = %e, "Could not save notes, note dropped");
                Err(e)
            }
        }
    }
}
