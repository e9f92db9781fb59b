//! Batch refresh coordinator
//!
//! Drives the aggregator over a list of addresses: one task per address,
//! optionally capped by a semaphore, joined until every task has reported.
//! Per-address failures are logged where they happen and only counted here;
//! nothing is retried.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use super::aggregator::Aggregator;

/// What to do with addresses that already have a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Scrape only addresses without a record
    #[default]
    MissingOnly,
    /// Also rebuild addresses that already have a record (notes are kept)
    Force,
}

/// Per-address result of a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No record existed; one was built
    Built,
    /// An existing record was rebuilt
    Rebuilt,
    /// An existing record was left as is
    Cached,
    Failed,
}

/// Tally of a batch refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Tasks that reported back (always the number of addresses)
    pub completed: usize,
    pub built: usize,
    pub rebuilt: usize,
    pub cached: usize,
    pub failed: usize,
}

impl RefreshSummary {
    fn record(&mut self, outcome: RefreshOutcome) {
        self.completed += 1;
        match outcome {
            RefreshOutcome::Built => self.built += 1,
            RefreshOutcome::Rebuilt => self.rebuilt += 1,
            RefreshOutcome::Cached => self.cached += 1,
            RefreshOutcome::Failed => self.failed += 1,
        }
    }
}

pub struct BatchRefresher {
    aggregator: Arc<Aggregator>,
    max_concurrency: Option<usize>,
}

impl BatchRefresher {
    /// `max_concurrency` of `None` runs every address at once
    pub fn new(aggregator: Arc<Aggregator>, max_concurrency: Option<usize>) -> Self {
        Self {
            aggregator,
            max_concurrency,
        }
    }

    /// Refresh every address once and wait for all of them
    pub async fn refresh_all(&self, addresses: &[String], mode: RefreshMode) -> RefreshSummary {
        info!(
            addresses = addresses.len(),
            mode = ?mode,
            max_concurrency = ?self.max_concurrency,
            "Refreshing all address information"
        );

        let semaphore = self
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        let mut tasks = JoinSet::new();

        for address in addresses {
            let aggregator = Arc::clone(&self.aggregator);
            let semaphore = semaphore.clone();
            let address = address.clone();

            tasks.spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };

                info!(address = %address, "Refreshing");
                let outcome = refresh_one(&aggregator, &address, mode).await;
                info!(address = %address, outcome = ?outcome, "Refreshed");

                outcome
            });
        }

        let mut summary = RefreshSummary::default();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    error!(error = %e, "Refresh task panicked");
                    summary.record(RefreshOutcome::Failed);
                }
            }
        }

        info!(
            completed = summary.completed,
            built = summary.built,
            rebuilt = summary.rebuilt,
            cached = summary.cached,
            failed = summary.failed,
            "Refreshed all address information"
        );

        summary
    }
}

/// Refresh a single address
pub async fn refresh_one(
    aggregator: &Aggregator,
    address: &str,
    mode: RefreshMode,
) -> RefreshOutcome {
    let resolved = match aggregator.resolve(address).await {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(address = %address, error = %e, "Refresh failed");
            return RefreshOutcome::Failed;
        }
    };

    if resolved.freshly_built {
        return RefreshOutcome::Built;
    }

    match mode {
        RefreshMode::MissingOnly => RefreshOutcome::Cached,
        RefreshMode::Force => match aggregator.rebuild(address).await {
            Ok(_) => RefreshOutcome::Rebuilt,
            Err(e) => {
                error!(address = %address, error = %e, "Rebuild failed");
                RefreshOutcome::Failed
            }
        },
    }
}
