//! Quota-backoff retry
//!
//! Retries a request whose response reports quota exhaustion. The delay is
//! fixed, there is no jitter and no attempt cap: a dependency that stays
//! over quota keeps the caller waiting. Errors are never retried.

use std::future::Future;
use std::time::Duration;

/// Delay between attempts while the dependency reports quota exhaustion
pub const DEFAULT_QUOTA_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Response types that can signal quota exhaustion in-band
pub trait QuotaLimited {
    fn is_over_quota(&self) -> bool;
}

impl QuotaLimited for crate::models::DistanceMatrix {
    fn is_over_quota(&self) -> bool {
        self.is_over_query_limit()
    }
}

/// Run `operation` until its response is not over quota.
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If it fails, return the error immediately (no retry)
/// 3. If the response reports quota exhaustion, sleep `interval` and go to 1
/// 4. Otherwise return the response
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "distance matrix")
/// * `interval` - Fixed delay between attempts
/// * `operation` - Closure issuing the request
pub async fn retry_on_quota<F, Fut, T, E>(
    operation_name: &str,
    interval: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    T: QuotaLimited,
{
    let mut retries: u64 = 0;

    loop {
        let response = operation().await?;

        if !response.is_over_quota() {
            if retries > 0 {
                tracing::debug!(
                    operation = operation_name,
                    retries,
                    "Request succeeded after quota retries"
                );
            }
            return Ok(response);
        }

        retries += 1;
        tracing::debug!(
            operation = operation_name,
            retries,
            interval_ms = interval.as_millis() as u64,
            "Quota exhausted, will retry after fixed delay"
        );

        tokio::time::sleep(interval).await;
    }
}
