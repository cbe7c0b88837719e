//! Bounded retry for transient blob-storage failures.
//!
//! Transient failures (network blips, contended disks) are retried with
//! exponential backoff up to a configured attempt budget. Permanent failures
//! (permission denied, invalid input) surface immediately.

use std::future::Future;
use std::time::Duration;

use crate::metrics;

/// Base backoff duration between attempts.
const BACKOFF_BASE: Duration = Duration::from_millis(100);

/// Maximum backoff duration between attempts.
const BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Default maximum attempts for one storage operation.
pub const DEFAULT_STORAGE_ATTEMPTS: u32 = 3;

/// Runs a storage operation with bounded retries.
///
/// Retries only errors flagged retryable by [`shelf_core::Error::is_retryable`];
/// the final error is returned unchanged once the budget is exhausted.
///
/// # Errors
///
/// Returns the last error from `op` when it is permanent or the attempt
/// budget runs out.
pub async fn retry_storage<T, F, Fut>(
    operation: &'static str,
    max_attempts: u32,
    mut op: F,
) -> shelf_core::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = shelf_core::Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                metrics::record_storage_retry(operation);
                let backoff = backoff_for_attempt(attempt);
                tracing::debug!(
                    operation = operation,
                    attempt = attempt,
                    backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "transient storage failure, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn backoff_for_attempt(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let backoff = BACKOFF_BASE.saturating_mul(2_u32.saturating_pow(exp));
    backoff.min(BACKOFF_MAX)
}
