//! Bounded retry for calls to external services
//!
//! Only transient failures (see [`AppError::is_transient`]) are retried; the
//! delay between attempts grows exponentially from the initial interval.

use crate::errors::{AppError, Result};
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Exponential schedule starting at `initial`, without an elapsed-time cap
pub fn exponential_policy(initial: Duration) -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(initial)
        .with_randomization_factor(0.1)
        .with_multiplier(2.0)
        .with_max_interval(Duration::from_secs(10))
        .with_max_elapsed_time(None)
        .build()
}

/// Run `call` up to `max_attempts` times (at least once).
///
/// `call` receives the 1-based attempt number. The last error is returned
/// unchanged when attempts are exhausted or the error is permanent.
pub async fn retry_transient<T, F, Fut>(
    operation: &str,
    max_attempts: u32,
    initial_delay: Duration,
    mut call: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let attempt = AtomicU32::new(0);

    let op = || {
        let current = attempt.fetch_add(1, Ordering::SeqCst) + 1;
        let fut = call(current);
        async move {
            fut.await.map_err(|e| {
                if current < max_attempts && e.is_transient() {
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        }
    };

    let notify = |e: AppError, delay: Duration| {
        tracing::warn!(
            operation = operation,
            attempt = attempt.load(Ordering::SeqCst),
            max_attempts = max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %e,
            "Transient failure, retrying"
        );
    };

    backoff::future::retry_notify(exponential_policy(initial_delay), op, notify).await
}
