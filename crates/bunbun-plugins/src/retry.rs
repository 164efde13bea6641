//! Bounded retry with exponential backoff and jitter
//!
//! Only errors for which `SyncError::is_retryable` holds are retried, and
//! only idempotent calls go through this path. Creating a video never does.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use bunbun_core::{StreamConfig, SyncError};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Add random jitter to backoff (±30%)
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.retry_backoff,
            ..Self::default()
        }
    }
}

/// Run `f` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. The last error is returned unchanged.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut f: F,
) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    let mut attempt = 0;
    let mut backoff = policy.initial_backoff;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = calculate_backoff(backoff, policy.jitter);

                warn!(
                    operation,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying provider call"
                );

                tokio::time::sleep(delay).await;

                backoff = Duration::from_millis(
                    ((backoff.as_millis() as f64 * policy.backoff_multiplier)
                        .min(policy.max_backoff.as_millis() as f64)) as u64,
                );
            }
            Err(err) => return Err(err),
        }
    }
}

fn calculate_backoff(base: Duration, jitter: bool) -> Duration {
    if jitter {
        let mut rng = rand::rng();
        let jitter_factor = 1.0 + rng.random_range(-0.3..0.3);
        Duration::from_millis((base.as_millis() as f64 * jitter_factor) as u64)
    } else {
        base
    }
}
