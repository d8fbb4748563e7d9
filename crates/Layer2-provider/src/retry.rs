//! Retry with exponential backoff for provider requests
//!
//! Only transient failures (rate limits, 5xx, network faults) are retried;
//! the classification lives on [`ProviderError`] itself. A rate-limit
//! response that names a wait time overrides the computed backoff.

use std::time::{Duration, SystemTime};

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::ProviderError;

/// Backoff configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first failure
    pub max_retries: u32,

    /// Delay before the first retry; doubles each attempt
    pub initial_delay: Duration,

    /// Ceiling on the computed delay
    pub max_delay: Duration,

    /// Spread delays by 0.8x to 1.2x to avoid synchronized retries
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let doubled = self
            .initial_delay
            .saturating_mul(1u32 << attempt.min(16));
        let capped = doubled.min(self.max_delay);

        if !self.jitter {
            return capped;
        }

        // Sub-second clock noise stands in for a RNG here
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as u64;
        let per_mille = 800 + (nanos % 400) as u32;
        capped * per_mille / 1000
    }
}

/// Run `operation` until it succeeds, fails permanently, or exhausts the
/// retry budget.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_transient() {
            debug!(operation = operation_name, attempt, %err, "permanent failure");
            return Err(err);
        }

        if attempt >= config.max_retries {
            warn!(
                operation = operation_name,
                max_retries = config.max_retries,
                %err,
                "retry budget exhausted"
            );
            return Err(err);
        }

        let delay = err
            .retry_after()
            .unwrap_or_else(|| config.delay_for(attempt));
        warn!(operation = operation_name, attempt, ?delay, %err, "retrying");

        sleep(delay).await;
        attempt += 1;
    }
}
