//! Retry with linear backoff for provider rate limits.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Retry policy for the stream-consumption step.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Wait before retry `n` is `n * base_delay`...
    pub base_delay: Duration,
    /// ...capped at this.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Wait before the given 1-based retry.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry).min(self.max_delay)
    }

    /// Run `operation`, retrying only rate-limit failures.
    ///
    /// `on_retry` is awaited with the upcoming wait before each sleep.
    pub async fn execute<T, F, Fut, N, NFut>(&self, mut operation: F, mut on_retry: N) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        N: FnMut(Duration) -> NFut,
        NFut: Future<Output = ()>,
    {
        let mut retry = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_rate_limited() && retry < self.max_retries => {
                    retry += 1;
                    let wait = self.delay_for(retry);

                    tracing::warn!(
                        retry,
                        max_retries = self.max_retries,
                        wait_secs = wait.as_secs(),
                        error = %e,
                        "Rate limited by provider, backing off"
                    );

                    on_retry(wait).await;
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
