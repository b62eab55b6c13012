//! Caller-side retry pacing.
//!
//! The queue never retries on its own; `retry`/`retry_all` are user
//! commands. A controller that wants automatic re-submission paces it
//! with [`RetryBackoff`], the same linear ramp the rest of the client
//! uses for its REST retries.

use std::time::Duration;

/// Linear backoff: `base × retry_count`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct RetryBackoff {
    /// Delay added per completed retry.
    pub base: Duration,
    /// Upper bound on the computed delay.
    pub max: Duration,
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

impl RetryBackoff {
    /// Delay to wait before requeueing a task that has already been
    /// retried `retry_count` times.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.base.saturating_mul(retry_count).min(self.max)
    }

    /// Sleeps for the computed delay. Returns immediately for a zero
    /// delay.
    pub async fn wait(&self, retry_count: u32) {
        let delay = self.delay_for(retry_count);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
