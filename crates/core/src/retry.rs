//! Explicit opt-in retry helper (spec §7). The core never auto-retries;
//! callers that want backoff wrap their own call with this function.

use crate::error::JidoError;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub factor: f64,
    pub jitter_ratio: f64,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(25),
            cap: Duration::from_secs(1),
            factor: 2.0,
            jitter_ratio: 0.2,
            max_attempts: 3,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the `attempt`-th retry (0-indexed), before jitter.
    fn unjittered_delay(&self, attempt: u32) -> Duration {
        let scaled = self.base.as_secs_f64() * self.factor.powi(attempt as i32);
        Duration::from_secs_f64(scaled.min(self.cap.as_secs_f64()))
    }

    /// Apply deterministic jitter in `[-ratio, +ratio]` using a caller
    /// supplied sample in `[0.0, 1.0)`, so callers can use a real RNG in
    /// production and a fixed sequence in tests.
    pub fn jittered_delay(&self, attempt: u32, jitter_sample: f64) -> Duration {
        let base = self.unjittered_delay(attempt).as_secs_f64();
        let offset = base * self.jitter_ratio * (2.0 * jitter_sample - 1.0);
        Duration::from_secs_f64((base + offset).max(0.0))
    }
}

/// Retry `f` up to `policy.max_attempts` times, sleeping `sleep` between
/// attempts, only while the returned error is `retryable`. `jitter` is
/// called once per retry to sample `[0.0, 1.0)`.
pub async fn retry_with_backoff<T, F, Fut, S, SFut, J>(
    policy: BackoffPolicy,
    mut jitter: J,
    mut sleep: S,
    mut f: F,
) -> Result<T, JidoError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, JidoError>>,
    S: FnMut(Duration) -> SFut,
    SFut: std::future::Future<Output = ()>,
    J: FnMut() -> f64,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if err.retryable && attempt + 1 < policy.max_attempts => {
                let delay = policy.jittered_delay(attempt, jitter());
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
