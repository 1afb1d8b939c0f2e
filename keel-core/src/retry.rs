use crate::Result;
use std::{future::Future, time::Duration};

/// Retry of transient failures with a linearly growing delay: `step`, then
/// `2 * step` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of tries, the first one included.
    pub attempts: u32,
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            step: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, step: Duration) -> Self {
        Self { attempts, step }
    }

    /// Delay before try number `attempt` (1-based, the first try has none).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.step * attempt.saturating_sub(1)
    }

    /// Runs `operation` until it succeeds or the tries are exhausted, returning the last error.
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < attempts => {
                    attempt += 1;
                    let delay = self.delay(attempt);
                    log::warn!(
                        "{what} failed, retrying in {} ms ({attempt}/{attempts}): {:#}",
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    let e = e.context(format!("{what} failed after {attempts} attempts"));
                    log::error!("{:#}", e);
                    return Err(e);
                }
            }
        }
    }
}
