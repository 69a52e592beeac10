use std::time::Duration;

use crate::foundation::error::{InkError, InkResult};

/// Bounded retry with exponential backoff for external fetches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total tries, including the first one. Zero behaves like one.
    pub attempts: u32,
    /// Delay before the second try; doubles after every failure.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff_ms: 200,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff_ms: 0,
        }
    }

    /// Delay after failed try number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

/// Run `op` until it succeeds or the policy is exhausted. The last failure is reported as
/// [`InkError::DataFetch`].
pub fn retry_with_backoff<T>(
    policy: &RetryPolicy,
    what: &str,
    mut op: impl FnMut() -> InkResult<T>,
) -> InkResult<T> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(err) if attempt + 1 < attempts => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    what,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "fetch failed, retrying"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(err) => {
                return Err(match err {
                    InkError::DataFetch(msg) => {
                        InkError::data_fetch(format!("{what}: {msg} (after {attempts} attempts)"))
                    }
                    other => InkError::data_fetch(format!(
                        "{what}: {other} (after {attempts} attempts)"
                    )),
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sources/retry.rs"]
mod tests;
