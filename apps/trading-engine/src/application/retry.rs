//! Bounded retry with exponential backoff and jitter.
//!
//! Applied by the execution service to idempotent gateway reads only.
//! Order placement is never passed through [`RetryPolicy::run`]; it is
//! retried manually, and only after an idempotency-key lookup proves the
//! previous attempt did not land.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ports::GatewayError;
use crate::observability;

/// Retry policy for gateway calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first (default: 3).
    pub max_attempts: u32,
    /// Delay before the first retry (default: 100ms).
    pub initial_backoff: Duration,
    /// Upper bound for any delay (default: 5s).
    pub max_backoff: Duration,
    /// Growth factor per retry (default: 2.0).
    pub multiplier: f64,
    /// Relative jitter, 0.2 = ±20% (default: 0.2).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries once and never waits.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }

    /// Fresh backoff sequence for one logical operation.
    #[must_use]
    pub const fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self)
    }

    /// Run an idempotent gateway read, retrying retryable failures.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut backoff = self.backoff();
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => {
                    let Some(delay) = backoff.next_backoff() else {
                        return Err(err);
                    };
                    let delay = match &err {
                        GatewayError::RateLimited {
                            retry_after: Some(hint),
                        } => delay.max(*hint).min(self.max_backoff),
                        _ => delay,
                    };
                    tracing::warn!(
                        operation,
                        error = %err,
                        attempt = backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "Gateway call failed, retrying"
                    );
                    observability::record_gateway_retry(operation);
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Backoff sequence for one operation.
#[derive(Debug)]
pub struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
    multiplier: f64,
    jitter_factor: f64,
}

impl ExponentialBackoff {
    /// Start a sequence from a policy.
    #[must_use]
    pub const fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 1,
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
            multiplier: policy.multiplier,
            jitter_factor: policy.jitter_factor,
        }
    }

    /// Delay before the next attempt, or `None` once attempts are exhausted.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }

        let exponent = i32::try_from(self.attempt - 1).unwrap_or(i32::MAX);
        let base = (self.initial_backoff_ms as f64 * self.multiplier.powi(exponent))
            .min(self.max_backoff_ms as f64);
        let jitter = base * self.jitter_factor;
        let jittered = if jitter > 0.0 {
            rand::rng().random_range((base - jitter).max(0.0)..=base + jitter)
        } else {
            base
        };

        self.attempt += 1;
        Some(Duration::from_millis(
            (jittered as u64).min(self.max_backoff_ms),
        ))
    }

    /// Attempt number that is about to run (1-based).
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }

    #[test]
    fn backoff_grows_and_stops() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(250),
            multiplier: 2.0,
            jitter_factor: 0.0,
        };
        let mut backoff = policy.backoff();

        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(250)));
        assert_eq!(backoff.next_backoff(), None);
    }

    #[test]
    fn jitter_stays_in_band() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter_factor: 0.2,
        };
        for _ in 0..50 {
            let delay = policy.backoff().next_backoff().unwrap();
            assert!(delay >= Duration::from_millis(800) && delay <= Duration::from_millis(1200));
        }
    }

    #[test]
    fn no_retry_gives_no_delay() {
        assert_eq!(RetryPolicy::no_retry().backoff().next_backoff(), None);
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast_policy(3)
            .run("ticker", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(GatewayError::Unavailable {
                        message: "connection reset".to_string(),
                    })
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = fast_policy(2)
            .run("balance", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::Timeout {
                    message: "slow".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(GatewayError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_rejections() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = fast_policy(5)
            .run("cancel", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::Rejected {
                    reason: "order already filled".to_string(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
