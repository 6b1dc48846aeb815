//! Exponential-backoff retry around a single provider call.
//!
//! ## Why retry absent results too
//!
//! Free-tier vision and chat endpoints occasionally answer 200 with an empty
//! body under load. Treating `Ok(None)` like a transient failure lets the
//! same provider have a second go before the orchestrator moves on, which is
//! usually cheaper than dropping to a lower-quality tier.
//!
//! With the default policy (2 attempts, 2000 ms base) the worst case per
//! provider is one 2 s pause. With 3 attempts the pauses are 2 s then 4 s.

use crate::config::TranslatorConfig;
use std::fmt::Display;
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// How many times to invoke an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// A policy that invokes the operation exactly once.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause before retry number `retry` (1-based): `base * 2^(retry-1)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Invoke `operation` until it yields `Ok(Some(_))` or attempts run out.
    ///
    /// After the last attempt the last outcome is returned as-is: the error
    /// if it failed, `Ok(None)` if it produced nothing.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            let outcome = operation().await;
            match &outcome {
                Ok(Some(_)) => return outcome,
                Ok(None) => debug!("{}: attempt {} returned nothing", label, attempt),
                Err(e) => warn!("{}: attempt {} failed: {}", label, attempt, e),
            }

            if attempt >= self.max_attempts {
                return outcome;
            }

            let backoff = self.delay_for(attempt);
            debug!(
                "{}: retry {}/{} after {}ms",
                label,
                attempt,
                self.max_attempts - 1,
                backoff.as_millis()
            );
            sleep(backoff).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TranslatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[test]
    fn clamps_to_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn delays_double() {
        let p = RetryPolicy::new(4, Duration::from_millis(500));
        assert_eq!(p.delay_for(1), Duration::from_millis(500));
        assert_eq!(p.delay_for(2), Duration::from_millis(1000));
        assert_eq!(p.delay_for(3), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn fails_twice_then_succeeds_with_two_sleeps() {
        let base = Duration::from_millis(100);
        let policy = RetryPolicy::new(3, base);
        let calls = AtomicU32::new(0);
        let stamps = Mutex::new(Vec::new());

        let result: Result<Option<&str>, String> = policy
            .run("test", || {
                stamps.lock().unwrap().push(Instant::now());
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(format!("boom {n}"))
                    } else {
                        Ok(Some("done"))
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(Some("done")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let stamps = stamps.lock().unwrap();
        let first_gap = stamps[1] - stamps[0];
        let second_gap = stamps[2] - stamps[1];
        assert!(first_gap >= base && first_gap < base + Duration::from_millis(5));
        assert!(second_gap >= base * 2 && second_gap < base * 2 + Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_error_when_exhausted() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        let calls = AtomicU32::new(0);
        let result: Result<Option<()>, String> = policy
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("fail {n}")) }
            })
            .await;
        assert_eq!(result, Err("fail 1".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_result_is_retried_then_returned() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let calls = AtomicU32::new(0);
        let result: Result<Option<()>, String> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            })
            .await;
        assert_eq!(result, Ok(None));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn success_on_first_attempt_does_not_sleep() {
        let policy = RetryPolicy::new(5, Duration::from_secs(3600));
        let result: Result<Option<u8>, String> = policy.run("test", || async { Ok(Some(7)) }).await;
        assert_eq!(result, Ok(Some(7)));
    }
}
