use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::debug;

use crate::domain::error::StoreError;

/// Upper bound for a single backoff delay (unless `backoff` itself is larger).
const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Bounded retry for transient store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for every further retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    fn retries(&self) -> usize {
        self.max_attempts.max(1).saturating_sub(1) as usize
    }

    fn max_delay(&self) -> Duration {
        MAX_BACKOFF.max(self.backoff)
    }

    fn backoff_builder(&self) -> ExponentialBuilder {
        // backon's max_times counts retries, not attempts.
        ExponentialBuilder::default()
            .with_min_delay(self.backoff)
            .with_max_delay(self.max_delay())
            .with_factor(2.0)
            .with_max_times(self.retries())
    }

    /// Longest one store call can take: every attempt runs into `timeout`
    /// and every backoff is slept in full.
    pub fn worst_case(&self, timeout: Duration) -> Duration {
        let mut total = timeout.saturating_mul(self.max_attempts.max(1));
        let mut delay = self.backoff;
        for _ in 0..self.retries() {
            total = total.saturating_add(delay.min(self.max_delay()));
            delay = delay.saturating_mul(2);
        }
        total
    }
}

/// Final result of a store call together with the number of attempts made.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T, StoreError>,
    pub attempts: u32,
}

impl<T> Attempted<T> {
    /// Only transient failures are retried, so any earlier attempt ended
    /// without a definite answer and may still have taken effect.
    pub fn after_unconfirmed_attempt(&self) -> bool {
        self.attempts > 1
    }
}

/// Run one store call under a per-attempt timeout, retrying transient
/// failures according to `retry`. Non-transient failures return immediately.
pub async fn call_store<T, F, Fut>(
    op: &'static str,
    timeout: Duration,
    retry: RetryPolicy,
    call: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    call_store_attempts(op, timeout, retry, call).await.result
}

/// Like [`call_store`], but also reports how many attempts were made.
pub async fn call_store_attempts<T, F, Fut>(
    op: &'static str,
    timeout: Duration,
    retry: RetryPolicy,
    mut call: F,
) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let attempts = AtomicU32::new(0);

    let result = (|| {
        attempts.fetch_add(1, Ordering::SeqCst);
        let fut = call();
        async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(r) => r,
                Err(_) => Err(StoreError::Timeout {
                    after_ms: timeout.as_millis() as u64,
                }),
            }
        }
    })
    .retry(retry.backoff_builder())
    .sleep(tokio::time::sleep)
    .when(StoreError::is_transient)
    .notify(|e: &StoreError, delay: Duration| {
        debug!(
            op,
            attempt = attempts.load(Ordering::SeqCst),
            backoff_ms = delay.as_millis() as u64,
            error = %e,
            "Transient store failure, retrying"
        );
    })
    .await;

    Attempted {
        result,
        attempts: attempts.load(Ordering::SeqCst),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let attempted = call_store_attempts("op", TIMEOUT, RetryPolicy::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(StoreError::Unavailable("503".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(attempted.result, Ok(2));
        assert_eq!(attempted.attempts, 3);
        assert!(attempted.after_unconfirmed_attempt());
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_are_bounded() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_store("op", TIMEOUT, RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::Unavailable("down".into())) }
        })
        .await;

        assert_eq!(result, Err(StoreError::Unavailable("down".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failures_are_not_retried() {
        let attempted: Attempted<()> =
            call_store_attempts("op", TIMEOUT, RetryPolicy::default(), || async {
                Err(StoreError::NotFound("not found".into()))
            })
            .await;

        assert_eq!(attempted.result, Err(StoreError::NotFound("not found".into())));
        assert_eq!(attempted.attempts, 1);
        assert!(!attempted.after_unconfirmed_attempt());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_calls_time_out() {
        let result: Result<(), _> = call_store("op", TIMEOUT, RetryPolicy::no_retry(), || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err(StoreError::Timeout { after_ms: 500 }));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_attempts() {
        let started = tokio::time::Instant::now();
        let result: Result<(), _> = call_store("op", TIMEOUT, RetryPolicy::default(), || async {
            Err(StoreError::Unavailable("down".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(started.elapsed(), Duration::from_millis(100 + 200));
    }

    #[test]
    fn worst_case_counts_every_timeout_and_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.worst_case(Duration::from_secs(2)),
            Duration::from_millis(3 * 2000 + 100 + 200)
        );
        assert_eq!(
            RetryPolicy::no_retry().worst_case(Duration::from_secs(2)),
            Duration::from_secs(2)
        );

        let capped = RetryPolicy {
            max_attempts: 4,
            backoff: Duration::from_millis(1500),
        };
        // 1500, then 3000 capped to the 2000 ceiling, then 2000 again.
        assert_eq!(
            capped.worst_case(Duration::from_secs(1)),
            Duration::from_millis(4 * 1000 + 1500 + 2000 + 2000)
        );
    }
}
