//! Retry logic with a constant inter-attempt delay
//!
//! Every failure returned by the operation is retried until the attempt budget
//! is spent. Only the error of the final attempt is surfaced.
//!
//! # Example
//!
//! ```no_run
//! use batchpool::retry::{RetryPolicy, run_with_retry};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::new(3, Duration::from_millis(500));
//! let value = run_with_retry(&policy, |_attempt| async {
//!     // Your operation here
//!     Ok::<_, String>(42)
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::Settings;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempt budget and delay for one execution unit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` means exactly one attempt
    pub retries: u32,
    /// Constant wait between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Resolve a batch policy: each override wins over the settings default
    pub fn resolve(settings: &Settings, retries: Option<u32>, delay: Option<Duration>) -> Self {
        Self {
            retries: retries.unwrap_or(settings.retries),
            delay: delay.unwrap_or(settings.retry_delay),
        }
    }

    /// Total number of attempts this policy allows
    pub fn max_attempts(&self) -> u64 {
        u64::from(self.retries) + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::resolve(&Settings::default(), None, None)
    }
}

/// What to do after a failed attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then run the next attempt
    RetryAfter(Duration),
    /// Budget exhausted; the failure is terminal
    GiveUp,
}

/// Attempt counter for one execution unit
#[derive(Clone, Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryState {
    /// Start at attempt 0
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Failures recorded so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failure and decide whether another attempt follows
    pub fn on_failure(&mut self) -> RetryDecision {
        if self.attempt < self.policy.retries {
            self.attempt += 1;
            RetryDecision::RetryAfter(self.policy.delay)
        } else {
            RetryDecision::GiveUp
        }
    }
}

/// Run `operation` until it succeeds or the policy's budget is spent
///
/// The operation receives the 1-based attempt number. Attempts are strictly
/// sequential; on terminal failure the error of the last attempt is returned.
pub async fn run_with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut state = RetryState::new(*policy);

    loop {
        match operation(state.attempt() + 1).await {
            Ok(result) => {
                if state.attempt() > 0 {
                    tracing::info!(attempts = state.attempt() + 1, "Task succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => match state.on_failure() {
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        error = %e,
                        attempt = state.attempt(),
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        "Task failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                RetryDecision::GiveUp => {
                    if policy.retries > 0 {
                        tracing::debug!(
                            attempts = policy.max_attempts(),
                            "Retry budget exhausted"
                        );
                    }
                    return Err(e);
                }
            },
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_success_no_retry() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&policy, |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn test_retry_then_succeed() {
        let policy = RetryPolicy::new(3, Duration::from_millis(5));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&policy, |_| {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 { Err(format!("fail {count}")) } else { Ok(count) }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2, "success attempt's value is returned");
        assert_eq!(counter.load(Ordering::SeqCst), 3, "should fail twice then succeed");
    }

    #[tokio::test]
    async fn test_retry_exhausted_returns_last_error() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&policy, |attempt| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(format!("failure on attempt {attempt}"))
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "failure on attempt 3");
        assert_eq!(counter.load(Ordering::SeqCst), 3, "should try initial + 2 retries");
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(10));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let start = std::time::Instant::now();

        let result = run_with_retry(&policy, |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("boom")
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1), "no delay after final attempt");
    }

    #[tokio::test]
    async fn test_constant_delay_between_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(40));
        let timestamps = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let ts_clone = timestamps.clone();

        let _ = run_with_retry(&policy, |_| {
            let ts = ts_clone.clone();
            async move {
                ts.lock().await.push(std::time::Instant::now());
                Err::<(), _>("always")
            }
        })
        .await;

        let ts = timestamps.lock().await;
        assert_eq!(ts.len(), 4, "initial call + 3 retries");
        // Upper bound is generous to tolerate CI scheduling overhead
        for i in 1..ts.len() {
            let gap = ts[i].duration_since(ts[i - 1]);
            assert!(gap >= Duration::from_millis(40), "gap {i} was {gap:?}");
            assert!(gap < Duration::from_millis(500), "gap {i} was {gap:?}");
        }
    }

    #[tokio::test]
    async fn attempt_numbers_are_sequential() {
        let policy = RetryPolicy::new(4, Duration::ZERO);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let _ = run_with_retry(&policy, |attempt| {
            let seen = seen_clone.clone();
            async move {
                seen.lock().unwrap().push(attempt);
                if attempt < 3 { Err("not yet") } else { Ok(()) }
            }
        })
        .await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn retry_state_transitions() {
        let mut state = RetryState::new(RetryPolicy::new(2, Duration::from_millis(7)));
        assert_eq!(state.attempt(), 0);
        assert_eq!(state.on_failure(), RetryDecision::RetryAfter(Duration::from_millis(7)));
        assert_eq!(state.attempt(), 1);
        assert_eq!(state.on_failure(), RetryDecision::RetryAfter(Duration::from_millis(7)));
        assert_eq!(state.on_failure(), RetryDecision::GiveUp);
        assert_eq!(state.attempt(), 2, "give-up does not advance the counter");
    }

    #[test]
    fn resolve_prefers_batch_overrides() {
        let settings = Settings {
            retries: 5,
            retry_delay: Duration::from_secs(3),
            ..Default::default()
        };
        assert_eq!(
            RetryPolicy::resolve(&settings, None, None),
            RetryPolicy::new(5, Duration::from_secs(3))
        );
        assert_eq!(
            RetryPolicy::resolve(&settings, Some(0), Some(Duration::ZERO)),
            RetryPolicy::new(0, Duration::ZERO)
        );
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
        assert_eq!(RetryPolicy::new(u32::MAX, Duration::ZERO).max_attempts(), 1 << 32);
    }
}
