//! Bounded-retry policy with randomized jitter delays.
//!
//! Every logical GET/POST gets a fixed attempt budget (default 3). The delay
//! between attempts is drawn independently per attempt from a bounded
//! interval (default 5-10 seconds) rather than growing exponentially: the
//! clients here run against scraping targets where spreading retries out
//! randomly avoids thundering-herd bursts, and the interval is already long
//! enough for transient conditions to clear.
//!
//! The policy does not sleep or loop itself; callers feed it the failed
//! attempt and act on the returned [`RetryDecision`]. That keeps the loop in
//! one place per caller and lets the same budget cover both transient
//! transport failures and re-authentication rounds.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::error::FetchError;

/// Default maximum attempts per logical call (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default lower bound for the randomized inter-attempt delay.
const DEFAULT_WAIT_MIN: Duration = Duration::from_millis(5_000);

/// Default upper bound for the randomized inter-attempt delay.
const DEFAULT_WAIT_MAX: Duration = Duration::from_millis(10_000);

/// Decision on whether to re-attempt a failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so the first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry; surface the error to the caller.
    GiveUp {
        /// Human-readable reason why no further attempt is made.
        reason: String,
    },
}

/// Attempt budget plus randomized inter-attempt delay bounds.
///
/// Not persisted anywhere; a policy is plain configuration and each delay is
/// recomputed per attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Lower bound of the random delay interval.
    wait_min: Duration,

    /// Upper bound of the random delay interval.
    wait_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            wait_min: DEFAULT_WAIT_MIN,
            wait_max: DEFAULT_WAIT_MAX,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom settings.
    ///
    /// `max_attempts` is clamped to at least 1; the delay bounds are swapped
    /// if given in the wrong order.
    #[must_use]
    pub fn new(max_attempts: u32, wait_min: Duration, wait_max: Duration) -> Self {
        let (wait_min, wait_max) = if wait_min <= wait_max {
            (wait_min, wait_max)
        } else {
            (wait_max, wait_min)
        };
        Self {
            max_attempts: max_attempts.max(1),
            wait_min,
            wait_max,
        }
    }

    /// Returns the configured attempt budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Evaluates a failed attempt against the budget.
    ///
    /// `attempt` is the attempt number that just failed (1-indexed). Errors
    /// for which [`FetchError::is_retryable`] is false never retry, no matter
    /// how much budget remains.
    #[must_use]
    pub fn evaluate(&self, error: &FetchError, attempt: u32) -> RetryDecision {
        if !error.is_retryable() {
            return RetryDecision::GiveUp {
                reason: "error is not retryable".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "attempt budget exhausted");
            return RetryDecision::GiveUp {
                reason: format!("attempt budget ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.jitter_delay();
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Draws one random delay from the configured interval.
    ///
    /// Each attempt draws independently; there is no escalation across
    /// attempts.
    #[must_use]
    pub fn jitter_delay(&self) -> Duration {
        let min_ms = u64::try_from(self.wait_min.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.wait_max.as_millis()).unwrap_or(u64::MAX);
        if min_ms == max_ms {
            return Duration::from_millis(min_ms);
        }
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(min_ms..=max_ms))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.wait_min, Duration::from_millis(5_000));
        assert_eq!(policy.wait_max, Duration::from_millis(10_000));
    }

    #[test]
    fn test_max_attempts_minimum_is_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_swapped_delay_bounds_are_reordered() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(1));
        assert_eq!(policy.wait_min, Duration::from_millis(1));
        assert_eq!(policy.wait_max, Duration::from_millis(10));
    }

    #[test]
    fn test_jitter_delay_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.jitter_delay();
            assert!(delay >= Duration::from_millis(5_000));
            assert!(delay <= Duration::from_millis(10_000));
        }
    }

    #[test]
    fn test_jitter_delay_is_independent_per_draw() {
        let policy = RetryPolicy::default();
        let samples: Vec<Duration> = (0..50).map(|_| policy.jitter_delay()).collect();
        let first = samples[0];
        assert!(
            samples.iter().any(|d| *d != first),
            "50 draws from a 5000ms-wide interval should not all be identical"
        );
    }

    #[test]
    fn test_evaluate_transient_error_retries() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2));
        let error = FetchError::timeout("https://example.com");
        let decision = policy.evaluate(&error, 1);
        match decision {
            RetryDecision::Retry { attempt, delay } => {
                assert_eq!(attempt, 2);
                assert!(delay >= Duration::from_millis(1));
                assert!(delay <= Duration::from_millis(2));
            }
            RetryDecision::GiveUp { reason } => panic!("expected retry, got give-up: {reason}"),
        }
    }

    #[test]
    fn test_evaluate_respects_attempt_budget() {
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);
        let error = FetchError::timeout("https://example.com");

        assert!(matches!(
            policy.evaluate(&error, 2),
            RetryDecision::Retry { attempt: 3, .. }
        ));
        let decision = policy.evaluate(&error, 3);
        match decision {
            RetryDecision::GiveUp { reason } => assert!(reason.contains("exhausted")),
            RetryDecision::Retry { .. } => panic!("attempt 3 of 3 must not retry"),
        }
    }

    #[test]
    fn test_evaluate_fatal_error_never_retries() {
        let policy = RetryPolicy::default();
        let error = FetchError::invalid_credentials("rejected");
        assert!(matches!(
            policy.evaluate(&error, 1),
            RetryDecision::GiveUp { .. }
        ));
    }

    #[test]
    fn test_evaluate_not_authenticated_is_retried() {
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);
        let error = FetchError::not_authenticated("https://example.com/account");
        assert!(matches!(
            policy.evaluate(&error, 1),
            RetryDecision::Retry { .. }
        ));
    }
}
