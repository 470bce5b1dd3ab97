//! Retry policy for synthesis attempts.

use super::ProviderError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Bounded exponential backoff.
///
/// Delays double from `min_delay` up to `max_delay`, with up to 25% jitter
/// added so synchronized clients spread out. A provider-sent `Retry-After`
/// overrides the computed delay but never the cap.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            min_delay,
            max_delay,
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Returns how long to wait before retrying after a failed attempt, or
    /// `None` when the error is permanent or attempts are exhausted.
    /// `attempt` is 0-based (first failure => attempt=0).
    pub fn next_delay(&self, attempt: u32, err: &ProviderError) -> Option<Duration> {
        if !err.is_transient() || attempt >= self.max_retries {
            return None;
        }
        if let Some(after) = err.retry_after() {
            return Some(after.min(self.max_delay));
        }
        Some(self.delay_for_attempt(attempt))
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(32);
        let base_ms = (self.min_delay.as_millis() as u64).saturating_mul(factor);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped_ms.saturating_add(jitter_ms(capped_ms)))
    }
}

/// Cheap clock-derived jitter in `[0, base/4)`.
fn jitter_ms(base_ms: u64) -> u64 {
    let span = base_ms / 4;
    if span == 0 {
        return 0;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    nanos % span
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> ProviderError {
        ProviderError::Api {
            status: 503,
            message: String::new(),
            retry_after_ms: None,
        }
    }

    fn permanent() -> ProviderError {
        ProviderError::Api {
            status: 400,
            message: String::new(),
            retry_after_ms: None,
        }
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(0, &permanent()), None);
    }

    #[test]
    fn test_attempts_are_bounded() {
        let policy = RetryPolicy::default();
        assert!(policy.next_delay(0, &transient()).is_some());
        assert!(policy.next_delay(2, &transient()).is_some());
        assert_eq!(policy.next_delay(3, &transient()), None);
        assert_eq!(policy.next_delay(100, &transient()), None);
    }

    #[test]
    fn test_none_policy_never_retries() {
        assert_eq!(RetryPolicy::none().next_delay(0, &transient()), None);
    }

    #[test]
    fn test_delays_grow_exponentially_within_bounds() {
        let policy = RetryPolicy::new(
            10,
            Duration::from_millis(100),
            Duration::from_millis(2_000),
        );
        for attempt in 0..10 {
            let delay = policy
                .next_delay(attempt, &transient())
                .expect("within max_retries");
            let base = (100u64 << attempt).min(2_000);
            let max_with_jitter = base + base / 4;
            assert!(
                delay >= Duration::from_millis(base),
                "attempt {}: {:?} below base {}ms",
                attempt,
                delay,
                base
            );
            assert!(
                delay <= Duration::from_millis(max_with_jitter),
                "attempt {}: {:?} above jitter ceiling {}ms",
                attempt,
                delay,
                max_with_jitter
            );
        }
    }

    #[test]
    fn test_retry_after_overrides_backoff_but_not_cap() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(5));
        let hinted = ProviderError::Api {
            status: 429,
            message: String::new(),
            retry_after_ms: Some(2_500),
        };
        assert_eq!(
            policy.next_delay(0, &hinted),
            Some(Duration::from_millis(2_500))
        );

        let excessive = ProviderError::Api {
            status: 429,
            message: String::new(),
            retry_after_ms: Some(600_000),
        };
        assert_eq!(
            policy.next_delay(0, &excessive),
            Some(Duration::from_secs(5))
        );
    }
}
