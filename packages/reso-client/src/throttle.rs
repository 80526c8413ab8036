//! Request pacing and retry backoff.
//!
//! The MLS allows a fixed request rate per token. Every outbound call waits on
//! a shared [`Throttle`]; 429 responses are retried on a [`RetryPolicy`].

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::time::Duration;

/// Minimum spacing between outbound MLS requests.
pub const DEFAULT_MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(400);

/// Enforces a minimum interval between calls.
///
/// One permit per interval with no burst allowance, so calls from this
/// process never exceed one per interval. A zero interval disables pacing.
pub struct Throttle {
    limiter: Option<DefaultDirectRateLimiter>,
    interval: Duration,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        // Quota::with_period yields a burst of one cell.
        let limiter = Quota::with_period(interval).map(RateLimiter::direct);
        Self { limiter, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next call is allowed.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_REQUEST_INTERVAL)
    }
}

/// Exponential backoff for rate-limited requests.
///
/// Retry `n` (zero-based) waits `base_delay * 2^(n + 1)`: with the default
/// 600 ms base that is 1.2 s, 2.4 s, 4.8 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry + 1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn default_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1200));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2400));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4800));
    }

    #[tokio::test]
    async fn throttle_spaces_calls() {
        let throttle = Throttle::new(Duration::from_millis(50));
        let start = Instant::now();

        for _ in 0..3 {
            throttle.wait().await;
        }

        // First call is immediate, the next two wait one interval each.
        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[tokio::test]
    async fn zero_interval_disables_throttle() {
        let throttle = Throttle::new(Duration::ZERO);
        let start = Instant::now();

        for _ in 0..10 {
            throttle.wait().await;
        }

        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
