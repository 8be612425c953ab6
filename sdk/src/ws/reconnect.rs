//! Bounded exponential reconnect backoff.

use std::time::Duration;

/// Reconnect attempt counter with doubling delays.
///
/// Attempt `n` (1-based) waits `base_delay * 2^(n-1)`. Once `max_attempts`
/// attempts have been handed out, [`next_delay`](Self::next_delay) returns
/// `None` until [`reset`](Self::reset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    attempts: u32,
    max_attempts: u32,
    base_delay: Duration,
}

impl ReconnectPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            base_delay,
        }
    }

    /// Returns the delay for the next attempt and counts it, or `None` if exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        self.attempts += 1;
        let factor = 2u32.saturating_pow(self.attempts - 1);
        Some(self.base_delay.saturating_mul(factor))
    }

    /// Resets the attempt counter.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Returns the number of attempts handed out since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if no attempts are left.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_until_exhausted() {
        let mut policy = ReconnectPolicy::new(5, Duration::from_millis(1000));
        let delays: Vec<u128> = std::iter::from_fn(|| policy.next_delay())
            .map(|d| d.as_millis())
            .collect();

        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
        assert!(policy.is_exhausted());
        assert_eq!(policy.attempts(), 5);
        assert_eq!(policy.next_delay(), None);
        assert_eq!(policy.attempts(), 5);
    }

    #[test]
    fn test_reset() {
        let mut policy = ReconnectPolicy::new(2, Duration::from_millis(100));
        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_none());

        policy.reset();
        assert_eq!(policy.attempts(), 0);
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_zero_attempts_is_exhausted() {
        let mut policy = ReconnectPolicy::new(0, Duration::from_millis(100));
        assert!(policy.is_exhausted());
        assert_eq!(policy.next_delay(), None);
    }

    #[test]
    fn test_large_attempt_counts_saturate() {
        let mut policy = ReconnectPolicy::new(100, Duration::from_secs(1));
        let last = std::iter::from_fn(|| policy.next_delay()).last();
        assert_eq!(policy.max_attempts(), 100);
        assert!(last.is_some());
    }
}
