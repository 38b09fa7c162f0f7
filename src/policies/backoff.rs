//! # Backoff policy for reconnection delays.
//!
//! [`BackoffPolicy`] controls how reattempt delays grow after repeated
//! connection failures. It is parameterized by:
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! The delay for attempt `n` (0-indexed) is computed as `first × factor^n`,
//! clamped to `max`, then jitter is applied. Because the base delay is derived
//! purely from the attempt number, jitter output never feeds back into
//! subsequent calculations — delays cannot shrink over time.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use connvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_secs(1),
//!     max: Duration::from_secs(30),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! // Attempt 0 — uses 'first' (1s)
//! assert_eq!(backoff.next(0), Duration::from_secs(1));
//!
//! // Attempt 1 — first × factor^1 = 2s
//! assert_eq!(backoff.next(1), Duration::from_secs(2));
//!
//! // Attempt 10 — 1s × 2^10 = 1024s → capped at max=30s
//! assert_eq!(backoff.next(10), Duration::from_secs(30));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Reconnection backoff policy.
///
/// Encapsulates parameters that determine how reattempt delays grow:
/// - [`BackoffPolicy::factor`] — multiplicative growth factor;
/// - [`BackoffPolicy::first`] — the initial delay;
/// - [`BackoffPolicy::max`] — the maximum delay cap.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first reattempt.
    pub first: Duration,
    /// Maximum delay cap for reattempts.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter policy to prevent synchronized retry storms.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `first = 1s`;
    /// - `factor = 2.0` (exponential doubling);
    /// - `max = 30s`;
    /// - `jitter = JitterPolicy::Bounded(1s)`.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::default(),
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given attempt number (0-indexed).
    ///
    /// The base delay is `first × factor^attempt`, clamped to [`BackoffPolicy::max`].
    /// Jitter is applied to the clamped base, but the result is **never** fed back
    /// into subsequent calculations — each attempt derives its base independently.
    ///
    /// # Notes
    /// - If `factor` equals 1.0, the delay remains constant at `first` (up to `max`).
    /// - If `factor` is greater than 1.0, delays grow exponentially up to `max`.
    /// - Non-finite or overflowing intermediate values clamp to `max`.
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let clamped_exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(clamped_exp);

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::from_secs_f64(unclamped_secs)
            };

        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_attempt_zero_returns_first() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_growth_no_jitter() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(1000),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };

        assert_eq!(policy.next(0), Duration::from_millis(1000));
        assert_eq!(policy.next(1), Duration::from_millis(2000));
        assert_eq!(policy.next(2), Duration::from_millis(4000));
        assert_eq!(policy.next(3), Duration::from_millis(8000));
    }

    #[test]
    fn test_clamped_to_max() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(10), Duration::from_secs(1));
    }

    #[test]
    fn test_first_exceeds_max() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn test_bounded_jitter_keeps_exponential_floor() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(1000),
            max: Duration::from_secs(120),
            factor: 2.0,
            jitter: JitterPolicy::Bounded(Duration::from_millis(1000)),
        };

        for attempt in 0..6 {
            let floor_ms = 1000u64 * 2u64.pow(attempt);
            let delay = policy.next(attempt);
            assert!(
                delay >= Duration::from_millis(floor_ms),
                "attempt {}: delay {:?} below floor {}ms",
                attempt,
                delay,
                floor_ms
            );
            assert!(
                delay <= Duration::from_millis(floor_ms + 1000),
                "attempt {}: delay {:?} above floor+cap {}ms",
                attempt,
                delay,
                floor_ms + 1000
            );
        }
    }

    #[test]
    fn test_delays_non_decreasing_with_bounded_jitter() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(1000),
            max: Duration::from_secs(300),
            factor: 2.0,
            jitter: JitterPolicy::Bounded(Duration::from_millis(1000)),
        };

        // Floor(k+1) = 2 * Floor(k) >= Floor(k) + cap, so even worst-case
        // jitter cannot make a later delay shorter than an earlier one.
        let mut prev = Duration::ZERO;
        for attempt in 0..8 {
            let delay = policy.next(attempt);
            assert!(delay >= prev, "attempt {}: {:?} < {:?}", attempt, delay, prev);
            prev = delay;
        }
    }

    #[test]
    fn test_full_jitter_bounds() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(1000),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::Full,
        };
        for attempt in 0..50 {
            let delay = policy.next(attempt);
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_equal_jitter_bounds() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(1000),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::Equal,
        };
        for attempt in 0..50 {
            let delay = policy.next(attempt);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_huge_attempt_clamps_to_max() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(100), Duration::from_secs(60));
    }

    #[test]
    fn test_non_finite_overflow_clamps_to_max() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(10),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(10));
    }
}
