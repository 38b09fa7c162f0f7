//! # Jitter policy for reconnection delays.
//!
//! [`JitterPolicy`] adds randomness to backoff delays so that many process
//! instances reconnecting to the same database after a shared outage do not
//! retry in lockstep.
//!
//! - [`JitterPolicy::None`] — no randomization, predictable delays
//! - [`JitterPolicy::Bounded`] — delay + random[0, cap] (preserves the exponential floor)
//! - [`JitterPolicy::Full`] — random delay in [0, backoff_delay] (most aggressive)
//! - [`JitterPolicy::Equal`] — delay = backoff_delay/2 + random[0, backoff_delay/2]

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of reconnection delays.
///
/// ## Trade-offs
/// - **None**: predictable, but risks a retry storm across instances
/// - **Bounded**: keeps the computed delay as a floor, adds up to `cap` on top
///   (recommended default; reconnect spacing stays monotonic per attempt)
/// - **Full**: maximum randomness, can collapse the delay to near zero
/// - **Equal**: preserves at least half of the computed delay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact backoff delay.
    ///
    /// Use when only one instance reconnects (no herd risk) or when
    /// predictable timing is required (testing/debugging).
    None,

    /// Additive jitter: delay + random[0, cap].
    ///
    /// The computed backoff delay is a hard floor; a random offset up to
    /// `cap` is added on top.
    Bounded(Duration),

    /// Full jitter: random delay in [0, backoff_delay].
    Full,

    /// Equal jitter: delay = backoff_delay/2 + random[0, backoff_delay/2].
    Equal,
}

impl Default for JitterPolicy {
    /// Returns [`JitterPolicy::Bounded`] with a 1 second cap.
    fn default() -> Self {
        JitterPolicy::Bounded(Duration::from_secs(1))
    }
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Bounded(cap) => self.bounded_jitter(delay, *cap),
            JitterPolicy::Full => self.full_jitter(delay),
            JitterPolicy::Equal => self.equal_jitter(delay),
        }
    }

    /// Bounded jitter: delay + random[0, cap]
    fn bounded_jitter(&self, delay: Duration, cap: Duration) -> Duration {
        let cap_ms = cap.as_millis() as u64;
        if cap_ms == 0 {
            return delay;
        }
        let mut rng = rand::rng();
        delay + Duration::from_millis(rng.random_range(0..=cap_ms))
    }

    /// Full jitter: random[0, delay]
    fn full_jitter(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(0..=ms))
    }

    /// Equal jitter: delay/2 + random[0, delay/2]
    fn equal_jitter(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let half = ms / 2;
        let jitter = if half == 0 {
            0
        } else {
            let mut rng = rand::rng();
            rng.random_range(0..=half)
        };
        Duration::from_millis(half + jitter)
    }
}
