//! # Global supervisor configuration.
//!
//! Provides [`Config`] centralized settings for the connection supervisor:
//! client/pool tuning, retry policy, event-bus capacity and shutdown grace.
//!
//! [`ClientSettings`] carries documented defaults; callers override individual
//! fields through [`ClientOverrides`] and the override always wins.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use connvisor::{ClientOverrides, Config};
//!
//! let mut cfg = Config::default();
//! cfg.retry.max_attempts = 3;
//! cfg.grace = Duration::from_secs(5);
//! cfg.client = cfg.client.merged(&ClientOverrides {
//!     max_pool_size: Some(25),
//!     ..ClientOverrides::default()
//! });
//!
//! assert_eq!(cfg.client.max_pool_size, 25);
//! assert_eq!(cfg.client.connect_timeout, Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Pool-tuning options handed to the underlying client.
///
/// Pooling itself is the client's job; the supervisor only forwards these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    /// Upper bound on pooled connections.
    pub max_pool_size: u32,
    /// Connections the pool keeps warm.
    pub min_pool_size: u32,
    /// TCP/TLS establishment timeout per connection.
    pub connect_timeout: Duration,
    /// How long the client waits for a usable server before failing an operation.
    pub server_selection_timeout: Duration,
}

impl Default for ClientSettings {
    /// Returns the documented defaults:
    /// - `max_pool_size = 10`
    /// - `min_pool_size = 0`
    /// - `connect_timeout = 10s`
    /// - `server_selection_timeout = 30s`
    fn default() -> Self {
        Self {
            max_pool_size: 10,
            min_pool_size: 0,
            connect_timeout: Duration::from_secs(10),
            server_selection_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientSettings {
    /// Merges caller overrides into these settings. Overrides win.
    #[must_use]
    pub fn merged(mut self, overrides: &ClientOverrides) -> Self {
        if let Some(v) = overrides.max_pool_size {
            self.max_pool_size = v;
        }
        if let Some(v) = overrides.min_pool_size {
            self.min_pool_size = v;
        }
        if let Some(v) = overrides.connect_timeout {
            self.connect_timeout = v;
        }
        if let Some(v) = overrides.server_selection_timeout {
            self.server_selection_timeout = v;
        }
        self
    }
}

/// Caller-supplied overrides for [`ClientSettings`]. `None` keeps the default.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientOverrides {
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
    pub connect_timeout: Option<Duration>,
    pub server_selection_timeout: Option<Duration>,
}

/// Automatic-reconnection policy for unsolicited drops.
///
/// Explicit `connect()` failures are never retried automatically; this policy
/// only governs what happens after a connection that was up goes down.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Ceiling on automatic reattempts since the last successful connection.
    ///
    /// Once reached, the supervisor goes quiet until an explicit `connect()`
    /// resets the counter.
    pub max_attempts: u32,
    /// How reattempt delays grow.
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    /// Returns `max_attempts = 5` with the default [`BackoffPolicy`]
    /// (1s base, ×2 growth, 30s cap, bounded jitter).
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Global configuration for the connection supervisor.
///
/// ## Field semantics
/// - `client`: pool-tuning options forwarded to the connector
/// - `retry`: automatic-reconnection policy for unsolicited drops
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
/// - `grace`: maximum wait for graceful disconnect during shutdown
#[derive(Clone, Debug)]
pub struct Config {
    /// Default connection target, used by `connect_default()`.
    ///
    /// `None` means every connect call must name its target explicitly.
    pub uri: Option<String>,
    /// Pool-tuning options handed to the underlying client.
    pub client: ClientSettings,
    /// Automatic-reconnection policy.
    pub retry: RetryPolicy,
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// observe `Lagged` and skip older items.
    pub bus_capacity: usize,
    /// Maximum time the shutdown coordinator waits for a graceful disconnect.
    pub grace: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    /// - `uri = None` (targets are named per call)
    /// - `client = ClientSettings::default()`
    /// - `retry = RetryPolicy::default()`
    /// - `bus_capacity = 1024`
    /// - `grace = 10s`
    fn default() -> Self {
        Self {
            uri: None,
            client: ClientSettings::default(),
            retry: RetryPolicy::default(),
            bus_capacity: 1024,
            grace: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.client.max_pool_size, 10);
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
    }

    #[test]
    fn test_override_wins() {
        let settings = ClientSettings::default().merged(&ClientOverrides {
            connect_timeout: Some(Duration::from_secs(3)),
            ..ClientOverrides::default()
        });
        assert_eq!(settings.connect_timeout, Duration::from_secs(3));
        assert_eq!(settings.max_pool_size, 10);
    }

    #[test]
    fn test_empty_overrides_keep_defaults() {
        let settings = ClientSettings::default().merged(&ClientOverrides::default());
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn test_bus_capacity_clamped_to_one() {
        let mut cfg = Config::default();
        cfg.bus_capacity = 0;
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
