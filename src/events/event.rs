//! # Lifecycle events emitted by the connection supervisor.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Connection lifecycle**: connected, failed, dropped, reconnected, closed
//! - **Retry bookkeeping**: reattempt scheduled, retries exhausted
//! - **Shutdown**: requested, completed, forced
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! redacted target address, attempt numbers, reasons, and backoff delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order downstream.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use connvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::RetryScheduled)
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(4))
//!     .with_reason("connection reset by peer");
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.attempt, Some(3));
//! assert_eq!(ev.delay_ms, Some(4000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of connection lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Connection lifecycle ===
    /// A physical connect attempt succeeded; the handle is live.
    ///
    /// Sets:
    /// - `uri`: redacted target
    /// - `attempt`: attempt number that succeeded
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Connected,

    /// A physical connect attempt failed.
    ///
    /// Sets:
    /// - `uri`: redacted target
    /// - `attempt`: attempt number that failed
    /// - `reason`: client failure message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ConnectFailed,

    /// The client reported an error that did not (yet) drop the connection.
    ///
    /// Logged only; a subsequent `Disconnected`, if any, drives transitions.
    ///
    /// Sets:
    /// - `uri`: redacted target (when known)
    /// - `reason`: client error message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ClientFault,

    /// The connection dropped without an explicit `disconnect()` call.
    ///
    /// Sets:
    /// - `uri`: redacted target
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Disconnected,

    /// The connection is live again after an unsolicited drop (either via a
    /// scheduled reattempt or the client restoring itself).
    ///
    /// Sets:
    /// - `uri`: redacted target
    /// - `attempt`: reattempt number, when a scheduled reattempt reconnected
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Reconnected,

    /// The handle was closed by an explicit `disconnect()` or teardown.
    ///
    /// Sets:
    /// - `uri`: redacted target
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Closed,

    // === Retry bookkeeping ===
    /// A reattempt was scheduled after an unsolicited drop.
    ///
    /// Sets:
    /// - `uri`: redacted target
    /// - `attempt`: reattempt number (1-based since the last success)
    /// - `delay_ms`: delay before the reattempt fires
    /// - `reason`: last failure message, when failure-driven
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RetryScheduled,

    /// The reattempt ceiling was reached; no further automatic retries until
    /// an explicit `connect()` resets the counter.
    ///
    /// Sets:
    /// - `uri`: redacted target
    /// - `attempt`: the exhausted ceiling
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RetriesExhausted,

    // === Shutdown ===
    /// Shutdown requested (OS signal observed or coordinator invoked).
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ShutdownRequested,

    /// Graceful disconnect finished within the grace period.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ShutdownComplete,

    /// Grace period exceeded; the connection was abandoned.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ShutdownForced,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Redacted target address, if applicable.
    pub uri: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay before the next reattempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, close details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            uri: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a redacted target address.
    #[inline]
    pub fn with_uri(mut self, uri: impl Into<Arc<str>>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
