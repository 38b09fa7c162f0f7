//! Error types used by the connection supervisor and connectors.
//!
//! This module defines three error enums, one per layer:
//!
//! - [`ConnectError`] — errors surfaced by the supervisor to `connect()` callers.
//! - [`ConnectorError`] — errors raised by the underlying client adapter.
//! - [`ShutdownError`] — failures of the graceful-shutdown sequence.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics,
//! and [`ConnectError::is_retryable`] tells callers whether calling `connect()`
//! again can reasonably succeed.

use std::time::Duration;
use thiserror::Error;

use crate::uri::ServerUri;

/// # Errors surfaced to `connect()` callers.
///
/// `Attempt` carries the attempt number and the redacted target so callers and
/// logs see which try failed without ever seeing credentials. The error is
/// `Clone` because every deduplicated concurrent caller receives it.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ConnectError {
    /// No usable connection target (empty, malformed, or missing host).
    #[error("no usable connection target: {reason}")]
    Config {
        /// What made the target unusable.
        reason: String,
    },

    /// A physical connect attempt failed.
    #[error("connect attempt {attempt} to {uri} failed: {reason}")]
    Attempt {
        /// Redacted target address.
        uri: ServerUri,
        /// Attempt number (1-based since the last reset).
        attempt: u32,
        /// Underlying client failure message.
        reason: String,
    },

    /// The supervisor refused the call because shutdown has begun.
    #[error("connection supervisor is shutting down")]
    ShuttingDown,

    /// A `disconnect()` is still tearing the previous connection down.
    #[error("disconnect in progress")]
    Disconnecting,
}

impl ConnectError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use connvisor::ConnectError;
    ///
    /// let err = ConnectError::Config { reason: "empty".into() };
    /// assert_eq!(err.as_label(), "connect_config");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectError::Config { .. } => "connect_config",
            ConnectError::Attempt { .. } => "connect_attempt_failed",
            ConnectError::ShuttingDown => "connect_shutting_down",
            ConnectError::Disconnecting => "connect_disconnecting",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConnectError::Config { reason } => format!("configuration: {reason}"),
            ConnectError::Attempt { uri, attempt, reason } => {
                format!("attempt {attempt} to {uri}: {reason}")
            }
            ConnectError::ShuttingDown => "shutting down".to_string(),
            ConnectError::Disconnecting => "disconnect in progress".to_string(),
        }
    }

    /// Indicates whether calling `connect()` again can reasonably succeed.
    ///
    /// `true` for [`ConnectError::Attempt`] (transient network conditions) and
    /// [`ConnectError::Disconnecting`] (teardown will settle), `false` otherwise.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConnectError::Attempt { .. } | ConnectError::Disconnecting
        )
    }
}

/// # Errors raised by a [`Connector`](crate::Connector) implementation.
///
/// The supervisor wraps these with attempt metadata before surfacing them as
/// [`ConnectError::Attempt`]; `InvalidTarget` maps to [`ConnectError::Config`].
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ConnectorError {
    /// The client rejected the connection string itself.
    #[error("client rejected target: {reason}")]
    InvalidTarget {
        /// Driver-side parse/validation message.
        reason: String,
    },

    /// Establishing or verifying the connection failed.
    #[error("handshake failed: {reason}")]
    Handshake {
        /// Driver-side failure message.
        reason: String,
    },

    /// Closing the handle failed. Always treated as non-fatal.
    #[error("close failed: {reason}")]
    Close {
        /// Driver-side failure message.
        reason: String,
    },
}

impl ConnectorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectorError::InvalidTarget { .. } => "connector_invalid_target",
            ConnectorError::Handshake { .. } => "connector_handshake",
            ConnectorError::Close { .. } => "connector_close",
        }
    }
}

/// # Errors produced by the graceful-shutdown sequence.
///
/// Shutdown failures are logged and never block process exit; this type exists
/// so callers of [`ShutdownCoordinator::shutdown`](crate::ShutdownCoordinator::shutdown)
/// can observe what happened.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ShutdownError {
    /// The disconnect did not finish within the configured grace period.
    #[error("shutdown grace {grace:?} exceeded; abandoning the connection")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },

    /// Registering OS signal listeners failed.
    #[error("signal registration failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl ShutdownError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownError::GraceExceeded { .. } => "shutdown_grace_exceeded",
            ShutdownError::Signal(_) => "shutdown_signal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let err = ConnectError::ShuttingDown;
        assert_eq!(err.as_label(), "connect_shutting_down");
        let err = ShutdownError::GraceExceeded {
            grace: Duration::from_secs(5),
        };
        assert_eq!(err.as_label(), "shutdown_grace_exceeded");
    }

    #[test]
    fn test_attempt_error_redacts_target() {
        let uri = ServerUri::parse("db://root:pw@db.example:9").unwrap();
        let err = ConnectError::Attempt {
            uri,
            attempt: 2,
            reason: "refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("db://db.example:9"));
        assert!(!msg.contains("pw"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_config_is_not_retryable() {
        let err = ConnectError::Config { reason: "empty".into() };
        assert!(!err.is_retryable());
    }
}
