//! # Connector abstraction over the underlying database client.
//!
//! This module defines the [`Connector`] trait (async factory for connected
//! handles) and the [`Session`]/[`ClientSignal`] types through which a
//! connector reports what the client observes after the handshake.
//!
//! The supervisor never names a concrete driver; it only sees this seam. A
//! connector translates whatever native event mechanism the client exposes
//! into [`ClientSignal`]s on an explicit channel, which the supervisor's own
//! pump consumes, so retry-on-drop logic stays testable with a fake client
//! that emits synthetic signals.
//!
//! ## Signal flow
//! ```text
//! Connector::connect() ──► Session { handle, signals }
//!                                        │
//!                  client internals ──► mpsc ──► Supervisor signal pump
//!                  (heartbeats, pool)              (state transitions)
//! ```

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::ClientSettings;
use crate::error::ConnectorError;
use crate::uri::ServerUri;

/// What the underlying client observed after the handshake.
///
/// Signals are advisory inputs to the supervisor; only the supervisor decides
/// on state transitions.
#[derive(Clone, Debug)]
pub enum ClientSignal {
    /// The client reported an error that did not (yet) drop the connection.
    /// Logged only.
    Fault(String),
    /// The connection to the server was lost.
    Disconnected,
    /// The client restored the connection on its own after a loss.
    Reconnected,
}

/// A freshly established connection plus its signal channel.
///
/// The receiver ends when the connector's internal sender is dropped,
/// which also terminates the supervisor's pump for this session.
pub struct Session<H> {
    /// The connected client handle, ready for use.
    pub handle: H,
    /// Client-observed signals for this session, in emission order.
    pub signals: mpsc::Receiver<ClientSignal>,
}

/// # Factory for connected client handles.
///
/// Called on explicit `connect()` and on each automatic reattempt. One call
/// produces one [`Session`]; the supervisor owns the session afterwards.
///
/// ### Implementation requirements
/// - `connect` performs the full handshake: a returned handle must be usable.
/// - Signals must be emitted in the order the client observes them.
/// - `close` releases the handle's resources; failures are reported but the
///   supervisor treats them as non-fatal.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio::sync::mpsc;
/// use connvisor::{ClientSettings, Connector, ConnectorError, Session, ServerUri};
///
/// struct NullConnector;
///
/// #[async_trait]
/// impl Connector for NullConnector {
///     type Handle = ();
///
///     async fn connect(
///         &self,
///         _uri: &ServerUri,
///         _settings: &ClientSettings,
///     ) -> Result<Session<()>, ConnectorError> {
///         let (_tx, signals) = mpsc::channel(1);
///         Ok(Session { handle: (), signals })
///     }
///
///     async fn close(&self, _handle: ()) -> Result<(), ConnectorError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The connected handle type given out to callers.
    ///
    /// `Clone` is required because every deduplicated caller receives the
    /// same handle; drivers hand out cheap pool references.
    type Handle: Clone + Send + Sync + 'static;

    /// Establishes and verifies one physical connection.
    async fn connect(
        &self,
        uri: &ServerUri,
        settings: &ClientSettings,
    ) -> Result<Session<Self::Handle>, ConnectorError>;

    /// Closes a handle previously produced by [`Connector::connect`].
    async fn close(&self, handle: Self::Handle) -> Result<(), ConnectorError>;
}
