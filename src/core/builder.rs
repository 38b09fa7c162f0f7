//! Builder wiring the supervisor, its bus and the subscriber fan-out.

use std::sync::Arc;

use crate::config::Config;
use crate::connector::Connector;
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::supervisor::Supervisor;

/// Builder for constructing a [`Supervisor`] with optional subscribers.
///
/// ## Example
/// ```no_run
/// use std::sync::Arc;
/// use connvisor::{Config, Subscribe, Supervisor};
/// # use connvisor::{ClientSettings, Connector, ConnectorError, Session, ServerUri};
/// # use async_trait::async_trait;
/// # struct MyConnector;
/// # #[async_trait]
/// # impl Connector for MyConnector {
/// #     type Handle = ();
/// #     async fn connect(&self, _u: &ServerUri, _s: &ClientSettings)
/// #         -> Result<Session<()>, ConnectorError> { unimplemented!() }
/// #     async fn close(&self, _h: ()) -> Result<(), ConnectorError> { Ok(()) }
/// # }
///
/// # fn subscribers() -> Vec<Arc<dyn Subscribe>> { Vec::new() }
/// let sup = Supervisor::builder(Config::default(), MyConnector)
///     .with_subscribers(subscribers())
///     .build();
/// ```
pub struct SupervisorBuilder<C: Connector> {
    cfg: Config,
    connector: C,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<C: Connector> SupervisorBuilder<C> {
    /// Creates a new builder with the given configuration and connector.
    pub fn new(cfg: Config, connector: C) -> Self {
        Self {
            cfg,
            connector,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events (connects, drops, retries, shutdown)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds and returns the supervisor instance.
    ///
    /// Must be called within a tokio runtime: the subscriber listener worker
    /// is spawned here.
    pub fn build(self) -> Arc<Supervisor<C>> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let sup = Supervisor::new_internal(self.cfg, self.connector, bus.clone());

        if !self.subscribers.is_empty() {
            Self::spawn_subscriber_listener(&bus, SubscriberSet::new(self.subscribers));
        }
        sup
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    ///
    /// Lagging only skips the missed events; the listener keeps running.
    fn spawn_subscriber_listener(bus: &Bus, set: SubscriberSet) {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        });
    }
}
