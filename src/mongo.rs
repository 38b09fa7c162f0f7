//! # MongoDB-backed connector.
//!
//! [`MongoConnector`] adapts the official `mongodb` driver to the
//! [`Connector`] seam. Enabled via the `mongodb` feature.
//!
//! What it does per [`Connector::connect`] call:
//! 1. Parses the raw connection string with the driver.
//! 2. Applies the supervisor's [`ClientSettings`] (pool sizes, timeouts);
//!    explicit settings win over whatever the URI query string carried.
//! 3. Verifies the deployment with a `ping` before handing the handle out,
//!    so a returned client is known-usable.
//! 4. Installs an SDAM event handler translating server heartbeats into
//!    [`ClientSignal`]s:
//!    - first failed heartbeat → `Fault` + `Disconnected`
//!    - first succeeding heartbeat after a failure → `Reconnected`
//!
//! The driver manages its own pool and reconnects internally; the signals let
//! the supervisor track liveness and arm its own reattempt schedule for the
//! case where the driver never recovers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mongodb::Client;
use mongodb::bson::doc;
use mongodb::event::EventHandler;
use mongodb::event::sdam::SdamEvent;
use mongodb::options::ClientOptions;
use tokio::sync::mpsc;

use crate::config::ClientSettings;
use crate::connector::{ClientSignal, Connector, Session};
use crate::error::ConnectorError;
use crate::uri::ServerUri;

/// Capacity of the per-session signal channel. Heartbeat transitions are
/// rare; overflow would only drop duplicate liveness flaps.
const SIGNAL_BUFFER: usize = 32;

/// Connector over [`mongodb::Client`].
#[derive(Default)]
pub struct MongoConnector;

#[async_trait]
impl Connector for MongoConnector {
    type Handle = Client;

    async fn connect(
        &self,
        uri: &ServerUri,
        settings: &ClientSettings,
    ) -> Result<Session<Client>, ConnectorError> {
        let mut options = ClientOptions::parse(uri.as_str()).await.map_err(|e| {
            ConnectorError::InvalidTarget {
                reason: e.to_string(),
            }
        })?;
        options.max_pool_size = Some(settings.max_pool_size);
        options.min_pool_size = Some(settings.min_pool_size);
        options.connect_timeout = Some(settings.connect_timeout);
        options.server_selection_timeout = Some(settings.server_selection_timeout);

        let (tx, signals) = mpsc::channel(SIGNAL_BUFFER);
        options.sdam_event_handler = Some(heartbeat_adapter(tx));

        let client =
            Client::with_options(options).map_err(|e| ConnectorError::InvalidTarget {
                reason: e.to_string(),
            })?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ConnectorError::Handshake {
                reason: e.to_string(),
            })?;

        Ok(Session {
            handle: client,
            signals,
        })
    }

    async fn close(&self, handle: Client) -> Result<(), ConnectorError> {
        handle.shutdown().await;
        Ok(())
    }
}

/// Builds the SDAM handler that folds heartbeat events into liveness edges.
///
/// Only transitions are forwarded: repeated failures while already down (or
/// successes while already up) stay silent.
fn heartbeat_adapter(tx: mpsc::Sender<ClientSignal>) -> EventHandler<SdamEvent> {
    let down = Arc::new(AtomicBool::new(false));
    EventHandler::callback(move |ev: SdamEvent| match ev {
        SdamEvent::ServerHeartbeatFailed(_) => {
            if !down.swap(true, Ordering::SeqCst) {
                let _ = tx.try_send(ClientSignal::Fault("server heartbeat failed".to_string()));
                let _ = tx.try_send(ClientSignal::Disconnected);
            }
        }
        SdamEvent::ServerHeartbeatSucceeded(_) => {
            if down.swap(false, Ordering::SeqCst) {
                let _ = tx.try_send(ClientSignal::Reconnected);
            }
        }
        _ => {}
    })
}
