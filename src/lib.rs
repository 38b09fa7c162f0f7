//! # connvisor
//!
//! **Connvisor** is a resilient database-connection lifecycle manager for Rust.
//!
//! It supervises one process-wide connection to an external database:
//! establishing it, deduplicating concurrent callers, retrying after
//! unsolicited drops with exponential backoff and jitter, and tearing it down
//! in order on shutdown. The underlying client is reached only through the
//! [`Connector`] seam; pooling and wire protocol stay the driver's job.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller #1     caller #2     caller #N          OS signals
//!       │             │             │                  │
//!       └───────── connect(uri) ────┘                  ▼
//!                     │                      ┌──────────────────────┐
//!                     ▼                      │ ShutdownCoordinator  │
//! ┌───────────────────────────────────────┐  │  - sticky flag       │
//! │  Supervisor (state machine)           │◄─┤  - disconnect()      │
//! │  - one managed slot: state/handle     │  │    within grace      │
//! │  - in-flight attempt (dedup'd)        │  └──────────────────────┘
//! │  - retry bookkeeping + timer          │
//! └──────┬──────────────────┬─────────────┘
//!        │                  │
//!        ▼                  ▼
//! ┌──────────────┐   ┌──────────────┐
//! │  Connector   │   │     Bus      │──► subscriber listener ──► SubscriberSet
//! │ (client seam)│   │ (broadcast)  │         ┌─────────┼─────────┐
//! └──────┬───────┘   └──────────────┘         ▼         ▼         ▼
//!        │ Session { handle, signals }     worker1   worker2   workerN
//!        ▼                                    ▼         ▼         ▼
//!   signal pump ──► Fault / Disconnected  sub1.on_  sub2.on_  subN.on_
//!                   / Reconnected          event()   event()   event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! connect(uri) ──► Supervisor
//!
//! match state {
//!   Connected (same uri)  ─► return existing handle
//!   Connecting            ─► join the in-flight attempt (dedup)
//!   Idle                  ─► cancel pending retry, close stale handle,
//!                            dial fresh ─► Connected | Idle + error to callers
//! }
//!
//! on unsolicited drop (signal pump):
//!   Connected ─► Idle, arm RetryTimer(backoff.next(attempt))
//!     timer fires ─► state still Idle? ─► same attempt path
//!                 └─ superseded (explicit connect / driver recovery / shutdown)
//!                    ─► abort silently
//!   attempts == max_attempts ─► RetriesExhausted, silence until connect()
//!
//! disconnect():
//!   cancel pending retry ─► await in-flight attempt ─► close handle ─► Idle
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                      |
//! |-------------------|--------------------------------------------------------------------|-----------------------------------------|
//! | **Supervision**   | One managed connection slot: dedup, retry-on-drop, teardown.       | [`Supervisor`], [`ConnState`]           |
//! | **Connector API** | Seam to the underlying client driver.                              | [`Connector`], [`Session`], [`ClientSignal`] |
//! | **Policies**      | Backoff growth and jitter for reattempt delays.                    | [`BackoffPolicy`], [`JitterPolicy`]     |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, alerting).           | [`Subscribe`], [`SubscriberSet`]        |
//! | **Shutdown**      | Signal-driven, grace-bounded teardown.                             | [`ShutdownCoordinator`]                 |
//! | **Errors**        | Typed errors per layer.                                            | [`ConnectError`], [`ConnectorError`], [`ShutdownError`] |
//! | **Configuration** | Client settings (merged overrides), retry policy, runtime knobs.   | [`Config`], [`ClientSettings`], [`RetryPolicy`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//! - `mongodb`: exports [`MongoConnector`] over the official MongoDB driver.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use connvisor::{Config, ShutdownCoordinator, Supervisor};
//! # use connvisor::{ClientSettings, Connector, ConnectorError, Session, ServerUri};
//! # use async_trait::async_trait;
//! # struct MyConnector;
//! # #[async_trait]
//! # impl Connector for MyConnector {
//! #     type Handle = ();
//! #     async fn connect(&self, _u: &ServerUri, _s: &ClientSettings)
//! #         -> Result<Session<()>, ConnectorError> { unimplemented!() }
//! #     async fn close(&self, _h: ()) -> Result<(), ConnectorError> { Ok(()) }
//! # }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.retry.max_attempts = 10;
//!
//!     let sup = Supervisor::builder(cfg, MyConnector).build();
//!
//!     let handle = sup.connect("mongodb://localhost:27017/app").await?;
//!     // ... hand `handle` to the data layer ...
//!     # let _ = handle;
//!
//!     // Registered once per process; tears the connection down on SIGINT/SIGTERM.
//!     if let Some(coordinator) = ShutdownCoordinator::install(Arc::clone(&sup)) {
//!         coordinator.run().await?;
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod connector;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod uri;

// ---- Public re-exports ----

pub use config::{ClientOverrides, ClientSettings, Config, RetryPolicy};
pub use connector::{ClientSignal, Connector, Session};
pub use core::{ConnState, ShutdownCoordinator, Supervisor, SupervisorBuilder, wait_for_shutdown_signal};
pub use error::{ConnectError, ConnectorError, ShutdownError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use subscribers::{Subscribe, SubscriberSet};
pub use uri::ServerUri;

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

// Optional: expose the MongoDB-backed connector.
// Enable with: `--features mongodb`
#[cfg(feature = "mongodb")]
mod mongo;
#[cfg(feature = "mongodb")]
pub use mongo::MongoConnector;
