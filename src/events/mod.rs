//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the connection supervisor
//! and the shutdown coordinator.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (connect/disconnect/retry paths, signal pump),
//!   `ShutdownCoordinator`.
//! - **Consumers**: the subscriber listener spawned at build time (fans out to
//!   `SubscriberSet`), plus any receiver created with `Bus::subscribe`.
//!
//! See `core/mod.rs` for the system-level wiring diagram.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
