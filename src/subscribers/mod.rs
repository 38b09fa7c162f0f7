//! # Event subscribers for the connection supervisor.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out,
//! and a built-in stdout logger for handling lifecycle events broadcast through
//! the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Supervisor ── publish(Event) ──► Bus ──► subscriber listener
//!                                              │
//!                                              ▼
//!                                        SubscriberSet
//!                                    ┌────────┼─────────┐
//!                                    ▼        ▼         ▼
//!                                LogWriter  Metrics   Custom ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use connvisor::{Event, EventKind, Subscribe};
//!
//! struct AlertSubscriber;
//!
//! #[async_trait]
//! impl Subscribe for AlertSubscriber {
//!     async fn on_event(&self, event: &Event) {
//!         if matches!(event.kind, EventKind::RetriesExhausted) {
//!             // page someone
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
