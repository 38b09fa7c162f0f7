//! Runtime core: the connection state machine and its lifecycle plumbing.
//!
//! This module contains the embedded implementation of the connvisor runtime.
//! The public API from this module is [`Supervisor`] (with its builder) and
//! [`ShutdownCoordinator`].
//!
//! Internal modules:
//! - [`supervisor`]: the state machine (dedup, retry-on-drop, teardown);
//! - [`retry`]: cancelable single-shot reattempt timer;
//! - [`shutdown`]: cross-platform signal handling and the grace-bounded coordinator;
//! - [`builder`]: wires bus, subscriber fan-out and connector together.
//!
//! ## System wiring
//! ```text
//! SupervisorBuilder::build()
//!   ├─► Bus (broadcast)  ──► subscriber listener ──► SubscriberSet ──► Subscribe impls
//!   └─► Supervisor ◄─────────── Connector (trait seam to the client driver)
//!           │  ▲
//!           │  └─ signal pump (one per session: Fault / Disconnected / Reconnected)
//!           └─► RetryTimer (armed after unsolicited drops, canceled on supersede)
//!
//! ShutdownCoordinator::run()
//!   └─► wait_for_shutdown_signal() ──► begin_shutdown() ──► disconnect() within grace
//! ```

mod builder;
mod retry;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use shutdown::{ShutdownCoordinator, wait_for_shutdown_signal};
pub use supervisor::{ConnState, Supervisor};
