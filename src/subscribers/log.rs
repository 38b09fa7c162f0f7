//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [connected] uri=mongodb://db.internal:27017 attempt=1
//! [connect-failed] uri=mongodb://db.internal:27017 attempt=2 err="connection refused"
//! [disconnected] uri=mongodb://db.internal:27017
//! [retry-scheduled] uri=mongodb://db.internal:27017 attempt=1 delay=2000ms
//! [retries-exhausted] uri=mongodb://db.internal:27017 attempt=5
//! [closed] uri=mongodb://db.internal:27017
//! [shutdown-requested]
//! [shutdown-complete]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event descriptions
/// to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::Connected => {
                println!("[connected] uri={:?} attempt={:?}", e.uri, e.attempt);
            }
            EventKind::ConnectFailed => {
                println!(
                    "[connect-failed] uri={:?} attempt={:?} err={:?}",
                    e.uri, e.attempt, e.reason
                );
            }
            EventKind::ClientFault => {
                println!("[client-fault] uri={:?} err={:?}", e.uri, e.reason);
            }
            EventKind::Disconnected => {
                println!("[disconnected] uri={:?}", e.uri);
            }
            EventKind::Reconnected => {
                println!("[reconnected] uri={:?} attempt={:?}", e.uri, e.attempt);
            }
            EventKind::Closed => {
                println!("[closed] uri={:?}", e.uri);
            }
            EventKind::RetryScheduled => {
                println!(
                    "[retry-scheduled] uri={:?} attempt={:?} delay={:?}ms err={:?}",
                    e.uri, e.attempt, e.delay_ms, e.reason
                );
            }
            EventKind::RetriesExhausted => {
                println!("[retries-exhausted] uri={:?} attempt={:?}", e.uri, e.attempt);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::ShutdownComplete => {
                println!("[shutdown-complete]");
            }
            EventKind::ShutdownForced => {
                println!("[shutdown-forced]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
