//! # Graceful shutdown: OS signals and the coordinator.
//!
//! Provides [`wait_for_shutdown_signal`], an async helper that completes when
//! the process receives a termination signal, and [`ShutdownCoordinator`],
//! which turns that signal into an ordered teardown of the supervised
//! connection.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! ## Shutdown path
//! ```text
//! wait_for_shutdown_signal()
//!           └─► Bus.publish(ShutdownRequested)
//!           └─► Supervisor::begin_shutdown()   (sticky flag; pending retry canceled)
//!           └─► timeout(grace, Supervisor::disconnect()):
//!                  ├─ Ok      → Bus.publish(ShutdownComplete)
//!                  └─ Timeout → Bus.publish(ShutdownForced)
//!                               (ShutdownError::GraceExceeded; exit proceeds anyway)
//! ```
//!
//! Performing the shutdown and terminating the process are split on purpose:
//! [`ShutdownCoordinator::shutdown`] returns a result and is unit-testable;
//! [`ShutdownCoordinator::run_then_exit`] is the thin wrapper that ends the
//! process.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::time::timeout;

use crate::connector::Connector;
use crate::error::ShutdownError;
use crate::events::{Event, EventKind};

use super::supervisor::Supervisor;

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Guard ensuring only one coordinator is installed per process.
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Turns a termination signal into an ordered connection teardown.
///
/// Construct with [`ShutdownCoordinator::install`] once at process start;
/// repeated installs return `None` so re-initialization cannot stack handlers.
pub struct ShutdownCoordinator<C: Connector> {
    supervisor: Arc<Supervisor<C>>,
}

impl<C: Connector> ShutdownCoordinator<C> {
    /// Creates a coordinator without the process-wide registration guard.
    ///
    /// Intended for compositions that manage their own lifecycle (and for
    /// tests); production entry points should prefer [`ShutdownCoordinator::install`].
    pub fn new(supervisor: Arc<Supervisor<C>>) -> Self {
        Self { supervisor }
    }

    /// Registers the process-wide coordinator. Idempotent: the second and
    /// later calls return `None`.
    pub fn install(supervisor: Arc<Supervisor<C>>) -> Option<Self> {
        if INSTALLED.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(Self::new(supervisor))
    }

    /// Waits for a termination signal, then performs the graceful shutdown.
    pub async fn run(self) -> Result<(), ShutdownError> {
        wait_for_shutdown_signal().await?;
        self.shutdown().await
    }

    /// Performs the graceful shutdown, bounded by the configured grace period.
    ///
    /// Sets the supervisor's sticky shutdown flag first, so a retry timer
    /// firing concurrently becomes a no-op, then closes the connection.
    /// Failures never propagate past the grace bound: process exit must not
    /// hang on a stuck close.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        let grace = self.supervisor.config().grace;
        self.supervisor
            .bus()
            .publish(Event::now(EventKind::ShutdownRequested));
        self.supervisor.begin_shutdown();

        match timeout(grace, self.supervisor.disconnect()).await {
            Ok(()) => {
                self.supervisor
                    .bus()
                    .publish(Event::now(EventKind::ShutdownComplete));
                Ok(())
            }
            Err(_) => {
                self.supervisor
                    .bus()
                    .publish(Event::now(EventKind::ShutdownForced));
                Err(ShutdownError::GraceExceeded { grace })
            }
        }
    }

    /// Waits for a signal, shuts down, then terminates the process.
    ///
    /// Exit code 0 when the shutdown completed within grace, 1 otherwise.
    pub async fn run_then_exit(self) -> ! {
        let code = match self.run().await {
            Ok(()) => 0,
            Err(_) => 1,
        };
        std::process::exit(code);
    }
}
