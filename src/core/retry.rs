//! # Cancelable single-shot reattempt timer.
//!
//! [`RetryTimer`] arms one delayed callback and nothing else: it knows nothing
//! about connections. The supervisor owns the timer handle and cancels it when
//! an explicit `connect()`/`disconnect()` supersedes the scheduled reattempt.
//!
//! ## Rules
//! - The callback runs **at most once**, after `delay`.
//! - [`RetryTimer::cancel`] is idempotent; canceling after the fire is a no-op.
//! - Cancellation is observed before the sleep completes; a canceled timer
//!   never invokes the callback.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to one scheduled reattempt.
pub(crate) struct RetryTimer {
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl RetryTimer {
    /// Arms a timer that runs `on_fire` after `delay` unless canceled first.
    pub(crate) fn schedule<F, Fut>(delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => on_fire().await,
            }
        });
        Self {
            cancel,
            _task: task,
        }
    }

    /// Cancels the scheduled callback. Idempotent.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_delay() {
        let fired = Arc::new(AtomicU32::new(0));
        let f = Arc::clone(&fired);
        let _timer = RetryTimer::schedule(Duration::from_millis(100), move || async move {
            f.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let fired = Arc::new(AtomicU32::new(0));
        let f = Arc::clone(&fired);
        let timer = RetryTimer::schedule(Duration::from_millis(100), move || async move {
            f.fetch_add(1, Ordering::SeqCst);
        });

        timer.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let timer = RetryTimer::schedule(Duration::from_millis(50), || async {});
        timer.cancel();
        timer.cancel();
    }
}
