//! # Supervisor: the connection lifecycle state machine.
//!
//! The [`Supervisor`] owns the one managed connection slot for its target:
//! its state, the live handle, the in-flight attempt, and retry bookkeeping.
//! Nothing else mutates that record; all other components read through
//! accessor methods.
//!
//! ## Key responsibilities
//! - serialize connection attempts and **deduplicate** concurrent callers
//! - consume client signals and schedule reattempts after unsolicited drops
//! - tear the previous handle down when the target changes
//! - publish every transition on the [`Bus`] for subscribers
//!
//! ## High-level architecture
//! ```text
//! connect(uri) ───► state check ──┬─ Connected, same uri ──► clone handle
//!                                 ├─ Connecting ───────────► join in-flight attempt
//!                                 └─ Idle ───┬─ cancel pending timer
//!                                            ├─ close stale handle (best-effort)
//!                                            └─ spawn attempt task ──► Connector::connect
//!                                                       │
//!                    all callers ◄── broadcast outcome ─┘
//!
//! Session signals (explicit channel, one pump per session):
//!   Connector ──► mpsc ──► signal pump ──┬─ Fault ────────► log event only
//!                                        ├─ Disconnected ─► Idle + schedule retry
//!                                        └─ Reconnected ──► restore handle, reset retry
//!
//! Retry path:
//!   RetryTimer fires ──► state still Idle? ──► same attempt path as connect()
//!                   └─ otherwise: abort silently (explicit call or driver won)
//! ```
//!
//! ## State machine
//!
//! | State         | attempt ok    | attempt fails | unsolicited drop      | disconnect()     |
//! |---------------|---------------|---------------|-----------------------|------------------|
//! | Idle          | → Connecting  | stays Idle    | n/a                   | no-op            |
//! | Connecting    | → Connected   | → Idle        | n/a                   | await then close |
//! | Connected     | n/a           | n/a           | → Idle + retry timer  | → Disconnecting  |
//! | Disconnecting | n/a           | n/a           | ignored               | no-op            |
//!
//! ## Rules
//! - At most one physical attempt is in flight per supervisor at any instant.
//! - A pending retry timer exists only while `Idle` (awaiting reattempt).
//! - Once the reattempt ceiling is reached, the supervisor stays quiet until
//!   an explicit `connect()` resets the counter.
//! - After shutdown begins, no new connects or retries are accepted.
//! - Explicit `connect()` failures surface to the caller and are never
//!   auto-retried; only unsolicited drops schedule reattempts.
//!
//! ## Example
//! ```no_run
//! use connvisor::{Config, Supervisor};
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
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let sup = Supervisor::builder(Config::default(), MyConnector).build();
//!
//! let handle = sup.connect("mongodb://localhost:27017/app").await?;
//! // ... hand `handle` to the data layer ...
//! sup.disconnect().await;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::{ClientOverrides, ClientSettings, Config};
use crate::connector::{ClientSignal, Connector, Session};
use crate::core::builder::SupervisorBuilder;
use crate::core::retry::RetryTimer;
use crate::error::{ConnectError, ConnectorError};
use crate::events::{Bus, Event, EventKind};
use crate::uri::ServerUri;

/// Connection lifecycle states, as observed through [`Supervisor::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// No live connection and no attempt in flight (a retry may be pending).
    Idle,
    /// A physical attempt is in flight; callers join it instead of dialing.
    Connecting,
    /// A verified handle is live and handed out to callers.
    Connected,
    /// An explicit teardown is closing the handle.
    Disconnecting,
}

/// What every deduplicated caller of one attempt receives.
type AttemptOutcome<H> = Result<H, ConnectError>;

/// Retry bookkeeping for the managed slot.
struct RetryState {
    /// Reattempts made since the last successful connection.
    attempts: u32,
    /// The armed timer, present only while `Idle` awaiting a reattempt.
    pending: Option<RetryTimer>,
    /// Bumped on every schedule/cancel; a fired timer with a stale seq aborts.
    timer_seq: u64,
}

/// The one managed connection record. Owned exclusively by the supervisor;
/// guarded by a sync mutex with short, await-free critical sections.
struct Managed<H> {
    uri: Option<ServerUri>,
    state: ConnState,
    /// Live handle; `Some` iff `state == Connected`.
    handle: Option<H>,
    /// Handle stashed after an unsolicited drop. Restored if the client
    /// recovers on its own, closed when a fresh attempt dials out.
    dormant: Option<H>,
    /// Id of the session owning `handle`/`dormant`; signals from other
    /// sessions are stale and ignored.
    session: u64,
    /// Completion channel for the in-flight attempt; `Some` iff `Connecting`.
    inflight: Option<broadcast::Sender<AttemptOutcome<H>>>,
    /// Client settings captured at the last explicit `connect()`; reattempts
    /// reuse them.
    settings: ClientSettings,
    retry: RetryState,
}

/// Supervises one logical connection slot: dedup, retry-on-drop, teardown.
///
/// Built via [`Supervisor::builder`]; lives behind an `Arc` owned by the
/// application's composition root and shared by reference with consumers.
pub struct Supervisor<C: Connector> {
    cfg: Config,
    bus: Bus,
    connector: C,
    managed: Mutex<Managed<C::Handle>>,
    /// Sticky shutdown flag: once canceled, no new connects or retries.
    shutdown: CancellationToken,
    me: Weak<Self>,
}

impl<C: Connector> Supervisor<C> {
    /// Returns a builder for wiring config, connector and subscribers.
    pub fn builder(cfg: Config, connector: C) -> SupervisorBuilder<C> {
        SupervisorBuilder::new(cfg, connector)
    }

    pub(crate) fn new_internal(cfg: Config, connector: C, bus: Bus) -> Arc<Self> {
        let settings = cfg.client;
        Arc::new_cyclic(|me| Self {
            cfg,
            bus,
            connector,
            managed: Mutex::new(Managed {
                uri: None,
                state: ConnState::Idle,
                handle: None,
                dormant: None,
                session: 0,
                inflight: None,
                settings,
                retry: RetryState {
                    attempts: 0,
                    pending: None,
                    timer_seq: 0,
                },
            }),
            shutdown: CancellationToken::new(),
            me: me.clone(),
        })
    }

    // ---------------------------
    // Public API
    // ---------------------------

    /// Connects to `uri` using the configured client settings.
    ///
    /// See [`Supervisor::connect_with`] for the full semantics.
    pub async fn connect(&self, uri: &str) -> Result<C::Handle, ConnectError> {
        self.connect_with(uri, ClientOverrides::default()).await
    }

    /// Connects to the target configured in [`Config::uri`].
    ///
    /// Returns [`ConnectError::Config`] when no default target is configured.
    pub async fn connect_default(&self) -> Result<C::Handle, ConnectError> {
        let uri = self.cfg.uri.clone().ok_or_else(|| ConnectError::Config {
            reason: "no connection target configured".to_string(),
        })?;
        self.connect_with(&uri, ClientOverrides::default()).await
    }

    /// Connects to `uri`, merging `overrides` over the configured client
    /// settings (overrides win).
    ///
    /// ### Semantics
    /// - `Connected` to the same `uri`: returns the existing handle, no new work.
    /// - `Connecting`: joins the in-flight attempt; all concurrent callers
    ///   observe the same outcome.
    /// - `Idle` (including after retry exhaustion): cancels any pending retry,
    ///   resets the reattempt counter, closes a stale handle for a previous
    ///   target (best-effort), and dials a fresh attempt.
    /// - A failed explicit attempt is returned to the caller and **not**
    ///   retried automatically.
    pub async fn connect_with(
        &self,
        uri: &str,
        overrides: ClientOverrides,
    ) -> Result<C::Handle, ConnectError> {
        enum Plan<H> {
            Ready(H),
            Join(broadcast::Receiver<AttemptOutcome<H>>),
            Dial {
                stale: Option<(H, ServerUri)>,
                rx: broadcast::Receiver<AttemptOutcome<H>>,
            },
            Refuse(ConnectError),
        }

        let target = ServerUri::parse(uri)?;
        let settings = self.cfg.client.merged(&overrides);

        let plan = {
            let mut m = self.managed.lock();
            if self.shutdown.is_cancelled() {
                Plan::Refuse(ConnectError::ShuttingDown)
            } else {
                match m.state {
                    ConnState::Disconnecting => Plan::Refuse(ConnectError::Disconnecting),
                    ConnState::Connecting => match &m.inflight {
                        Some(tx) => Plan::Join(tx.subscribe()),
                        // Connecting implies an inflight sender; bail out if not.
                        None => Plan::Refuse(ConnectError::Disconnecting),
                    },
                    ConnState::Connected if m.uri.as_ref() == Some(&target) => {
                        match m.handle.clone() {
                            Some(h) => Plan::Ready(h),
                            None => Plan::Refuse(ConnectError::Disconnecting),
                        }
                    }
                    ConnState::Connected | ConnState::Idle => {
                        let (stale, rx) =
                            self.begin_attempt_locked(&mut m, target.clone(), settings);
                        Plan::Dial { stale, rx }
                    }
                }
            }
        };

        match plan {
            Plan::Ready(h) => Ok(h),
            Plan::Refuse(e) => Err(e),
            Plan::Join(rx) => self.join_attempt(rx).await,
            Plan::Dial { stale, rx } => {
                let Some(sup) = self.me.upgrade() else {
                    return Err(ConnectError::ShuttingDown);
                };
                // The attempt runs detached so a caller dropping its future
                // cannot strand other deduplicated callers mid-attempt.
                tokio::spawn(async move {
                    if let Some((h, old_uri)) = stale {
                        sup.teardown(h, &old_uri).await;
                    }
                    let _ = sup.run_attempt(&target, 1, false).await;
                });
                self.join_attempt(rx).await
            }
        }
    }

    /// Closes the managed connection, if any. Idempotent.
    ///
    /// Cancels a pending retry timer synchronously, awaits an in-flight
    /// attempt before closing its product, closes the handle (best-effort,
    /// close failures are logged and swallowed), and resets retry bookkeeping.
    pub async fn disconnect(&self) {
        enum Step<H> {
            Done,
            Join(broadcast::Receiver<AttemptOutcome<H>>),
            Close((H, ServerUri)),
        }

        loop {
            let step = {
                let mut m = self.managed.lock();
                match m.state {
                    ConnState::Disconnecting => Step::Done,
                    ConnState::Connecting => match &m.inflight {
                        Some(tx) => Step::Join(tx.subscribe()),
                        None => Step::Done,
                    },
                    ConnState::Connected | ConnState::Idle => {
                        if let Some(t) = m.retry.pending.take() {
                            t.cancel();
                        }
                        m.retry.timer_seq += 1;
                        m.retry.attempts = 0;
                        let stale = m.handle.take().or_else(|| m.dormant.take());
                        match (stale, m.uri.clone()) {
                            (Some(h), Some(uri)) => {
                                m.session += 1;
                                m.state = ConnState::Disconnecting;
                                Step::Close((h, uri))
                            }
                            _ => Step::Done,
                        }
                    }
                }
            };

            match step {
                Step::Done => return,
                Step::Join(mut rx) => {
                    let _ = rx.recv().await;
                }
                Step::Close((h, uri)) => {
                    self.teardown(h, &uri).await;
                    self.managed.lock().state = ConnState::Idle;
                    return;
                }
            }
        }
    }

    /// Returns the current handle, or `None` unless connected. Non-blocking.
    pub fn handle(&self) -> Option<C::Handle> {
        self.managed.lock().handle.clone()
    }

    /// Returns the current lifecycle state. Non-blocking.
    pub fn state(&self) -> ConnState {
        self.managed.lock().state
    }

    /// Creates a receiver for lifecycle events published by this supervisor.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// The event bus this supervisor publishes on.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The configuration this supervisor was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    // ---------------------------
    // Shutdown hooks
    // ---------------------------

    /// Sets the sticky shutdown flag and cancels any pending retry.
    ///
    /// After this, `connect()` returns [`ConnectError::ShuttingDown`] and no
    /// new reattempt is ever scheduled, even if a timer fires concurrently.
    pub(crate) fn begin_shutdown(&self) {
        self.shutdown.cancel();
        let mut m = self.managed.lock();
        if let Some(t) = m.retry.pending.take() {
            t.cancel();
        }
        m.retry.timer_seq += 1;
    }

    /// True once shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    // ---------------------------
    // Attempt machinery
    // ---------------------------

    /// Transitions `Idle`/`Connected` into `Connecting` and prepares the
    /// dedup channel. Returns the stale handle to close (when the target
    /// changed) and the receiver for this attempt's outcome.
    #[allow(clippy::type_complexity)]
    fn begin_attempt_locked(
        &self,
        m: &mut Managed<C::Handle>,
        target: ServerUri,
        settings: ClientSettings,
    ) -> (
        Option<(C::Handle, ServerUri)>,
        broadcast::Receiver<AttemptOutcome<C::Handle>>,
    ) {
        if let Some(t) = m.retry.pending.take() {
            t.cancel();
        }
        m.retry.timer_seq += 1;
        m.retry.attempts = 0;

        let stale_uri = m.uri.clone();
        let stale = m.handle.take().or_else(|| m.dormant.take());

        m.session += 1;
        m.state = ConnState::Connecting;
        m.uri = Some(target);
        m.settings = settings;

        let (tx, rx) = broadcast::channel(1);
        m.inflight = Some(tx);

        (stale.zip(stale_uri), rx)
    }

    /// Awaits the outcome of the in-flight attempt.
    async fn join_attempt(
        &self,
        mut rx: broadcast::Receiver<AttemptOutcome<C::Handle>>,
    ) -> Result<C::Handle, ConnectError> {
        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(ConnectError::ShuttingDown),
        }
    }

    /// Runs one physical attempt and finalizes the state machine.
    ///
    /// Shared by explicit `connect()` (spawned, `via_retry = false`) and the
    /// reattempt path (`via_retry = true`, which also schedules the next
    /// timer on failure).
    async fn run_attempt(
        &self,
        target: &ServerUri,
        attempt: u32,
        via_retry: bool,
    ) -> Result<C::Handle, ConnectError> {
        let settings = { self.managed.lock().settings };
        let res = self.connector.connect(target, &settings).await;

        let (outcome, waiters) = {
            let mut m = self.managed.lock();
            let waiters = m.inflight.take();
            match res {
                Ok(Session { handle, signals }) => {
                    m.state = ConnState::Connected;
                    m.handle = Some(handle.clone());
                    m.dormant = None;
                    m.session += 1;
                    m.retry.attempts = 0;
                    if let Some(t) = m.retry.pending.take() {
                        t.cancel();
                        m.retry.timer_seq += 1;
                    }
                    self.spawn_signal_pump(m.session, signals);

                    let kind = if via_retry {
                        EventKind::Reconnected
                    } else {
                        EventKind::Connected
                    };
                    self.bus.publish(
                        Event::now(kind)
                            .with_uri(target.redacted())
                            .with_attempt(attempt),
                    );
                    (Ok(handle), waiters)
                }
                Err(err) => {
                    m.state = ConnState::Idle;
                    let reason = err.to_string();
                    let wrapped = match err {
                        ConnectorError::InvalidTarget { reason } => ConnectError::Config { reason },
                        other => ConnectError::Attempt {
                            uri: target.clone(),
                            attempt,
                            reason: other.to_string(),
                        },
                    };
                    self.bus.publish(
                        Event::now(EventKind::ConnectFailed)
                            .with_uri(target.redacted())
                            .with_attempt(attempt)
                            .with_reason(reason.clone()),
                    );
                    if via_retry {
                        // Automatic reattempt failures loop through the
                        // scheduler; nobody is awaiting them.
                        self.schedule_retry_locked(&mut m, Some(reason));
                    }
                    (Err(wrapped), waiters)
                }
            }
        };

        if let Some(tx) = waiters {
            let _ = tx.send(outcome.clone());
        }
        outcome
    }

    /// Best-effort close of a handle that is no longer wanted.
    async fn teardown(&self, handle: C::Handle, uri: &ServerUri) {
        if let Err(e) = self.connector.close(handle).await {
            self.bus.publish(
                Event::now(EventKind::ClientFault)
                    .with_uri(uri.redacted())
                    .with_reason(e.to_string()),
            );
        }
        self.bus
            .publish(Event::now(EventKind::Closed).with_uri(uri.redacted()));
    }

    // ---------------------------
    // Signal pump + retry path
    // ---------------------------

    /// Spawns the consumer for one session's client signals.
    ///
    /// The pump dies with the session: when the connector drops its sender,
    /// or when shutdown begins. Signals carrying a stale session id are
    /// ignored by the handlers.
    fn spawn_signal_pump(&self, session: u64, mut signals: tokio::sync::mpsc::Receiver<ClientSignal>) {
        let Some(sup) = self.me.upgrade() else {
            return;
        };
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    sig = signals.recv() => match sig {
                        Some(sig) => sup.on_client_signal(session, sig),
                        None => break,
                    },
                }
            }
        });
    }

    /// Applies one client signal to the state machine.
    fn on_client_signal(&self, session: u64, signal: ClientSignal) {
        match signal {
            ClientSignal::Fault(reason) => {
                let uri = self.managed.lock().uri.clone();
                let mut ev = Event::now(EventKind::ClientFault).with_reason(reason);
                if let Some(u) = uri {
                    ev = ev.with_uri(u.redacted());
                }
                self.bus.publish(ev);
            }
            ClientSignal::Disconnected => {
                let mut m = self.managed.lock();
                if m.session != session || m.state != ConnState::Connected {
                    return;
                }
                m.dormant = m.handle.take();
                m.state = ConnState::Idle;
                if let Some(u) = &m.uri {
                    self.bus
                        .publish(Event::now(EventKind::Disconnected).with_uri(u.redacted()));
                }
                self.schedule_retry_locked(&mut m, None);
            }
            ClientSignal::Reconnected => {
                let mut m = self.managed.lock();
                if m.session != session || m.state != ConnState::Idle {
                    return;
                }
                let Some(h) = m.dormant.take() else {
                    return;
                };
                if let Some(t) = m.retry.pending.take() {
                    t.cancel();
                }
                m.retry.timer_seq += 1;
                m.retry.attempts = 0;
                m.handle = Some(h);
                m.state = ConnState::Connected;
                if let Some(u) = &m.uri {
                    self.bus
                        .publish(Event::now(EventKind::Reconnected).with_uri(u.redacted()));
                }
            }
        }
    }

    /// Arms the next reattempt timer, or logs the terminal condition once the
    /// ceiling is reached. Caller holds the lock.
    fn schedule_retry_locked(&self, m: &mut Managed<C::Handle>, last_error: Option<String>) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let policy = self.cfg.retry;
        if m.retry.attempts >= policy.max_attempts {
            if let Some(u) = &m.uri {
                self.bus.publish(
                    Event::now(EventKind::RetriesExhausted)
                        .with_uri(u.redacted())
                        .with_attempt(m.retry.attempts),
                );
            }
            return;
        }

        m.retry.attempts += 1;
        let attempt = m.retry.attempts;
        let delay = policy.backoff.next(attempt - 1);
        m.retry.timer_seq += 1;
        let seq = m.retry.timer_seq;

        if let Some(u) = &m.uri {
            let mut ev = Event::now(EventKind::RetryScheduled)
                .with_uri(u.redacted())
                .with_attempt(attempt)
                .with_delay(delay);
            if let Some(reason) = last_error {
                ev = ev.with_reason(reason);
            }
            self.bus.publish(ev);
        }

        let Some(sup) = self.me.upgrade() else {
            return;
        };
        m.retry.pending = Some(RetryTimer::schedule(delay, move || async move {
            sup.on_retry_fire(seq).await;
        }));
    }

    /// Entry point of a fired reattempt timer.
    ///
    /// Re-checks state first: an explicit `connect()`, a driver-side recovery
    /// or shutdown may have superseded this timer, in which case it aborts
    /// silently.
    async fn on_retry_fire(&self, seq: u64) {
        let (target, attempt, stale) = {
            let mut m = self.managed.lock();
            if self.shutdown.is_cancelled() || m.retry.timer_seq != seq {
                return;
            }
            m.retry.pending = None;
            if m.state != ConnState::Idle {
                return;
            }
            let Some(target) = m.uri.clone() else {
                return;
            };
            m.state = ConnState::Connecting;
            let (tx, _rx) = broadcast::channel(1);
            m.inflight = Some(tx);
            (target, m.retry.attempts, m.dormant.take())
        };

        if let Some(h) = stale {
            // The dropped handle is dead weight once we dial fresh.
            let _ = self.connector.close(h).await;
        }
        let _ = self.run_attempt(&target, attempt, true).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::fake::FakeConnector;
    use crate::policies::{BackoffPolicy, JitterPolicy};
    use std::time::Duration;

    const URI: &str = "db://tester:sekret@primary.db:27017/app";

    fn cfg(max_attempts: u32, first_ms: u64) -> Config {
        let mut cfg = Config::default();
        cfg.retry.max_attempts = max_attempts;
        cfg.retry.backoff = BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_secs(300),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        cfg
    }

    fn build(fake: &FakeConnector, cfg: Config) -> Arc<Supervisor<FakeConnector>> {
        Supervisor::builder(cfg, fake.clone()).build()
    }

    /// Lets spawned pumps and attempt tasks run (paused clock auto-advances).
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn kinds(events: &[Event]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_returns_handle_and_publishes() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));
        let mut rx = sup.subscribe();

        let handle = sup.connect(URI).await.unwrap();
        assert_eq!(handle, 1);
        assert_eq!(sup.state(), ConnState::Connected);
        assert_eq!(sup.handle(), Some(1));
        assert_eq!(fake.attempts(), 1);

        let events = drain(&mut rx);
        assert_eq!(kinds(&events), vec![EventKind::Connected]);
        assert_eq!(events[0].uri.as_deref(), Some("db://primary.db:27017"));
        assert_eq!(events[0].attempt, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_connects_share_one_attempt() {
        let fake = FakeConnector::default().with_connect_delay(50);
        let sup = build(&fake, cfg(5, 1000));

        let (a, b) = tokio::join!(sup.connect(URI), sup.connect(URI));
        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 1);
        assert_eq!(fake.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_connects_share_one_failure() {
        let fake = FakeConnector::default().with_connect_delay(50);
        fake.fail_next(u32::MAX);
        let sup = build(&fake, cfg(5, 1000));

        let (a, b) = tokio::join!(sup.connect(URI), sup.connect(URI));
        assert!(matches!(a, Err(ConnectError::Attempt { attempt: 1, .. })));
        assert!(matches!(b, Err(ConnectError::Attempt { attempt: 1, .. })));
        assert_eq!(fake.attempts(), 1);
        assert_eq!(sup.state(), ConnState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connected_same_uri_returns_existing_handle() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));

        let first = sup.connect(URI).await.unwrap();
        let second = sup.connect(URI).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fake.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_new_uri_closes_previous_handle() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));

        let first = sup.connect("db://one.db/a").await.unwrap();
        let second = sup.connect("db://two.db/b").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(fake.attempts(), 2);
        assert_eq!(fake.closes(), 1);
        assert_eq!(sup.state(), ConnState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_failure_is_surfaced_and_not_retried() {
        let fake = FakeConnector::default();
        fake.fail_next(u32::MAX);
        let sup = build(&fake, cfg(5, 1000));

        let err = sup.connect(URI).await.unwrap_err();
        assert!(matches!(err, ConnectError::Attempt { attempt: 1, .. }));
        assert!(err.to_string().contains("db://primary.db:27017"));
        assert!(!err.to_string().contains("sekret"));
        assert_eq!(sup.state(), ConnState::Idle);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fake.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_uri_is_config_error() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));

        let err = sup.connect("not a uri").await.unwrap_err();
        assert!(matches!(err, ConnectError::Config { .. }));
        assert_eq!(fake.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsolicited_drop_schedules_retry_and_reconnects() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));
        let mut rx = sup.subscribe();

        sup.connect(URI).await.unwrap();
        fake.emit(ClientSignal::Disconnected).await;
        settle().await;
        assert_eq!(sup.state(), ConnState::Idle);
        assert_eq!(sup.handle(), None);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(fake.attempts(), 2);
        assert_eq!(sup.state(), ConnState::Connected);
        assert_eq!(sup.handle(), Some(2));
        // Reattempt counter resets on success.
        assert_eq!(sup.managed.lock().retry.attempts, 0);

        let events = kinds(&drain(&mut rx));
        assert_eq!(
            events,
            vec![
                EventKind::Connected,
                EventKind::Disconnected,
                EventKind::RetryScheduled,
                EventKind::Reconnected,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_delays_follow_backoff_floors_then_go_silent() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(3, 1000));
        let mut rx = sup.subscribe();

        sup.connect(URI).await.unwrap();
        fake.fail_next(u32::MAX);
        fake.emit(ClientSignal::Disconnected).await;
        settle().await;

        // Walk through all three reattempts plus slack, then verify silence.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fake.attempts(), 1 + 3);
        assert_eq!(sup.state(), ConnState::Idle);
        assert!(sup.managed.lock().retry.pending.is_none());

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(fake.attempts(), 1 + 3);

        let events = drain(&mut rx);
        let delays: Vec<u32> = events
            .iter()
            .filter(|e| e.kind == EventKind::RetryScheduled)
            .map(|e| e.delay_ms.unwrap())
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000]);
        assert_eq!(
            events.last().map(|e| e.kind),
            Some(EventKind::RetriesExhausted)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_retry() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));

        sup.connect(URI).await.unwrap();
        fake.emit(ClientSignal::Disconnected).await;
        settle().await;

        sup.disconnect().await;
        assert_eq!(sup.state(), ConnState::Idle);
        assert_eq!(fake.closes(), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fake.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_connect_supersedes_pending_retry() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 60_000));

        sup.connect(URI).await.unwrap();
        fake.emit(ClientSignal::Disconnected).await;
        settle().await;
        assert!(sup.managed.lock().retry.pending.is_some());

        // Fresh attempt starts immediately, without waiting out the timer.
        let handle = sup.connect(URI).await.unwrap();
        assert_eq!(handle, 2);
        assert_eq!(fake.attempts(), 2);
        assert_eq!(fake.closes(), 1);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(fake.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_connect_resumes_after_exhaustion() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(1, 100));

        sup.connect(URI).await.unwrap();
        fake.fail_next(u32::MAX);
        fake.emit(ClientSignal::Disconnected).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fake.attempts(), 2);
        assert_eq!(sup.state(), ConnState::Idle);

        fake.clear_failures();
        let handle = sup.connect(URI).await.unwrap();
        assert_eq!(handle, 3);
        assert_eq!(sup.state(), ConnState::Connected);
        assert_eq!(sup.managed.lock().retry.attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_recovery_aborts_pending_retry() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 60_000));
        let mut rx = sup.subscribe();

        sup.connect(URI).await.unwrap();
        fake.emit(ClientSignal::Disconnected).await;
        settle().await;
        fake.emit(ClientSignal::Reconnected).await;
        settle().await;

        assert_eq!(sup.state(), ConnState::Connected);
        assert_eq!(sup.handle(), Some(1));
        assert_eq!(sup.managed.lock().retry.attempts, 0);
        assert!(sup.managed.lock().retry.pending.is_none());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(fake.attempts(), 1);

        let events = kinds(&drain(&mut rx));
        assert_eq!(
            events,
            vec![
                EventKind::Connected,
                EventKind::Disconnected,
                EventKind::RetryScheduled,
                EventKind::Reconnected,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fault_signal_is_logged_without_transition() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));
        let mut rx = sup.subscribe();

        sup.connect(URI).await.unwrap();
        fake.emit(ClientSignal::Fault("pool cleared".to_string())).await;
        settle().await;

        assert_eq!(sup.state(), ConnState::Connected);
        let events = drain(&mut rx);
        assert_eq!(
            kinds(&events),
            vec![EventKind::Connected, EventKind::ClientFault]
        );
        assert_eq!(events[1].reason.as_deref(), Some("pool cleared"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_is_idempotent() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));

        sup.connect(URI).await.unwrap();
        sup.disconnect().await;
        sup.disconnect().await;
        assert_eq!(sup.state(), ConnState::Idle);
        assert_eq!(fake.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_awaits_inflight_attempt() {
        let fake = FakeConnector::default().with_connect_delay(50);
        let sup = build(&fake, cfg(5, 1000));

        let connector = sup.clone();
        let task = tokio::spawn(async move { connector.connect(URI).await });
        settle().await;
        assert_eq!(sup.state(), ConnState::Connecting);

        sup.disconnect().await;
        assert_eq!(sup.state(), ConnState::Idle);
        assert_eq!(fake.closes(), 1);
        let _ = task.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_rejected_after_shutdown_begins() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));

        sup.begin_shutdown();
        let err = sup.connect(URI).await.unwrap_err();
        assert!(matches!(err, ConnectError::ShuttingDown));
        assert_eq!(fake.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_scheduled_during_shutdown() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 100));

        sup.connect(URI).await.unwrap();
        sup.begin_shutdown();
        fake.emit(ClientSignal::Disconnected).await;
        settle().await;

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fake.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_default_uses_configured_target() {
        let fake = FakeConnector::default();
        let mut config = cfg(5, 1000);
        config.uri = Some(URI.to_string());
        let sup = build(&fake, config);

        let handle = sup.connect_default().await.unwrap();
        assert_eq!(handle, 1);
        assert_eq!(sup.state(), ConnState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_default_without_target_is_config_error() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));

        let err = sup.connect_default().await.unwrap_err();
        assert!(matches!(err, ConnectError::Config { .. }));
        assert_eq!(fake.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_supervisor_reads() {
        let fake = FakeConnector::default();
        let sup = build(&fake, cfg(5, 1000));
        assert_eq!(sup.state(), ConnState::Idle);
        assert!(sup.handle().is_none());
        assert!(!sup.is_shutting_down());
    }
}
