//! Connection Manager
//!
//! Owns the live session: connect, authenticate, heartbeat and reconnect
//! with exponential backoff. It is the only writer of [`ConnectionState`];
//! every transition is checked against the state table and announced on the
//! bus.
//!
//! One supervisor task runs per `initialize()`; `disconnect()` cancels it and
//! waits for it to finish, which drops the link and every timer it owns.

use crate::config::ConnectionConfig;
use crate::state::validate_transition;
use parking_lot::Mutex;
use pulse_core::{
    AuthError, CollabBus, CollabEvent, ConnectionError, ConnectionEvent, ConnectionState,
    CredentialProvider, InboundMessage, OutboundMessage, OutboundSink, Transport, TransportError,
    TransportLink, UserId,
};
use std::fmt;
use std::future::pending;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, sleep_until, timeout_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Link open
    pub connected: bool,
    /// Credential accepted
    pub authenticated: bool,
    /// Exact state
    pub state: ConnectionState,
    /// Authenticated user
    pub user_id: Option<UserId>,
    /// Reconnect attempts since the last successful authentication
    pub reconnect_attempt: u32,
}

#[derive(Debug, Default)]
struct Session {
    state: ConnectionState,
    user_id: Option<UserId>,
    reconnect_attempt: u32,
    outbound: Option<mpsc::Sender<OutboundMessage>>,
    cancel: Option<CancellationToken>,
    supervisor: Option<JoinHandle<()>>,
}

struct Shared {
    config: ConnectionConfig,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    bus: CollabBus,
    state_tx: watch::Sender<ConnectionState>,
    session: Mutex<Session>,
}

/// How one session attempt ended
enum SessionEnd {
    Lost(TransportError),
    AuthFailed(AuthError),
}

impl Shared {
    fn transition(&self, to: ConnectionState) -> Result<(), ConnectionError> {
        let from = {
            let mut session = self.session.lock();
            let from = session.state;
            if from == to {
                return Ok(());
            }
            if let Err(err) = validate_transition(from, to) {
                warn!(%from, %to, "rejected illegal connection state transition");
                return Err(err);
            }
            session.state = to;
            self.state_tx.send_replace(to);
            from
        };
        self.announce(from, to);
        Ok(())
    }

    fn announce(&self, from: ConnectionState, to: ConnectionState) {
        info!(%from, %to, "connection state changed");
        self.bus.emit(ConnectionEvent::StateChanged { from, to });
    }

    fn clear_link(&self) {
        let mut session = self.session.lock();
        session.outbound = None;
        session.user_id = None;
    }

    fn next_attempt(&self) -> Option<u32> {
        let mut session = self.session.lock();
        if session.reconnect_attempt >= self.config.max_attempts {
            None
        } else {
            session.reconnect_attempt += 1;
            Some(session.reconnect_attempt)
        }
    }
}

/// Live transport session owner
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    /// Create a manager; nothing happens until [`initialize`](Self::initialize)
    #[must_use]
    pub fn new(
        config: ConnectionConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        bus: CollabBus,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                config,
                transport,
                credentials,
                bus,
                state_tx,
                session: Mutex::new(Session::default()),
            }),
        }
    }

    /// Start a session
    ///
    /// Returns `false` without doing anything while a session is connecting,
    /// established or waiting to reconnect. From `auth_error` this starts over
    /// with whatever credential the provider now returns.
    ///
    /// Must be called from within a tokio runtime.
    pub fn initialize(&self) -> bool {
        let (from, token) = {
            let mut session = self.shared.session.lock();
            if session.state.is_active() {
                debug!(state = %session.state, "initialize ignored; session already active");
                return false;
            }
            let from = session.state;
            if validate_transition(from, ConnectionState::Connecting).is_err() {
                warn!(%from, "initialize rejected by state table");
                return false;
            }
            session.state = ConnectionState::Connecting;
            session.reconnect_attempt = 0;
            self.shared.state_tx.send_replace(ConnectionState::Connecting);
            let token = CancellationToken::new();
            session.cancel = Some(token.clone());
            (from, token)
        };
        self.shared.announce(from, ConnectionState::Connecting);

        let handle = tokio::spawn(supervise(Arc::clone(&self.shared), token));
        self.shared.session.lock().supervisor = Some(handle);
        true
    }

    /// Tear the session down and return to `disconnected`
    ///
    /// Cancels the supervisor (heartbeat, reconnect and auth timers included)
    /// and waits for it to exit, which closes the link.
    pub async fn disconnect(&self) {
        let (token, handle) = {
            let mut session = self.shared.session.lock();
            (session.cancel.take(), session.supervisor.take())
        };
        if let Some(token) = token {
            token.cancel();
        }
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    warn!(error = %err, "connection supervisor panicked");
                }
            }
        }

        {
            let mut session = self.shared.session.lock();
            session.outbound = None;
            session.user_id = None;
            session.reconnect_attempt = 0;
        }
        // Already disconnected is fine; nothing else can fail here.
        let _ = self.shared.transition(ConnectionState::Disconnected);
    }

    /// Current status snapshot
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        let session = self.shared.session.lock();
        ConnectionStatus {
            connected: session.state.is_connected(),
            authenticated: session.state.is_authenticated(),
            state: session.state,
            user_id: session.user_id.clone(),
            reconnect_attempt: session.reconnect_attempt,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.session.lock().state
    }

    /// Authenticated user, if any
    #[must_use]
    pub fn current_user(&self) -> Option<UserId> {
        self.shared.session.lock().user_id.clone()
    }

    /// Watch state changes
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Queue a message for the live session
    ///
    /// # Errors
    /// - `ConnectionError::NotConnected` without an authenticated session
    /// - `TransportError::Saturated` when the outbound queue is full
    pub fn send(&self, message: OutboundMessage) -> Result<(), ConnectionError> {
        let outbound = {
            let session = self.shared.session.lock();
            if !session.state.is_authenticated() {
                return Err(ConnectionError::NotConnected);
            }
            session.outbound.clone().ok_or(ConnectionError::NotConnected)?
        };
        outbound.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => TransportError::Saturated.into(),
            TrySendError::Closed(_) => TransportError::Closed.into(),
        })
    }
}

impl OutboundSink for ConnectionManager {
    fn send(&self, message: OutboundMessage) -> Result<(), ConnectionError> {
        ConnectionManager::send(self, message)
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

async fn supervise(shared: Arc<Shared>, token: CancellationToken) {
    loop {
        let end = tokio::select! {
            biased;
            () = token.cancelled() => return,
            end = run_session(&shared) => end,
        };
        shared.clear_link();
        if token.is_cancelled() {
            return;
        }

        match end {
            SessionEnd::AuthFailed(err) => {
                warn!(error = %err, "authentication failed");
                if shared.transition(ConnectionState::AuthError).is_ok() {
                    shared.bus.emit(ConnectionEvent::AuthFailed {
                        reason: err.to_string(),
                    });
                }
                return;
            }
            SessionEnd::Lost(err) => {
                let Some(attempt) = shared.next_attempt() else {
                    let attempts = shared.config.max_attempts;
                    warn!(error = %err, attempts, "reconnect budget exhausted");
                    shared.bus.emit(ConnectionEvent::ReconnectFailed { attempts });
                    let _ = shared.transition(ConnectionState::Disconnected);
                    return;
                };

                let delay = shared.config.backoff_delay(attempt);
                warn!(
                    error = %err,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "connection lost; scheduling reconnect"
                );
                if shared.transition(ConnectionState::Reconnecting).is_err() {
                    return;
                }
                shared
                    .bus
                    .emit(ConnectionEvent::ReconnectScheduled { attempt, delay });

                tokio::select! {
                    biased;
                    () = token.cancelled() => return,
                    () = sleep(delay) => {}
                }
                if shared.transition(ConnectionState::Connecting).is_err() {
                    return;
                }
            }
        }
    }
}

async fn run_session(shared: &Shared) -> SessionEnd {
    let TransportLink {
        outbound,
        mut inbound,
    } = match shared.transport.connect().await {
        Ok(link) => link,
        Err(err) => return SessionEnd::Lost(err),
    };
    if shared.transition(ConnectionState::Connected).is_err() {
        return SessionEnd::Lost(TransportError::Closed);
    }

    let Some(credential) = shared.credentials.credential() else {
        return SessionEnd::AuthFailed(AuthError::MissingCredential);
    };
    if outbound
        .send(OutboundMessage::Authenticate { token: credential })
        .await
        .is_err()
    {
        return SessionEnd::Lost(TransportError::Closed);
    }

    let deadline = Instant::now() + shared.config.auth_timeout();
    let user_id = loop {
        match timeout_at(deadline, inbound.recv()).await {
            Err(_) => {
                return SessionEnd::Lost(TransportError::AuthTimeout {
                    timeout_ms: shared.config.auth_timeout_ms,
                })
            }
            Ok(None) => return SessionEnd::Lost(TransportError::Closed),
            Ok(Some(InboundMessage::Authenticated { user_id })) => break user_id,
            Ok(Some(InboundMessage::AuthError { message })) => {
                return SessionEnd::AuthFailed(AuthError::Rejected(message))
            }
            Ok(Some(other)) => debug!(?other, "ignoring message before authentication"),
        }
    };

    {
        let mut session = shared.session.lock();
        session.user_id = Some(user_id.clone());
        session.outbound = Some(outbound.clone());
        session.reconnect_attempt = 0;
    }
    if shared.transition(ConnectionState::Authenticated).is_err() {
        return SessionEnd::Lost(TransportError::Closed);
    }
    info!(user = %user_id, "session authenticated");
    shared.bus.emit(ConnectionEvent::Authenticated { user_id });

    live(shared, &outbound, &mut inbound).await
}

/// Authenticated phase: forward events, keep the heartbeat
async fn live(
    shared: &Shared,
    outbound: &mpsc::Sender<OutboundMessage>,
    inbound: &mut mpsc::Receiver<InboundMessage>,
) -> SessionEnd {
    let period = shared.config.heartbeat_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seq = 0u64;
    let mut awaiting: Option<(u64, Instant)> = None;

    loop {
        tokio::select! {
            message = inbound.recv() => match message {
                None => return SessionEnd::Lost(TransportError::Closed),
                Some(InboundMessage::Pong { seq: echoed }) => {
                    if awaiting.is_some_and(|(sent, _)| sent == echoed) {
                        awaiting = None;
                    } else {
                        debug!(seq = echoed, "stale pong ignored");
                    }
                }
                Some(InboundMessage::Event { event }) => {
                    debug!(event = event.name(), "remote event");
                    shared.bus.emit(CollabEvent::Remote(event));
                }
                Some(InboundMessage::AuthError { message }) => {
                    return SessionEnd::AuthFailed(AuthError::Rejected(message));
                }
                Some(InboundMessage::Authenticated { .. }) => {
                    debug!("duplicate authenticated message ignored");
                }
            },
            _ = ticker.tick() => {
                if awaiting.is_none() {
                    seq += 1;
                    if outbound.send(OutboundMessage::Ping { seq }).await.is_err() {
                        return SessionEnd::Lost(TransportError::Closed);
                    }
                    awaiting = Some((seq, Instant::now() + shared.config.heartbeat_timeout()));
                }
            },
            missed = pong_overdue(awaiting) => {
                warn!(seq = missed, "heartbeat not acknowledged");
                shared.bus.emit(ConnectionEvent::HeartbeatTimeout { seq: missed });
                return SessionEnd::Lost(TransportError::HeartbeatTimeout {
                    seq: missed,
                    timeout_ms: shared.config.heartbeat_timeout_ms,
                });
            }
        }
    }
}

async fn pong_overdue(awaiting: Option<(u64, Instant)>) -> u64 {
    match awaiting {
        Some((seq, deadline)) => {
            sleep_until(deadline).await;
            seq
        }
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pulse_core::{RemoteEvent, Subscription};
    use pulse_test_utils::{ChannelTransport, StaticCredentials};
    use std::time::Duration;
    use ConnectionState::{Authenticated, Connected, Connecting, Disconnected, Reconnecting};

    fn record(bus: &CollabBus) -> (Arc<Mutex<Vec<ConnectionEvent>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sub = {
            let seen = Arc::clone(&seen);
            bus.on::<ConnectionEvent, _>(move |e| seen.lock().push(e.clone()))
        };
        (seen, sub)
    }

    fn transitions(events: &[ConnectionEvent]) -> Vec<(ConnectionState, ConnectionState)> {
        events
            .iter()
            .filter_map(|e| match e {
                ConnectionEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    async fn reach(rx: &mut watch::Receiver<ConnectionState>, want: ConnectionState) {
        rx.wait_for(|s| *s == want).await.expect("state channel open");
    }

    fn manager_with(
        config: ConnectionConfig,
        transport: Arc<ChannelTransport>,
        credentials: StaticCredentials,
        bus: &CollabBus,
    ) -> ConnectionManager {
        ConnectionManager::new(config, transport, Arc::new(credentials), bus.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn authenticates_and_reports_status() {
        let (transport, mut server) = ChannelTransport::new();
        let bus = CollabBus::new();
        let (events, _sub) = record(&bus);
        let manager = manager_with(
            ConnectionConfig::default(),
            transport,
            StaticCredentials::new("tok"),
            &bus,
        );
        let mut state = manager.subscribe_state();

        assert!(manager.initialize());
        assert!(!manager.initialize());

        let mut session = server.accept().await;
        assert_eq!(session.authenticate("u1").await, "tok");
        reach(&mut state, Authenticated).await;

        let status = manager.status();
        assert!(status.connected);
        assert!(status.authenticated);
        assert_eq!(status.user_id, Some(UserId::new("u1")));
        assert_eq!(status.reconnect_attempt, 0);

        let events = events.lock().clone();
        assert_eq!(
            transitions(&events),
            vec![
                (Disconnected, Connecting),
                (Connecting, Connected),
                (Connected, Authenticated)
            ]
        );
        assert!(events.contains(&ConnectionEvent::Authenticated {
            user_id: UserId::new("u1")
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_credential_is_terminal() {
        let (transport, mut server) = ChannelTransport::new();
        let bus = CollabBus::new();
        let (events, _sub) = record(&bus);
        let manager = manager_with(
            ConnectionConfig::default(),
            Arc::clone(&transport),
            StaticCredentials::new("stale"),
            &bus,
        );
        let mut state = manager.subscribe_state();

        manager.initialize();
        server.accept().await.reject("expired").await;
        reach(&mut state, ConnectionState::AuthError).await;

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(transport.connect_count(), 1);
        assert!(server.try_accept().is_none());
        assert!(events.lock().contains(&ConnectionEvent::AuthFailed {
            reason: "credential rejected: expired".into()
        }));
        assert_eq!(manager.state(), ConnectionState::AuthError);
    }

    #[tokio::test(start_paused = true)]
    async fn revoked_session_routes_to_auth_error_and_can_restart() {
        let (transport, mut server) = ChannelTransport::new();
        let bus = CollabBus::new();
        let (events, _sub) = record(&bus);
        let manager = manager_with(
            ConnectionConfig::default(),
            Arc::clone(&transport),
            StaticCredentials::new("tok"),
            &bus,
        );
        let mut state = manager.subscribe_state();

        manager.initialize();
        let mut session = server.accept().await;
        session.authenticate("u1").await;
        reach(&mut state, Authenticated).await;

        session
            .send(InboundMessage::AuthError {
                message: "revoked".into(),
            })
            .await;
        reach(&mut state, ConnectionState::AuthError).await;

        let status = manager.status();
        assert!(!status.connected);
        assert!(!status.authenticated);
        assert_eq!(status.user_id, None);
        assert!(manager.send(OutboundMessage::Ping { seq: 1 }).is_err());

        let events = events.lock().clone();
        assert!(transitions(&events).contains(&(Authenticated, ConnectionState::AuthError)));
        assert!(events.contains(&ConnectionEvent::AuthFailed {
            reason: "credential rejected: revoked".into()
        }));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(transport.connect_count(), 1);

        assert!(manager.initialize());
        let mut session = server.accept().await;
        session.authenticate("u1").await;
        reach(&mut state, Authenticated).await;
    }

    #[tokio::test(start_paused = true)]
    async fn missing_credential_routes_to_auth_error_and_fresh_initialize_recovers() {
        let (transport, mut server) = ChannelTransport::new();
        let bus = CollabBus::new();
        let credentials = Arc::new(StaticCredentials::none());
        let manager = ConnectionManager::new(
            ConnectionConfig::default(),
            transport,
            credentials.clone(),
            bus.clone(),
        );
        let mut state = manager.subscribe_state();

        manager.initialize();
        let _first = server.accept().await;
        reach(&mut state, ConnectionState::AuthError).await;

        credentials.set(Some("fresh"));
        assert!(manager.initialize());
        let mut session = server.accept().await;
        assert_eq!(session.authenticate("u1").await, "fresh");
        reach(&mut state, Authenticated).await;
    }

    #[tokio::test(start_paused = true)]
    async fn link_loss_reconnects_with_backoff_and_resets_attempts() {
        let (transport, mut server) = ChannelTransport::new();
        let bus = CollabBus::new();
        let (events, _sub) = record(&bus);
        let manager = manager_with(
            ConnectionConfig::default(),
            transport,
            StaticCredentials::new("tok"),
            &bus,
        );
        let mut state = manager.subscribe_state();

        manager.initialize();
        let mut session = server.accept().await;
        session.authenticate("u1").await;
        reach(&mut state, Authenticated).await;

        drop(session);
        reach(&mut state, Reconnecting).await;
        assert_eq!(manager.status().reconnect_attempt, 1);
        assert!(manager.send(OutboundMessage::Ping { seq: 9 }).is_err());

        let mut session = server.accept().await;
        session.authenticate("u1").await;
        reach(&mut state, Authenticated).await;
        assert_eq!(manager.status().reconnect_attempt, 0);

        assert!(events.lock().contains(&ConnectionEvent::ReconnectScheduled {
            attempt: 1,
            delay: Duration::from_secs(1),
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let (transport, _server) = ChannelTransport::new();
        transport.fail_next(10);
        let bus = CollabBus::new();
        let (events, _sub) = record(&bus);
        let config = ConnectionConfig::default()
            .with_backoff(100, 1_000, 2.0)
            .with_max_attempts(2);
        let manager = manager_with(
            config,
            Arc::clone(&transport),
            StaticCredentials::new("tok"),
            &bus,
        );
        let mut state = manager.subscribe_state();

        manager.initialize();
        reach(&mut state, Disconnected).await;

        assert_eq!(transport.connect_count(), 3);
        let events = events.lock().clone();
        let scheduled: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ConnectionEvent::ReconnectScheduled { attempt, delay } => Some((*attempt, *delay)),
                _ => None,
            })
            .collect();
        assert_eq!(
            scheduled,
            vec![
                (1, Duration::from_millis(100)),
                (2, Duration::from_millis(200))
            ]
        );
        assert!(events.contains(&ConnectionEvent::ReconnectFailed { attempts: 2 }));
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_keeps_session_while_pongs_arrive() {
        let (transport, mut server) = ChannelTransport::new();
        let bus = CollabBus::new();
        let config = ConnectionConfig::default().with_heartbeat(1_000, 500);
        let manager = manager_with(config, transport, StaticCredentials::new("tok"), &bus);
        let mut state = manager.subscribe_state();

        manager.initialize();
        let mut session = server.accept().await;
        session.authenticate("u1").await;
        reach(&mut state, Authenticated).await;

        assert_eq!(session.recv().await, Some(OutboundMessage::Ping { seq: 1 }));
        session.send(InboundMessage::Pong { seq: 1 }).await;
        assert_eq!(session.recv().await, Some(OutboundMessage::Ping { seq: 2 }));
        assert!(manager.status().authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_pong_is_transport_loss() {
        let (transport, mut server) = ChannelTransport::new();
        let bus = CollabBus::new();
        let (events, _sub) = record(&bus);
        let config = ConnectionConfig::default().with_heartbeat(1_000, 500);
        let manager = manager_with(config, transport, StaticCredentials::new("tok"), &bus);
        let mut state = manager.subscribe_state();

        manager.initialize();
        let mut session = server.accept().await;
        session.authenticate("u1").await;
        reach(&mut state, Authenticated).await;

        assert_eq!(session.recv().await, Some(OutboundMessage::Ping { seq: 1 }));
        reach(&mut state, Reconnecting).await;
        assert!(events
            .lock()
            .contains(&ConnectionEvent::HeartbeatTimeout { seq: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_server_times_out_authentication() {
        let (transport, mut server) = ChannelTransport::new();
        let bus = CollabBus::new();
        let config = ConnectionConfig::default().with_auth_timeout(2_000);
        let manager = manager_with(config, transport, StaticCredentials::new("tok"), &bus);
        let mut state = manager.subscribe_state();

        manager.initialize();
        let mut session = server.accept().await;
        session.expect_authenticate().await;
        reach(&mut state, Reconnecting).await;
        assert_eq!(manager.status().reconnect_attempt, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_remote_events_and_sends_while_authenticated() {
        let (transport, mut server) = ChannelTransport::new();
        let bus = CollabBus::new();
        let remote = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let remote = Arc::clone(&remote);
            bus.on::<RemoteEvent, _>(move |e| remote.lock().push(e.clone()))
        };
        let manager = manager_with(
            ConnectionConfig::default(),
            transport,
            StaticCredentials::new("tok"),
            &bus,
        );
        let mut state = manager.subscribe_state();

        assert_eq!(
            manager.send(OutboundMessage::Ping { seq: 1 }),
            Err(ConnectionError::NotConnected)
        );

        manager.initialize();
        let mut session = server.accept().await;
        session.authenticate("u1").await;
        reach(&mut state, Authenticated).await;

        let join = OutboundMessage::JoinLocation {
            location: pulse_core::Location::project(1),
        };
        manager.send(join.clone()).unwrap();
        assert_eq!(session.recv().await, Some(join));

        session
            .push(RemoteEvent::SystemMessage {
                message: "maintenance at 22:00".into(),
            })
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            *remote.lock(),
            vec![RemoteEvent::SystemMessage {
                message: "maintenance at 22:00".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_everything() {
        let (transport, mut server) = ChannelTransport::new();
        let bus = CollabBus::new();
        let manager = manager_with(
            ConnectionConfig::default(),
            Arc::clone(&transport),
            StaticCredentials::new("tok"),
            &bus,
        );
        let mut state = manager.subscribe_state();

        manager.initialize();
        let mut session = server.accept().await;
        session.authenticate("u1").await;
        reach(&mut state, Authenticated).await;

        manager.disconnect().await;
        assert_eq!(manager.state(), Disconnected);
        assert_eq!(manager.current_user(), None);
        assert_eq!(session.recv().await, None);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(transport.connect_count(), 1);
        assert_eq!(
            manager.send(OutboundMessage::Ping { seq: 1 }),
            Err(ConnectionError::NotConnected)
        );
    }
}
