//! In-memory transport with a scriptable server side

use parking_lot::Mutex;
use pulse_core::{
    InboundMessage, OutboundMessage, RemoteEvent, Transport, TransportError, TransportLink, UserId,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

const LINK_BUFFER: usize = 64;

/// Transport whose links are mpsc channel pairs
///
/// Every successful `connect` hands the server half to the paired
/// [`ServerHandle`].
#[derive(Debug)]
pub struct ChannelTransport {
    sessions: mpsc::UnboundedSender<ServerSession>,
    failures_left: AtomicU32,
    connects: AtomicU32,
}

impl ChannelTransport {
    pub fn new() -> (Arc<Self>, ServerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            sessions: tx,
            failures_left: AtomicU32::new(0),
            connects: AtomicU32::new(0),
        });
        (transport, ServerHandle { sessions: rx })
    }

    /// Make the next `n` connects fail
    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Connect attempts so far, failed ones included
    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for ChannelTransport {
    async fn connect(&self) -> Result<TransportLink, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::ConnectFailed("scripted failure".into()));
        }

        let (out_tx, out_rx) = mpsc::channel(LINK_BUFFER);
        let (in_tx, in_rx) = mpsc::channel(LINK_BUFFER);
        self.sessions
            .send(ServerSession {
                to_client: in_tx,
                from_client: out_rx,
            })
            .map_err(|_| TransportError::ConnectFailed("server gone".into()))?;
        Ok(TransportLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}

/// Server side: yields one session per successful connect
#[derive(Debug)]
pub struct ServerHandle {
    sessions: mpsc::UnboundedReceiver<ServerSession>,
}

impl ServerHandle {
    /// Wait for the next client link
    pub async fn accept(&mut self) -> ServerSession {
        self.sessions.recv().await.expect("transport dropped")
    }

    /// Session already connected, if any
    pub fn try_accept(&mut self) -> Option<ServerSession> {
        self.sessions.try_recv().ok()
    }
}

/// Server half of one link; drop it to simulate link loss
#[derive(Debug)]
pub struct ServerSession {
    to_client: mpsc::Sender<InboundMessage>,
    from_client: mpsc::Receiver<OutboundMessage>,
}

impl ServerSession {
    /// Next client message
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.from_client.recv().await
    }

    /// Next client message that is not a ping; pings are answered
    pub async fn recv_non_ping(&mut self) -> Option<OutboundMessage> {
        loop {
            match self.from_client.recv().await? {
                OutboundMessage::Ping { seq } => self.send(InboundMessage::Pong { seq }).await,
                other => return Some(other),
            }
        }
    }

    /// Read the authenticate message and return its token
    pub async fn expect_authenticate(&mut self) -> String {
        match self.recv().await {
            Some(OutboundMessage::Authenticate { token }) => token,
            other => panic!("expected authenticate, got {other:?}"),
        }
    }

    /// Accept the client's credential as `user_id`
    pub async fn authenticate(&mut self, user_id: &str) -> String {
        let token = self.expect_authenticate().await;
        self.send(InboundMessage::Authenticated {
            user_id: UserId::new(user_id),
        })
        .await;
        token
    }

    /// Reject the client's credential
    pub async fn reject(&mut self, message: &str) {
        self.expect_authenticate().await;
        self.send(InboundMessage::AuthError {
            message: message.to_string(),
        })
        .await;
    }

    /// Send any message to the client
    pub async fn send(&self, message: InboundMessage) {
        // The client may already be gone in teardown paths.
        let _ = self.to_client.send(message).await;
    }

    /// Push a domain event to the client
    pub async fn push(&self, event: RemoteEvent) {
        self.send(InboundMessage::Event { event }).await;
    }
}

/// Server that authenticates every session, answers pings and records traffic
#[derive(Debug)]
pub struct ScriptedServer {
    received: Arc<Mutex<Vec<OutboundMessage>>>,
    current: Arc<Mutex<Option<mpsc::Sender<InboundMessage>>>>,
    kill: Arc<Notify>,
    sessions: Arc<AtomicU32>,
    task: JoinHandle<()>,
}

impl ScriptedServer {
    pub fn spawn(mut handle: ServerHandle, user_id: &str) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let current = Arc::new(Mutex::new(None));
        let kill = Arc::new(Notify::new());
        let sessions = Arc::new(AtomicU32::new(0));
        let user_id = UserId::new(user_id);

        let task = {
            let received = Arc::clone(&received);
            let current = Arc::clone(&current);
            let kill = Arc::clone(&kill);
            let sessions = Arc::clone(&sessions);
            tokio::spawn(async move {
                while let Some(mut session) = handle.sessions.recv().await {
                    sessions.fetch_add(1, Ordering::SeqCst);
                    *current.lock() = Some(session.to_client.clone());
                    loop {
                        tokio::select! {
                            () = kill.notified() => break,
                            msg = session.from_client.recv() => match msg {
                                None => break,
                                Some(OutboundMessage::Authenticate { .. }) => {
                                    session.send(InboundMessage::Authenticated {
                                        user_id: user_id.clone(),
                                    }).await;
                                }
                                Some(OutboundMessage::Ping { seq }) => {
                                    session.send(InboundMessage::Pong { seq }).await;
                                }
                                Some(other) => received.lock().push(other),
                            },
                        }
                    }
                    *current.lock() = None;
                }
            })
        };

        Self {
            received,
            current,
            kill,
            sessions,
            task,
        }
    }

    /// Non-auth, non-ping messages received so far
    pub fn received(&self) -> Vec<OutboundMessage> {
        self.received.lock().clone()
    }

    /// Sessions accepted so far
    pub fn session_count(&self) -> u32 {
        self.sessions.load(Ordering::SeqCst)
    }

    /// Push an event into the live session, if there is one
    pub fn push(&self, event: RemoteEvent) -> bool {
        let sender = self.current.lock().clone();
        sender.is_some_and(|tx| tx.try_send(InboundMessage::Event { event }).is_ok())
    }

    /// Drop the live session
    pub fn drop_session(&self) {
        self.kill.notify_one();
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
