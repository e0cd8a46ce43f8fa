//! Recording collaborators

use parking_lot::Mutex;
use pulse_core::{
    AlertPermission, AlertSink, ConnectionError, CredentialProvider, DeliveryError, NativeAlert,
    OutboundMessage, OutboundSink,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Credential provider with a settable token
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: Mutex<Option<String>>,
}

impl StaticCredentials {
    pub fn new(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    /// Signed-out provider
    pub fn none() -> Self {
        Self::default()
    }

    pub fn set(&self, token: Option<&str>) {
        *self.token.lock() = token.map(str::to_string);
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self) -> Option<String> {
        self.token.lock().clone()
    }
}

/// Outbound sink that records every message while "connected"
#[derive(Debug)]
pub struct RecordingSink {
    connected: AtomicBool,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingSink {
    pub fn connected() -> Self {
        Self {
            connected: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().clone()
    }

    pub fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl OutboundSink for RecordingSink {
    fn send(&self, message: OutboundMessage) -> Result<(), ConnectionError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ConnectionError::NotConnected);
        }
        self.sent.lock().push(message);
        Ok(())
    }
}

/// Alert sink that records shows and closes
#[derive(Debug)]
pub struct RecordingAlertSink {
    permission: Mutex<AlertPermission>,
    grant_on_request: AlertPermission,
    requests: AtomicU32,
    fail_show: AtomicBool,
    shown: Mutex<Vec<NativeAlert>>,
    closed: Mutex<Vec<String>>,
}

impl RecordingAlertSink {
    /// Permission already granted
    pub fn granted() -> Self {
        Self::with_permission(AlertPermission::Granted, AlertPermission::Granted)
    }

    /// Not asked yet; the prompt answers `answer`
    pub fn prompting(answer: AlertPermission) -> Self {
        Self::with_permission(AlertPermission::Prompt, answer)
    }

    fn with_permission(current: AlertPermission, grant_on_request: AlertPermission) -> Self {
        Self {
            permission: Mutex::new(current),
            grant_on_request,
            requests: AtomicU32::new(0),
            fail_show: AtomicBool::new(false),
            shown: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
        }
    }

    /// Make every `show` fail
    pub fn fail_shows(&self) {
        self.fail_show.store(true, Ordering::SeqCst);
    }

    pub fn permission_requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn shown(&self) -> Vec<NativeAlert> {
        self.shown.lock().clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().clone()
    }
}

#[async_trait::async_trait]
impl AlertSink for RecordingAlertSink {
    fn permission(&self) -> AlertPermission {
        *self.permission.lock()
    }

    async fn request_permission(&self) -> AlertPermission {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let answer = self.grant_on_request;
        *self.permission.lock() = answer;
        answer
    }

    async fn show(&self, alert: NativeAlert) -> Result<(), DeliveryError> {
        if self.fail_show.load(Ordering::SeqCst) {
            return Err(DeliveryError::Failed("scripted failure".into()));
        }
        self.shown.lock().push(alert);
        Ok(())
    }

    async fn close(&self, tag: &str) {
        self.closed.lock().push(tag.to_string());
    }
}
