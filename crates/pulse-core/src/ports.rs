//! Collaborator seams
//!
//! Everything the engine consumes from its host is a trait here, injected at
//! construction: the live transport, the credential source, the outbound
//! message sink and the native alert surface.

use crate::error::{ConnectionError, DeliveryError, TransportError};
use crate::protocol::{InboundMessage, OutboundMessage};
use tokio::sync::mpsc;

/// An open bidirectional link to the collaboration server
///
/// Dropping both halves closes the link.
#[derive(Debug)]
pub struct TransportLink {
    /// Client → server messages
    pub outbound: mpsc::Sender<OutboundMessage>,
    /// Server → client messages; `None` from `recv` means the link closed
    pub inbound: mpsc::Receiver<InboundMessage>,
}

/// Opens links to the collaboration server; owns the wire encoding
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Open a new link
    async fn connect(&self) -> Result<TransportLink, TransportError>;
}

/// Source of the bearer credential presented on every (re)connect
pub trait CredentialProvider: Send + Sync {
    /// Current credential, or `None` when the user is signed out
    fn credential(&self) -> Option<String>;
}

/// Anything that can push messages into the live session
pub trait OutboundSink: Send + Sync {
    /// Queue a message; fails with `NotConnected` without an authenticated session
    fn send(&self, message: OutboundMessage) -> Result<(), ConnectionError>;
}

/// Native alert permission, as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertPermission {
    /// Alerts may be shown
    Granted,
    /// The user refused
    Denied,
    /// Not asked yet
    Prompt,
    /// The platform has no native alerts
    Unsupported,
}

/// A native (OS/browser) alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAlert {
    /// Title line
    pub title: String,
    /// Body text
    pub body: String,
    /// Replacement key; the notification ID
    pub tag: String,
    /// Keep on screen until the user acts
    pub require_interaction: bool,
}

/// Native alert surface
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    /// Current permission without prompting
    fn permission(&self) -> AlertPermission;

    /// Prompt the user; called at most once per engine
    async fn request_permission(&self) -> AlertPermission;

    /// Show an alert
    async fn show(&self, alert: NativeAlert) -> Result<(), DeliveryError>;

    /// Close the alert with this tag, if still shown
    async fn close(&self, tag: &str);
}
