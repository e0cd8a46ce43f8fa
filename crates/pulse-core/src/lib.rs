//! Pulse Core - shared vocabulary of the collaboration engine
//!
//! Everything the realtime, notification and search components exchange:
//! - Identifiers and connection/presence states
//! - Workspace entity snapshots and the snapshot provider seam
//! - Notification records, payloads and settings
//! - Wire messages for the live transport and the collaborator traits
//! - The typed event bus and its event families
//! - Clock abstraction and the error taxonomy
//!
//! # Example
//!
//! ```rust
//! use pulse_core::{CollabEvent, ConnectionEvent, ConnectionState, EventBus};
//!
//! let bus: EventBus<CollabEvent> = EventBus::new();
//! let sub = bus.on::<ConnectionEvent, _>(|event| {
//!     if let ConnectionEvent::StateChanged { to, .. } = event {
//!         println!("now {to}");
//!     }
//! });
//! bus.emit(ConnectionEvent::StateChanged {
//!     from: ConnectionState::Disconnected,
//!     to: ConnectionState::Connecting,
//! });
//! sub.unsubscribe();
//! ```

#![warn(unreachable_pub)]

pub mod bus;
pub mod clock;
pub mod entities;
pub mod error;
pub mod events;
pub mod notification;
pub mod ports;
pub mod presence;
pub mod protocol;
pub mod types;

// Re-exports for convenience
pub use bus::{EventBus, Subscription};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entities::{
    parse_calendar_date, Client, Member, Project, SharedSnapshot, SnapshotProvider, Task,
    TaskPriority, TaskStatus, WorkspaceSnapshot,
};
pub use error::{
    AuthError, ConnectionError, DeliveryError, PresenceError, PulseError, ScanError, SearchError,
    SettingsError, TransportError,
};
pub use events::{
    CollabEvent, ConnectionEvent, NotificationEvent, PresenceEvent, SearchEvent, Topic,
};
pub use notification::{
    ActionKind, EntityRef, NotificationAction, NotificationCategory, NotificationData,
    NotificationKind, NotificationRecord, NotificationSettings, Priority,
};
pub use ports::{
    AlertPermission, AlertSink, CredentialProvider, NativeAlert, OutboundSink, Transport,
    TransportLink,
};
pub use presence::{PresenceRecord, TypingIndicator};
pub use protocol::{InboundMessage, OutboundMessage, RemoteEvent};
pub use types::{Activity, ConnectionState, Location, NotificationId, PresenceStatus, UserId};

/// The bus type every component shares
pub type CollabBus = EventBus<CollabEvent>;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Pulse
    pub use crate::{
        Clock, CollabBus, CollabEvent, ConnectionState, Location, NotificationData,
        NotificationRecord, PulseError, SnapshotProvider, UserId, WorkspaceSnapshot,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
