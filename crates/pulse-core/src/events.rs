//! Event vocabulary carried by the bus
//!
//! `CollabEvent` is the tagged union of everything the bus delivers. Each
//! family is also a [`Topic`], so subscribers can register for one family
//! and receive its payload type directly.

use crate::notification::NotificationRecord;
use crate::presence::{PresenceRecord, TypingIndicator};
use crate::protocol::RemoteEvent;
use crate::types::{ConnectionState, Location, NotificationId, UserId};
use std::time::Duration;

/// Connection lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// State changed
    StateChanged {
        /// Previous state
        from: ConnectionState,
        /// New state
        to: ConnectionState,
    },
    /// Credential accepted
    Authenticated {
        /// The session user
        user_id: UserId,
    },
    /// Credential rejected or missing; the UI should prompt for re-authentication
    AuthFailed {
        /// Reason
        reason: String,
    },
    /// Transport lost, retry scheduled
    ReconnectScheduled {
        /// Attempt number, starting at 1
        attempt: u32,
        /// Backoff before the attempt
        delay: Duration,
    },
    /// Retry budget exhausted; terminal
    ReconnectFailed {
        /// Attempts made
        attempts: u32,
    },
    /// No pong within the heartbeat timeout
    HeartbeatTimeout {
        /// Unanswered ping
        seq: u64,
    },
}

/// Presence changes for UI avatars and typing indicators
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    /// Roster of a location changed
    RosterChanged {
        /// Location
        location: Location,
        /// Online users after the change
        online: Vec<PresenceRecord>,
    },
    /// Typing overlay of a location changed
    TypingChanged {
        /// Location
        location: Location,
        /// User whose flag changed
        user_id: UserId,
        /// New flag
        is_typing: bool,
        /// Everyone typing after the change
        typing: Vec<TypingIndicator>,
    },
}

/// Notification store changes for badges and lists
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    /// Record created
    Created(NotificationRecord),
    /// Record marked read
    Read {
        /// Record
        id: NotificationId,
    },
    /// Every record marked read
    AllRead,
    /// Record dismissed (deleted)
    Dismissed {
        /// Record
        id: NotificationId,
    },
    /// Store emptied
    Cleared,
    /// Unread badge count after any change
    UnreadCount(usize),
    /// Settings saved
    SettingsChanged,
}

/// Search recompute results
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Fresh results are available
    ResultsUpdated {
        /// Query the results belong to
        query: String,
        /// Total matches across groups
        total: usize,
    },
}

/// Everything the bus carries
#[derive(Debug, Clone, PartialEq)]
pub enum CollabEvent {
    /// Connection lifecycle
    Connection(ConnectionEvent),
    /// Server-pushed domain event
    Remote(RemoteEvent),
    /// Presence change
    Presence(PresenceEvent),
    /// Notification change
    Notification(NotificationEvent),
    /// Search results
    Search(SearchEvent),
}

impl CollabEvent {
    /// Family name for logging
    #[must_use]
    pub fn family(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Remote(_) => "remote",
            Self::Presence(_) => "presence",
            Self::Notification(_) => "notification",
            Self::Search(_) => "search",
        }
    }
}

/// A payload type that can be selected out of a bus event
pub trait Topic<E>: Sized + 'static {
    /// Borrow the payload if `event` belongs to this topic
    fn select(event: &E) -> Option<&Self>;
}

macro_rules! collab_topic {
    ($ty:ty, $variant:ident) => {
        impl Topic<CollabEvent> for $ty {
            #[inline]
            fn select(event: &CollabEvent) -> Option<&Self> {
                match event {
                    CollabEvent::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for CollabEvent {
            #[inline]
            fn from(value: $ty) -> Self {
                CollabEvent::$variant(value)
            }
        }
    };
}

collab_topic!(ConnectionEvent, Connection);
collab_topic!(RemoteEvent, Remote);
collab_topic!(PresenceEvent, Presence);
collab_topic!(NotificationEvent, Notification);
collab_topic!(SearchEvent, Search);
