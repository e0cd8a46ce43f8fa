//! Core identifiers and states
//!
//! Defines the small value types shared by every Pulse component:
//! - User, location and notification identifiers
//! - Connection states
//! - Presence status and activity labels

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of a dashboard user as issued by the server
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Work-context key that scopes presence and typing state, e.g. `project:42`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(pub String);

impl Location {
    /// Create a location from a raw key
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Location of a project workspace
    #[inline]
    #[must_use]
    pub fn project(id: u64) -> Self {
        Self(format!("project:{id}"))
    }

    /// Location of a task detail view
    #[inline]
    #[must_use]
    pub fn task(id: u64) -> Self {
        Self(format!("task:{id}"))
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scope part of the key (`project` for `project:42`)
    #[must_use]
    pub fn scope(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(scope, _)| scope)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Unique notification identifier (ULID: millisecond time plus 80 random bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub Ulid);

impl NotificationId {
    /// Generate new notification ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of the live transport session
///
/// `Authenticated` implies connected. Only the connection manager writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session
    #[default]
    Disconnected,
    /// Opening the transport link
    Connecting,
    /// Link open, credential not yet accepted
    Connected,
    /// Link open and credential accepted
    Authenticated,
    /// Credential rejected; terminal until a fresh credential is supplied
    AuthError,
    /// Waiting out a backoff delay before the next attempt
    Reconnecting,
}

impl ConnectionState {
    /// Wire/display name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Authenticated => "authenticated",
            Self::AuthError => "auth_error",
            Self::Reconnecting => "reconnecting",
        }
    }

    /// Link is open
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::Authenticated)
    }

    /// Link is open and the credential was accepted
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// A session attempt is underway or established
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::Connected | Self::Authenticated | Self::Reconnecting
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of a user inside a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    /// Interacting right now
    #[default]
    Active,
    /// Present but inactive
    Idle,
    /// Present, do not disturb
    Busy,
    /// Gone
    Offline,
}

impl PresenceStatus {
    /// Counts as online for roster listings
    #[inline]
    #[must_use]
    pub fn is_online(&self) -> bool {
        !matches!(self, Self::Offline)
    }
}

/// What a user is doing in a location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Reading
    #[default]
    Viewing,
    /// Changing content
    Editing,
    /// Typing a comment or field
    Typing,
    /// Free-form label sent by another client
    Other(String),
}

impl Activity {
    /// Display label
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Viewing => "viewing",
            Self::Editing => "editing",
            Self::Typing => "typing",
            Self::Other(label) => label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_id_generation() {
        let id1 = NotificationId::new();
        let id2 = NotificationId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn location_helpers() {
        let loc = Location::project(42);
        assert_eq!(loc.as_str(), "project:42");
        assert_eq!(loc.scope(), "project");
        assert_eq!(Location::new("lobby").scope(), "lobby");
    }

    #[test]
    fn connection_state_predicates() {
        assert!(ConnectionState::Authenticated.is_connected());
        assert!(ConnectionState::Authenticated.is_authenticated());
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connected.is_authenticated());
        assert!(!ConnectionState::AuthError.is_active());
        assert!(ConnectionState::Reconnecting.is_active());
        assert_eq!(ConnectionState::AuthError.to_string(), "auth_error");
    }

    #[test]
    fn presence_status_online() {
        assert!(PresenceStatus::Busy.is_online());
        assert!(!PresenceStatus::Offline.is_online());
    }
}
