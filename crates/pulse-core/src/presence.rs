//! Presence records

use crate::types::{Activity, Location, PresenceStatus, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's presence in one location, keyed by `(user_id, location)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// User
    pub user_id: UserId,
    /// Display name, when the server sent one
    pub user_name: Option<String>,
    /// Work context
    pub location: Location,
    /// Availability
    pub status: PresenceStatus,
    /// Last time anything was heard from this user here
    pub last_seen: DateTime<Utc>,
    /// Current activity
    pub activity: Activity,
}

impl PresenceRecord {
    /// Create an active, viewing record
    #[must_use]
    pub fn new(user_id: UserId, location: Location, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            user_name: None,
            location,
            status: PresenceStatus::Active,
            last_seen: now,
            activity: Activity::Viewing,
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }
}

/// Someone currently typing in a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingIndicator {
    /// Who is typing
    pub user_id: UserId,
    /// Where
    pub location: Location,
    /// When the indicator was last refreshed
    pub since: DateTime<Utc>,
}
