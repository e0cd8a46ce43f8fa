//! Messages exchanged with the live transport
//!
//! The transport owns the wire encoding; these types are what travels through
//! its channels. All of them serialize with a `type` tag so a JSON transport
//! can pass them through unchanged.

use crate::notification::EntityRef;
use crate::presence::PresenceRecord;
use crate::types::{Activity, Location, PresenceStatus, UserId};
use serde::{Deserialize, Serialize};

/// Client → server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Present a bearer credential
    Authenticate {
        /// Credential
        token: String,
    },
    /// Heartbeat probe
    Ping {
        /// Sequence number echoed back by `pong`
        seq: u64,
    },
    /// Start receiving presence for a location
    JoinLocation {
        /// Location
        location: Location,
    },
    /// Stop receiving presence for a location
    LeaveLocation {
        /// Location
        location: Location,
    },
    /// Local typing indicator
    Typing {
        /// Location
        location: Location,
        /// Typing or stopped
        is_typing: bool,
    },
    /// Local status/activity change
    PresenceUpdate {
        /// Location
        location: Location,
        /// Availability
        status: PresenceStatus,
        /// Activity
        activity: Activity,
    },
}

/// Server → client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Credential accepted
    Authenticated {
        /// The authenticated user
        user_id: UserId,
    },
    /// Credential rejected
    AuthError {
        /// Server reason
        message: String,
    },
    /// Heartbeat answer
    Pong {
        /// Echoed sequence number
        seq: u64,
    },
    /// Any domain event
    Event {
        /// The event
        event: RemoteEvent,
    },
}

/// Domain events pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RemoteEvent {
    /// A user entered a location
    UserJoined {
        /// User
        user_id: UserId,
        /// Display name
        user_name: Option<String>,
        /// Location
        location: Location,
    },
    /// A user left a location
    UserLeft {
        /// User
        user_id: UserId,
        /// Location
        location: Location,
    },
    /// A user started or stopped typing
    UserTyping {
        /// User
        user_id: UserId,
        /// Location
        location: Location,
        /// Typing or stopped
        is_typing: bool,
    },
    /// A user changed status or activity
    PresenceUpdate {
        /// User
        user_id: UserId,
        /// Location
        location: Location,
        /// Availability
        status: PresenceStatus,
        /// Activity
        activity: Activity,
    },
    /// Full roster of a location, sent after a join
    LocationRoster {
        /// Location
        location: Location,
        /// Everyone present
        users: Vec<PresenceRecord>,
    },
    /// A task was assigned
    TaskAssigned {
        /// Task
        task_id: u64,
        /// Task name
        task_name: String,
        /// Assignee
        assignee_id: UserId,
        /// Acting user
        actor_id: Option<UserId>,
        /// Acting user's name
        actor_name: Option<String>,
        /// Owning project name
        project_name: Option<String>,
    },
    /// A task changed
    TaskUpdated {
        /// Task
        task_id: u64,
        /// Task name
        task_name: String,
        /// Changed fields
        changes: Vec<String>,
        /// Acting user
        actor_id: Option<UserId>,
        /// Acting user's name
        actor_name: Option<String>,
    },
    /// A task was completed
    TaskCompleted {
        /// Task
        task_id: u64,
        /// Task name
        task_name: String,
        /// Acting user
        actor_id: Option<UserId>,
        /// Acting user's name
        actor_name: Option<String>,
    },
    /// A project changed
    ProjectUpdated {
        /// Project
        project_id: u64,
        /// Project name
        project_name: String,
        /// Summary
        summary: String,
        /// Acting user
        actor_id: Option<UserId>,
    },
    /// A comment was posted
    CommentAdded {
        /// Entity
        entity: EntityRef,
        /// Author
        author_id: UserId,
        /// Author name
        author_name: String,
        /// Body
        body: String,
    },
    /// The current user was mentioned
    Mentioned {
        /// Entity
        entity: EntityRef,
        /// Author
        author_id: UserId,
        /// Author name
        author_name: String,
        /// Body
        body: String,
    },
    /// Team membership changed
    TeamUpdated {
        /// Member
        member_name: String,
        /// What happened
        message: String,
    },
    /// A budget threshold was crossed
    BudgetThreshold {
        /// Project
        project_id: u64,
        /// Project name
        project_name: String,
        /// Spent share in percent
        percent_used: f64,
    },
    /// Operator broadcast
    SystemMessage {
        /// Text
        message: String,
    },
}

impl RemoteEvent {
    /// Location the event is scoped to, for presence events
    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::UserJoined { location, .. }
            | Self::UserLeft { location, .. }
            | Self::UserTyping { location, .. }
            | Self::PresenceUpdate { location, .. }
            | Self::LocationRoster { location, .. } => Some(location),
            _ => None,
        }
    }

    /// Short name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserJoined { .. } => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::UserTyping { .. } => "user_typing",
            Self::PresenceUpdate { .. } => "presence_update",
            Self::LocationRoster { .. } => "location_roster",
            Self::TaskAssigned { .. } => "task_assigned",
            Self::TaskUpdated { .. } => "task_updated",
            Self::TaskCompleted { .. } => "task_completed",
            Self::ProjectUpdated { .. } => "project_updated",
            Self::CommentAdded { .. } => "comment_added",
            Self::Mentioned { .. } => "mentioned",
            Self::TeamUpdated { .. } => "team_updated",
            Self::BudgetThreshold { .. } => "budget_threshold",
            Self::SystemMessage { .. } => "system_message",
        }
    }
}
