//! Notification records, payloads and settings
//!
//! A record's `kind` is always derived from its payload, so a payload can
//! never be paired with the wrong kind.

use crate::types::NotificationId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The twelve notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was assigned to the current user
    TaskAssigned,
    /// A watched task changed
    TaskUpdated,
    /// A watched task was completed
    TaskCompleted,
    /// A task is due soon
    DueDateReminder,
    /// A task is past its due date
    OverdueAlert,
    /// A project changed
    ProjectUpdate,
    /// A project end date is near
    ProjectDeadline,
    /// A comment was posted
    CommentAdded,
    /// The current user was mentioned
    Mention,
    /// Team membership changed
    TeamUpdate,
    /// A project budget threshold was crossed
    BudgetAlert,
    /// Operator or system message
    System,
}

impl NotificationKind {
    /// Settings category gating this kind
    #[must_use]
    pub fn category(&self) -> NotificationCategory {
        match self {
            Self::TaskAssigned => NotificationCategory::TaskAssignments,
            Self::TaskUpdated | Self::TaskCompleted => NotificationCategory::TaskUpdates,
            Self::DueDateReminder => NotificationCategory::DueDateReminders,
            Self::OverdueAlert => NotificationCategory::OverdueAlerts,
            Self::ProjectUpdate | Self::ProjectDeadline => NotificationCategory::ProjectUpdates,
            Self::CommentAdded => NotificationCategory::Comments,
            Self::Mention => NotificationCategory::Mentions,
            Self::TeamUpdate => NotificationCategory::TeamUpdates,
            Self::BudgetAlert => NotificationCategory::BudgetAlerts,
            Self::System => NotificationCategory::SystemMessages,
        }
    }

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::TaskUpdated => "task_updated",
            Self::TaskCompleted => "task_completed",
            Self::DueDateReminder => "due_date_reminder",
            Self::OverdueAlert => "overdue_alert",
            Self::ProjectUpdate => "project_update",
            Self::ProjectDeadline => "project_deadline",
            Self::CommentAdded => "comment_added",
            Self::Mention => "mention",
            Self::TeamUpdate => "team_update",
            Self::BudgetAlert => "budget_alert",
            Self::System => "system",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Informational
    Low,
    /// Worth a look
    #[default]
    Medium,
    /// Needs attention
    High,
}

/// Entity a comment or mention refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    /// A task
    Task(u64),
    /// A project
    Project(u64),
}

/// Typed payload, one variant per notification kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationData {
    /// See [`NotificationKind::TaskAssigned`]
    TaskAssigned {
        /// Task
        task_id: u64,
        /// Task name
        task_name: String,
        /// Who assigned it
        assigned_by: Option<String>,
        /// Owning project name
        project_name: Option<String>,
    },
    /// See [`NotificationKind::TaskUpdated`]
    TaskUpdated {
        /// Task
        task_id: u64,
        /// Task name
        task_name: String,
        /// Who changed it
        updated_by: Option<String>,
        /// Changed field names
        changes: Vec<String>,
    },
    /// See [`NotificationKind::TaskCompleted`]
    TaskCompleted {
        /// Task
        task_id: u64,
        /// Task name
        task_name: String,
        /// Who completed it
        completed_by: Option<String>,
    },
    /// See [`NotificationKind::DueDateReminder`]
    DueDateReminder {
        /// Task
        task_id: u64,
        /// Task name
        task_name: String,
        /// Whole calendar days until the due date
        days_until_due: i64,
        /// Due date
        due_date: NaiveDate,
    },
    /// See [`NotificationKind::OverdueAlert`]
    OverdueAlert {
        /// Task
        task_id: u64,
        /// Task name
        task_name: String,
        /// Whole calendar days past the due date
        days_overdue: i64,
        /// Due date
        due_date: NaiveDate,
    },
    /// See [`NotificationKind::ProjectUpdate`]
    ProjectUpdate {
        /// Project
        project_id: u64,
        /// Project name
        project_name: String,
        /// Summary of the change
        summary: String,
    },
    /// See [`NotificationKind::ProjectDeadline`]
    ProjectDeadline {
        /// Project
        project_id: u64,
        /// Project name
        project_name: String,
        /// Whole calendar days until the end date
        days_until_due: i64,
        /// End date
        end_date: NaiveDate,
    },
    /// See [`NotificationKind::CommentAdded`]
    CommentAdded {
        /// Commented entity
        entity: EntityRef,
        /// Comment author
        author: String,
        /// Leading part of the comment
        excerpt: String,
    },
    /// See [`NotificationKind::Mention`]
    Mention {
        /// Entity holding the mention
        entity: EntityRef,
        /// Who mentioned the user
        author: String,
        /// Leading part of the text
        excerpt: String,
    },
    /// See [`NotificationKind::TeamUpdate`]
    TeamUpdate {
        /// Member concerned
        member_name: String,
        /// What happened
        message: String,
    },
    /// See [`NotificationKind::BudgetAlert`]
    BudgetAlert {
        /// Project
        project_id: u64,
        /// Project name
        project_name: String,
        /// Spent share of budget in percent
        percent_used: f64,
    },
    /// See [`NotificationKind::System`]
    System {
        /// Message text
        message: String,
    },
}

impl NotificationData {
    /// Kind carried by this payload
    #[must_use]
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::TaskAssigned { .. } => NotificationKind::TaskAssigned,
            Self::TaskUpdated { .. } => NotificationKind::TaskUpdated,
            Self::TaskCompleted { .. } => NotificationKind::TaskCompleted,
            Self::DueDateReminder { .. } => NotificationKind::DueDateReminder,
            Self::OverdueAlert { .. } => NotificationKind::OverdueAlert,
            Self::ProjectUpdate { .. } => NotificationKind::ProjectUpdate,
            Self::ProjectDeadline { .. } => NotificationKind::ProjectDeadline,
            Self::CommentAdded { .. } => NotificationKind::CommentAdded,
            Self::Mention { .. } => NotificationKind::Mention,
            Self::TeamUpdate { .. } => NotificationKind::TeamUpdate,
            Self::BudgetAlert { .. } => NotificationKind::BudgetAlert,
            Self::System { .. } => NotificationKind::System,
        }
    }

    /// Task this payload is about, if any
    #[must_use]
    pub fn task_id(&self) -> Option<u64> {
        match self {
            Self::TaskAssigned { task_id, .. }
            | Self::TaskUpdated { task_id, .. }
            | Self::TaskCompleted { task_id, .. }
            | Self::DueDateReminder { task_id, .. }
            | Self::OverdueAlert { task_id, .. } => Some(*task_id),
            Self::CommentAdded { entity: EntityRef::Task(id), .. }
            | Self::Mention { entity: EntityRef::Task(id), .. } => Some(*id),
            _ => None,
        }
    }

    /// Project this payload is about, if any
    #[must_use]
    pub fn project_id(&self) -> Option<u64> {
        match self {
            Self::ProjectUpdate { project_id, .. }
            | Self::ProjectDeadline { project_id, .. }
            | Self::BudgetAlert { project_id, .. } => Some(*project_id),
            Self::CommentAdded { entity: EntityRef::Project(id), .. }
            | Self::Mention { entity: EntityRef::Project(id), .. } => Some(*id),
            _ => None,
        }
    }
}

/// What a notification action does when triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Navigate to a task
    OpenTask,
    /// Navigate to a project
    OpenProject,
    /// Mark a task completed
    CompleteTask,
    /// Open the reply box
    Reply,
}

/// Button attached to a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    /// Button label
    pub label: String,
    /// What it does
    pub kind: ActionKind,
    /// Entity the action targets
    pub target_id: String,
}

impl NotificationAction {
    /// Create new action
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>, kind: ActionKind, target_id: impl ToString) -> Self {
        Self {
            label: label.into(),
            kind,
            target_id: target_id.to_string(),
        }
    }
}

/// One in-app notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Identifier
    pub id: NotificationId,
    /// Kind (always `data.kind()`)
    pub kind: NotificationKind,
    /// Title line
    pub title: String,
    /// Body text
    pub message: String,
    /// Typed payload
    pub data: NotificationData,
    /// Priority
    pub priority: Priority,
    /// Seen by the user
    pub read: bool,
    /// Always false for records in the live store; dismissal deletes
    pub dismissed: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Ordered action buttons
    pub actions: Vec<NotificationAction>,
}

/// Settings category names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationCategory {
    /// Task assignment notices
    TaskAssignments,
    /// Task change and completion notices
    TaskUpdates,
    /// Due-soon reminders from the scan job
    DueDateReminders,
    /// Overdue alerts from the scan job
    OverdueAlerts,
    /// Project changes and deadlines
    ProjectUpdates,
    /// Comments
    Comments,
    /// Mentions
    Mentions,
    /// Team changes
    TeamUpdates,
    /// Budget thresholds
    BudgetAlerts,
    /// System messages
    SystemMessages,
    /// Native alert delivery on top of the in-app list
    BrowserNotifications,
}

impl NotificationCategory {
    /// Every category, in settings-screen order
    pub const ALL: [NotificationCategory; 11] = [
        Self::TaskAssignments,
        Self::TaskUpdates,
        Self::DueDateReminders,
        Self::OverdueAlerts,
        Self::ProjectUpdates,
        Self::Comments,
        Self::Mentions,
        Self::TeamUpdates,
        Self::BudgetAlerts,
        Self::SystemMessages,
        Self::BrowserNotifications,
    ];
}

/// Per-category on/off switches, persisted as a flat `{category: bool}` map
///
/// Categories missing from the map count as enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NotificationSettings {
    flags: BTreeMap<NotificationCategory, bool>,
}

impl NotificationSettings {
    /// All categories enabled
    #[must_use]
    pub fn all_enabled() -> Self {
        Self {
            flags: NotificationCategory::ALL.iter().map(|c| (*c, true)).collect(),
        }
    }

    /// Is the category enabled
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, category: NotificationCategory) -> bool {
        self.flags.get(&category).copied().unwrap_or(true)
    }

    /// Set a category
    pub fn set(&mut self, category: NotificationCategory, enabled: bool) {
        self.flags.insert(category, enabled);
    }

    /// Builder-style set
    #[inline]
    #[must_use]
    pub fn with(mut self, category: NotificationCategory, enabled: bool) -> Self {
        self.set(category, enabled);
        self
    }

    /// Iterate explicit entries
    pub fn iter(&self) -> impl Iterator<Item = (NotificationCategory, bool)> + '_ {
        self.flags.iter().map(|(c, v)| (*c, *v))
    }
}
