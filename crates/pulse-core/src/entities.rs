//! Workspace entity snapshots
//!
//! Projects, tasks, members and clients as supplied by the external data
//! loader. The core only ever reads these; refreshes replace the whole
//! snapshot.

use chrono::{DateTime, NaiveDate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Task workflow status
///
/// Unrecognised wire values map to `Unknown` instead of failing the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Pending,
    /// Being worked on
    InProgress,
    /// Waiting for review
    Review,
    /// Done
    Completed,
    /// Abandoned
    Cancelled,
    /// Any status this build does not know about
    Unknown,
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "pending" | "todo" => Self::Pending,
            "in_progress" => Self::InProgress,
            "review" => Self::Review,
            "completed" | "done" => Self::Completed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }
}

impl From<TaskStatus> for String {
    fn from(value: TaskStatus) -> Self {
        value.as_str().to_string()
    }
}

impl TaskStatus {
    /// Wire/display name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// Task no longer needs attention
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low
    Low,
    /// Medium
    #[default]
    Medium,
    /// High
    High,
    /// Urgent
    Urgent,
}

impl TaskPriority {
    /// Wire/display name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Project record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Project {
    /// Project ID
    pub id: u64,
    /// Display name
    pub name: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Project type label (e.g. "web", "branding")
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    /// Status label (e.g. "active", "completed")
    pub status: Option<String>,
    /// Owning client
    pub client_id: Option<u64>,
    /// Raw end date as supplied by the loader
    pub end_date: Option<String>,
    /// Budget amount
    pub budget: Option<f64>,
    /// Amount spent
    pub spent: Option<f64>,
}

/// Task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Task {
    /// Task ID
    pub id: u64,
    /// Owning project
    pub project_id: Option<u64>,
    /// Display name
    pub name: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Workflow status
    pub status: TaskStatus,
    /// Priority
    pub priority: Option<TaskPriority>,
    /// Assigned member
    pub assignee_id: Option<String>,
    /// Raw due date as supplied by the loader
    pub due_date: Option<String>,
}

/// Team member record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Member {
    /// Member ID
    pub id: String,
    /// Full name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Role title
    pub role: Option<String>,
    /// Department
    pub department: Option<String>,
    /// Status label (e.g. "active")
    pub status: Option<String>,
}

/// Client record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Client {
    /// Client ID
    pub id: u64,
    /// Company name
    pub company_name: Option<String>,
    /// Primary contact
    pub contact_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Industry
    pub industry: Option<String>,
    /// Status label (e.g. "active", "prospect")
    pub status: Option<String>,
}

/// Point-in-time copy of every collection the core reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkspaceSnapshot {
    /// Projects
    pub projects: Vec<Project>,
    /// Tasks
    pub tasks: Vec<Task>,
    /// Team members
    pub members: Vec<Member>,
    /// Clients
    pub clients: Vec<Client>,
}

impl WorkspaceSnapshot {
    /// Create empty snapshot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot from its JSON form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up a task
    #[must_use]
    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Look up a project
    #[must_use]
    pub fn project(&self, id: u64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Total entity count
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len() + self.tasks.len() + self.members.len() + self.clients.len()
    }

    /// No entities at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Supplier of the current workspace snapshot
pub trait SnapshotProvider: Send + Sync {
    /// Latest snapshot; callers must treat it as read-only
    fn current(&self) -> Arc<WorkspaceSnapshot>;
}

/// Snapshot holder that the data loader replaces wholesale on refresh
#[derive(Debug, Default)]
pub struct SharedSnapshot {
    inner: RwLock<Arc<WorkspaceSnapshot>>,
}

impl SharedSnapshot {
    /// Create holder with an initial snapshot
    #[must_use]
    pub fn new(snapshot: WorkspaceSnapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Replace the snapshot
    pub fn replace(&self, snapshot: WorkspaceSnapshot) {
        *self.inner.write() = Arc::new(snapshot);
    }
}

impl SnapshotProvider for SharedSnapshot {
    fn current(&self) -> Arc<WorkspaceSnapshot> {
        Arc::clone(&self.inner.read())
    }
}

/// Parse a loader-supplied date (`YYYY-MM-DD` or RFC 3339 timestamp)
///
/// Timestamps keep their own calendar date; no timezone shift is applied.
#[must_use]
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_and_rfc3339_dates() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(parse_calendar_date("2026-03-14"), Some(d));
        assert_eq!(parse_calendar_date("2026-03-14T23:30:00+02:00"), Some(d));
        assert_eq!(parse_calendar_date(" 2026-03-14 "), Some(d));
        assert_eq!(parse_calendar_date("14/03/2026"), None);
        assert_eq!(parse_calendar_date(""), None);
    }

    #[test]
    fn snapshot_from_json_tolerates_missing_fields() {
        let snap = WorkspaceSnapshot::from_json(
            r#"{"tasks":[{"id":1,"name":"Ship","status":"in_progress","due_date":"2026-01-02"}],
                "projects":[{"id":7,"name":"Site","type":"web"}]}"#,
        )
        .unwrap();
        assert_eq!(snap.tasks[0].status, TaskStatus::InProgress);
        assert_eq!(snap.projects[0].project_type.as_deref(), Some("web"));
        assert!(snap.members.is_empty());
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn unknown_task_status_is_tolerated() {
        let task: Task = serde_json::from_str(r#"{"id":3,"status":"blocked"}"#).unwrap();
        assert_eq!(task.status, TaskStatus::Unknown);
        assert!(!task.status.is_closed());
    }

    #[test]
    fn shared_snapshot_replace() {
        let shared = SharedSnapshot::default();
        assert!(shared.current().is_empty());

        let mut snap = WorkspaceSnapshot::new();
        snap.tasks.push(Task {
            id: 9,
            ..Task::default()
        });
        shared.replace(snap);
        assert!(shared.current().task(9).is_some());
    }
}
