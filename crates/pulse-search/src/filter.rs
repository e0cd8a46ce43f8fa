//! Category toggles and exact-match filters
//!
//! Filters AND with the text match. An entity that lacks the filtered field
//! never passes that filter.

use chrono::{Duration, NaiveDate};
use pulse_core::{parse_calendar_date, Client, Member, Project, Task};
use serde::{Deserialize, Serialize};

/// Entity groups, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Projects
    Project,
    /// Tasks
    Task,
    /// Team members
    Person,
    /// Clients
    Client,
}

impl EntityType {
    /// Every group in display order
    pub const ALL: [EntityType; 4] = [Self::Project, Self::Task, Self::Person, Self::Client];

    /// Group heading
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Project => "Projects",
            Self::Task => "Tasks",
            Self::Person => "People",
            Self::Client => "Clients",
        }
    }
}

/// Which entity groups take part in a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorySet {
    /// Projects
    pub projects: bool,
    /// Tasks
    pub tasks: bool,
    /// People
    pub people: bool,
    /// Clients
    pub clients: bool,
}

impl CategorySet {
    /// Every group
    #[must_use]
    pub fn all() -> Self {
        Self {
            projects: true,
            tasks: true,
            people: true,
            clients: true,
        }
    }

    /// A single group
    #[must_use]
    pub fn only(entity: EntityType) -> Self {
        let mut set = Self {
            projects: false,
            tasks: false,
            people: false,
            clients: false,
        };
        set.set(entity, true);
        set
    }

    /// Is the group included
    #[must_use]
    pub fn contains(&self, entity: EntityType) -> bool {
        match entity {
            EntityType::Project => self.projects,
            EntityType::Task => self.tasks,
            EntityType::Person => self.people,
            EntityType::Client => self.clients,
        }
    }

    /// Toggle a group
    pub fn set(&mut self, entity: EntityType, enabled: bool) {
        match entity {
            EntityType::Project => self.projects = enabled,
            EntityType::Task => self.tasks = enabled,
            EntityType::Person => self.people = enabled,
            EntityType::Client => self.clients = enabled,
        }
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::all()
    }
}

/// Due-date window for open tasks, relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueWindow {
    /// Due before today
    Overdue,
    /// Due today or within the configured number of days
    Upcoming {
        /// Window length in days, today included
        days: i64,
    },
}

impl DueWindow {
    fn contains(self, due: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Self::Overdue => due < today,
            Self::Upcoming { days } => due >= today && due < today + Duration::days(days),
        }
    }
}

/// Active filter state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// Groups searched
    pub categories: CategorySet,
    /// Exact status (case-insensitive; `-` and spaces count as `_`)
    pub status: Option<String>,
    /// Exact task priority
    pub priority: Option<String>,
    /// Task due window
    pub due: Option<DueWindow>,
}

impl SearchFilters {
    /// No filters, every group
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one group
    #[must_use]
    pub fn only(mut self, entity: EntityType) -> Self {
        self.categories = CategorySet::only(entity);
        self
    }

    /// With status filter
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// With priority filter
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// With due window
    #[must_use]
    pub fn with_due(mut self, due: DueWindow) -> Self {
        self.due = Some(due);
        self
    }

    /// An exact-match filter is set; category toggles alone do not count
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_some() || self.priority.is_some() || self.due.is_some()
    }

    fn status_ok(&self, status: Option<&str>) -> bool {
        match (&self.status, status) {
            (None, _) => true,
            (Some(want), Some(have)) => normalize(want) == normalize(have),
            (Some(_), None) => false,
        }
    }

    fn task_only_ok(&self) -> bool {
        self.priority.is_none() && self.due.is_none()
    }

    pub(crate) fn admits_project(&self, project: &Project) -> bool {
        self.categories.projects && self.task_only_ok() && self.status_ok(project.status.as_deref())
    }

    pub(crate) fn admits_task(&self, task: &Task, today: NaiveDate) -> bool {
        if !self.categories.tasks || !self.status_ok(Some(task.status.as_str())) {
            return false;
        }
        if let Some(want) = &self.priority {
            let Some(have) = task.priority else {
                return false;
            };
            if normalize(want) != have.as_str() {
                return false;
            }
        }
        if let Some(window) = self.due {
            if task.status.is_closed() {
                return false;
            }
            let Some(due) = task.due_date.as_deref().and_then(parse_calendar_date) else {
                return false;
            };
            if !window.contains(due, today) {
                return false;
            }
        }
        true
    }

    pub(crate) fn admits_person(&self, member: &Member) -> bool {
        self.categories.people && self.task_only_ok() && self.status_ok(member.status.as_deref())
    }

    pub(crate) fn admits_client(&self, client: &Client) -> bool {
        self.categories.clients && self.task_only_ok() && self.status_ok(client.status.as_deref())
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{TaskPriority, TaskStatus};
    use pulse_test_utils::{date, project, task_due};

    #[test]
    fn status_filter_is_case_and_separator_insensitive() {
        let filters = SearchFilters::new().with_status("In Progress");
        let task = task_due(1, "x", date(2026, 1, 1), TaskStatus::InProgress);
        assert!(filters.admits_task(&task, date(2026, 1, 1)));
        assert!(!filters.admits_project(&project(1, "p", "web", "active")));
    }

    #[test]
    fn task_only_filters_exclude_other_groups() {
        let filters = SearchFilters::new().with_priority("high");
        assert!(!filters.admits_project(&project(1, "p", "web", "active")));

        let mut task = task_due(1, "x", date(2026, 1, 1), TaskStatus::Pending);
        assert!(!filters.admits_task(&task, date(2026, 1, 1)));
        task.priority = Some(TaskPriority::High);
        assert!(filters.admits_task(&task, date(2026, 1, 1)));
        task.priority = None;
        assert!(!filters.admits_task(&task, date(2026, 1, 1)));
    }

    #[test]
    fn due_windows_skip_closed_and_undated_tasks() {
        let today = date(2026, 4, 6);
        let overdue = SearchFilters::new().with_due(DueWindow::Overdue);
        let week = SearchFilters::new().with_due(DueWindow::Upcoming { days: 7 });

        let late = task_due(1, "late", date(2026, 4, 5), TaskStatus::Pending);
        let done = task_due(2, "done", date(2026, 4, 1), TaskStatus::Completed);
        let soon = task_due(3, "soon", date(2026, 4, 12), TaskStatus::Review);
        let later = task_due(4, "later", date(2026, 4, 13), TaskStatus::Review);
        let mut undated = task_due(5, "undated", today, TaskStatus::Pending);
        undated.due_date = None;

        assert!(overdue.admits_task(&late, today));
        assert!(!overdue.admits_task(&done, today));
        assert!(week.admits_task(&soon, today));
        assert!(!week.admits_task(&later, today));
        assert!(!week.admits_task(&undated, today));
    }

    #[test]
    fn category_toggles_alone_are_not_active() {
        let filters = SearchFilters::new().only(EntityType::Client);
        assert!(!filters.is_active());
        assert!(filters.categories.contains(EntityType::Client));
        assert!(!filters.categories.contains(EntityType::Task));
    }
}
