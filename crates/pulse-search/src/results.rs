//! Search result sets and grouped views

use crate::filter::EntityType;
use pulse_core::{Client, Member, Project, Task};
use serde::Serialize;

/// One matched entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "entity", rename_all = "snake_case")]
pub enum SearchHit {
    /// Project
    Project(Project),
    /// Task
    Task(Task),
    /// Team member
    Person(Member),
    /// Client
    Client(Client),
}

impl SearchHit {
    /// Group of the hit
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Project(_) => EntityType::Project,
            Self::Task(_) => EntityType::Task,
            Self::Person(_) => EntityType::Person,
            Self::Client(_) => EntityType::Client,
        }
    }

    /// Entity ID as text
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::Project(p) => p.id.to_string(),
            Self::Task(t) => t.id.to_string(),
            Self::Person(m) => m.id.clone(),
            Self::Client(c) => c.id.to_string(),
        }
    }

    /// Display title
    #[must_use]
    pub fn title(&self) -> &str {
        let name = match self {
            Self::Project(p) => p.name.as_deref(),
            Self::Task(t) => t.name.as_deref(),
            Self::Person(m) => m.name.as_deref(),
            Self::Client(c) => c.company_name.as_deref(),
        };
        name.unwrap_or("(untitled)")
    }
}

impl From<Project> for SearchHit {
    fn from(value: Project) -> Self {
        Self::Project(value)
    }
}

impl From<Task> for SearchHit {
    fn from(value: Task) -> Self {
        Self::Task(value)
    }
}

impl From<Member> for SearchHit {
    fn from(value: Member) -> Self {
        Self::Person(value)
    }
}

impl From<Client> for SearchHit {
    fn from(value: Client) -> Self {
        Self::Client(value)
    }
}

/// Matches of one entity group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultGroup {
    /// Group
    pub entity: EntityType,
    /// Ranked hits (possibly capped)
    pub hits: Vec<SearchHit>,
    /// Matches before capping
    pub total: usize,
}

/// Presentation of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultView {
    /// Dropdown: 3 projects, 2 tasks, 2 people, 2 clients
    Compact,
    /// Full results page, uncapped
    Full,
}

impl ResultView {
    fn cap(self, entity: EntityType) -> usize {
        match (self, entity) {
            (Self::Full, _) => usize::MAX,
            (Self::Compact, EntityType::Project) => 3,
            (Self::Compact, _) => 2,
        }
    }
}

/// Outcome of one recompute
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchResultSet {
    /// Query the set was computed for
    pub query: String,
    /// One group per entity type, in display order
    pub groups: Vec<ResultGroup>,
    /// Matches across every group
    pub total: usize,
    /// Suggested terms, at most the configured cap
    pub suggestions: Vec<String>,
}

impl SearchResultSet {
    /// Set with four empty groups
    #[must_use]
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            groups: EntityType::ALL
                .iter()
                .map(|entity| ResultGroup {
                    entity: *entity,
                    hits: Vec::new(),
                    total: 0,
                })
                .collect(),
            total: 0,
            suggestions: Vec::new(),
        }
    }

    /// No matches in any group
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Hits of one group
    #[must_use]
    pub fn group(&self, entity: EntityType) -> &[SearchHit] {
        self.groups
            .iter()
            .find(|g| g.entity == entity)
            .map_or(&[], |g| g.hits.as_slice())
    }

    /// Non-empty groups in display order, capped for `view`
    #[must_use]
    pub fn grouped(&self, view: ResultView) -> Vec<ResultGroup> {
        self.groups
            .iter()
            .filter(|g| !g.hits.is_empty())
            .map(|g| ResultGroup {
                entity: g.entity,
                hits: g.hits.iter().take(view.cap(g.entity)).cloned().collect(),
                total: g.total,
            })
            .collect()
    }
}
