//! Text matching and per-entity field lists

use crate::filter::EntityType;
use pulse_core::{Client, Member, Project, SearchError, Task};
use regex::{Regex, RegexBuilder};

/// How well an entity matched; lower sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    /// Name starts with the query
    NamePrefix,
    /// Name contains the query
    Name,
    /// Another field contains the query
    Field,
}

/// Case-insensitive literal substring matcher
///
/// The query is escaped, so regex metacharacters match themselves.
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: Regex,
}

impl Matcher {
    /// Matcher for `query`; `None` when the query is blank
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidPattern`] if the escaped query does not
    /// compile (e.g. it exceeds the regex size limit).
    pub fn new(query: &str) -> Result<Option<Self>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .map_err(|err| SearchError::InvalidPattern(err.to_string()))?;
        Ok(Some(Self { pattern }))
    }

    /// Field contains the query; missing fields never match
    #[must_use]
    pub fn matches(&self, field: Option<&str>) -> bool {
        field.is_some_and(|text| self.pattern.is_match(text))
    }

    /// Field starts with the query
    #[must_use]
    pub fn is_prefix_of(&self, field: &str) -> bool {
        self.pattern.find(field).is_some_and(|m| m.start() == 0)
    }

    /// Rank an entity, or `None` if no searchable field matches
    #[must_use]
    pub fn rank<T: Searchable>(&self, entity: &T) -> Option<Rank> {
        if let Some(name) = entity.name() {
            if self.is_prefix_of(name) {
                return Some(Rank::NamePrefix);
            }
            if self.matches(Some(name)) {
                return Some(Rank::Name);
            }
        }
        entity
            .other_fields()
            .into_iter()
            .any(|field| self.matches(field))
            .then_some(Rank::Field)
    }
}

/// An entity the search engine can match
pub trait Searchable {
    /// Group the entity belongs to
    const ENTITY: EntityType;

    /// Primary name field
    fn name(&self) -> Option<&str>;

    /// Remaining searchable fields
    fn other_fields(&self) -> [Option<&str>; 3];

    /// Every searched value, offered as suggestions
    fn suggestion_terms(&self) -> Vec<&str> {
        std::iter::once(self.name())
            .chain(self.other_fields())
            .flatten()
            .collect()
    }
}

impl Searchable for Project {
    const ENTITY: EntityType = EntityType::Project;

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn other_fields(&self) -> [Option<&str>; 3] {
        [
            self.description.as_deref(),
            self.project_type.as_deref(),
            self.status.as_deref(),
        ]
    }
}

impl Searchable for Task {
    const ENTITY: EntityType = EntityType::Task;

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn other_fields(&self) -> [Option<&str>; 3] {
        [
            self.description.as_deref(),
            Some(self.status.as_str()),
            self.priority.as_ref().map(|p| p.as_str()),
        ]
    }
}

impl Searchable for Member {
    const ENTITY: EntityType = EntityType::Person;

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn other_fields(&self) -> [Option<&str>; 3] {
        [
            self.email.as_deref(),
            self.role.as_deref(),
            self.department.as_deref(),
        ]
    }
}

impl Searchable for Client {
    const ENTITY: EntityType = EntityType::Client;

    fn name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    fn other_fields(&self) -> [Option<&str>; 3] {
        [
            self.contact_name.as_deref(),
            self.email.as_deref(),
            self.industry.as_deref(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_test_utils::{client, member, project};

    #[test]
    fn blank_query_has_no_matcher() {
        assert!(Matcher::new("   ").unwrap().is_none());
    }

    #[test]
    fn metacharacters_match_literally() {
        let matcher = Matcher::new("c++ (v2)").unwrap().unwrap();
        assert!(matcher.matches(Some("Port to C++ (v2) runtime")));
        assert!(!matcher.matches(Some("cc (v2)")));
        assert!(!matcher.matches(None));
    }

    #[test]
    fn ranks_prefix_then_name_then_field() {
        let matcher = Matcher::new("web").unwrap().unwrap();
        assert_eq!(
            matcher.rank(&project(1, "Website", "branding", "active")),
            Some(Rank::NamePrefix)
        );
        assert_eq!(
            matcher.rank(&project(2, "New Website", "branding", "active")),
            Some(Rank::Name)
        );
        assert_eq!(
            matcher.rank(&project(3, "Storefront", "web", "active")),
            Some(Rank::Field)
        );
        assert_eq!(matcher.rank(&project(4, "Logo", "branding", "active")), None);
    }

    #[test]
    fn clients_are_named_by_company() {
        let matcher = Matcher::new("acme").unwrap().unwrap();
        assert_eq!(
            matcher.rank(&client(1, "ACME Corp", "Retail")),
            Some(Rank::NamePrefix)
        );
        let person = member("u9", "Ana", "Designer", "Design");
        assert_eq!(
            Matcher::new("studio.test").unwrap().unwrap().rank(&person),
            Some(Rank::Field)
        );
    }
}
