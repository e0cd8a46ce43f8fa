//! One-shot search over a workspace snapshot
//!
//! Pure functions; [`LiveSearch`](crate::LiveSearch) adds debouncing and
//! result caching on top.

use crate::config::SearchConfig;
use crate::filter::{DueWindow, EntityType, SearchFilters};
use crate::matcher::{Matcher, Rank, Searchable};
use crate::results::{ResultGroup, SearchHit, SearchResultSet};
use chrono::NaiveDate;
use pulse_core::{SearchError, WorkspaceSnapshot};
use serde::Serialize;
use std::collections::HashSet;

/// Canned filter shortcut
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickFilter {
    /// Button label
    pub label: &'static str,
    /// Filters installed when applied; the query is cleared
    pub filters: SearchFilters,
    /// Matches right now, regardless of the current query
    pub count: usize,
}

/// Search `snapshot` for `query` under `filters`
///
/// A blank query without an exact-match filter yields an empty set.
///
/// # Errors
///
/// Returns [`SearchError::InvalidPattern`] if the query cannot be compiled.
pub fn search(
    snapshot: &WorkspaceSnapshot,
    query: &str,
    filters: &SearchFilters,
    today: NaiveDate,
    config: &SearchConfig,
) -> Result<SearchResultSet, SearchError> {
    let matcher = Matcher::new(query)?;
    if matcher.is_none() && !filters.is_active() {
        return Ok(SearchResultSet::empty(query));
    }
    let matcher = matcher.as_ref();

    let groups = vec![
        rank_group(&snapshot.projects, matcher, |p| filters.admits_project(p)),
        rank_group(&snapshot.tasks, matcher, |t| filters.admits_task(t, today)),
        rank_group(&snapshot.members, matcher, |m| filters.admits_person(m)),
        rank_group(&snapshot.clients, matcher, |c| filters.admits_client(c)),
    ];
    let total = groups.iter().map(|g| g.total).sum();
    let suggestions = matcher
        .map(|m| suggestions(snapshot, m, config.max_suggestions))
        .unwrap_or_default();

    Ok(SearchResultSet {
        query: query.to_string(),
        groups,
        total,
        suggestions,
    })
}

fn rank_group<T, F>(items: &[T], matcher: Option<&Matcher>, admit: F) -> ResultGroup
where
    T: Searchable + Clone + Into<SearchHit>,
    F: Fn(&T) -> bool,
{
    let mut ranked: Vec<(Rank, &T)> = items
        .iter()
        .filter(|item| admit(item))
        .filter_map(|item| match matcher {
            Some(m) => m.rank(item).map(|rank| (rank, item)),
            None => Some((Rank::Field, item)),
        })
        .collect();
    // Stable: ties keep snapshot order
    ranked.sort_by_key(|(rank, _)| *rank);

    let hits: Vec<SearchHit> = ranked.into_iter().map(|(_, item)| item.clone().into()).collect();
    ResultGroup {
        entity: T::ENTITY,
        total: hits.len(),
        hits,
    }
}

/// Unique searched values containing the query, prefix matches first
fn suggestions(snapshot: &WorkspaceSnapshot, matcher: &Matcher, max: usize) -> Vec<String> {
    let terms = snapshot
        .projects
        .iter()
        .flat_map(Searchable::suggestion_terms)
        .chain(snapshot.tasks.iter().flat_map(Searchable::suggestion_terms))
        .chain(snapshot.members.iter().flat_map(Searchable::suggestion_terms))
        .chain(snapshot.clients.iter().flat_map(Searchable::suggestion_terms));

    let mut seen = HashSet::new();
    let mut prefix = Vec::new();
    let mut inner = Vec::new();
    for term in terms {
        if !matcher.matches(Some(term)) || !seen.insert(term.to_lowercase()) {
            continue;
        }
        if matcher.is_prefix_of(term) {
            prefix.push(term.to_string());
        } else {
            inner.push(term.to_string());
        }
    }
    prefix.extend(inner);
    prefix.truncate(max);
    prefix
}

/// The four quick filters with live counts
#[must_use]
pub fn quick_filters(
    snapshot: &WorkspaceSnapshot,
    today: NaiveDate,
    config: &SearchConfig,
) -> Vec<QuickFilter> {
    let presets = [
        (
            "Active Projects",
            SearchFilters::new().only(EntityType::Project).with_status("active"),
        ),
        (
            "Overdue Tasks",
            SearchFilters::new()
                .only(EntityType::Task)
                .with_due(DueWindow::Overdue),
        ),
        (
            "High Priority Tasks",
            SearchFilters::new().only(EntityType::Task).with_priority("high"),
        ),
        (
            "Due This Week",
            SearchFilters::new().only(EntityType::Task).with_due(DueWindow::Upcoming {
                days: config.due_window_days,
            }),
        ),
    ];

    presets
        .into_iter()
        .map(|(label, filters)| {
            let count = search(snapshot, "", &filters, today, config).map_or(0, |set| set.total);
            QuickFilter {
                label,
                filters,
                count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pulse_test_utils::{agency_snapshot, date};

    fn run(query: &str, filters: &SearchFilters) -> SearchResultSet {
        let today = date(2026, 6, 1);
        search(
            &agency_snapshot(today),
            query,
            filters,
            today,
            &SearchConfig::default(),
        )
        .unwrap()
    }

    fn titles(set: &SearchResultSet, entity: EntityType) -> Vec<&str> {
        set.group(entity).iter().map(SearchHit::title).collect()
    }

    #[test]
    fn zero_matches_is_empty_not_an_error() {
        let set = run("xylophone", &SearchFilters::new());
        assert!(set.is_empty());
        assert!(set.suggestions.is_empty());
        assert_eq!(set.groups.len(), 4);
    }

    #[test]
    fn blank_query_without_filters_is_empty() {
        assert!(run("  ", &SearchFilters::new()).is_empty());
        assert!(run("", &SearchFilters::new().only(EntityType::Task)).is_empty());
    }

    #[test]
    fn design_query_spans_groups() {
        let set = run("design", &SearchFilters::new());
        assert_eq!(titles(&set, EntityType::Project), vec!["Website Redesign"]);
        assert_eq!(
            titles(&set, EntityType::Task),
            vec!["Design review", "Design system audit"]
        );
        assert_eq!(titles(&set, EntityType::Person), vec!["Dana Designer"]);
        assert_eq!(titles(&set, EntityType::Client), vec!["Acme Design Co"]);
        assert_eq!(set.total, 5);
    }

    #[test]
    fn name_prefix_ranks_before_other_name_matches() {
        let set = run("de", &SearchFilters::new().only(EntityType::Person));
        assert_eq!(
            titles(&set, EntityType::Person),
            vec!["Devon Developer", "Dana Designer"]
        );
    }

    #[test]
    fn filters_and_with_text() {
        let filters = SearchFilters::new().with_status("active");
        let set = run("web", &filters);
        assert_eq!(titles(&set, EntityType::Project), vec!["Website Redesign"]);
        assert!(set.group(EntityType::Task).is_empty());
    }

    #[test]
    fn suggestions_prefix_first_unique_and_capped() {
        let set = run("de", &SearchFilters::new());
        assert!(set.suggestions.len() <= 8);
        assert_eq!(set.suggestions[0], "Design review");
        let unique: HashSet<_> = set.suggestions.iter().map(|s| s.to_lowercase()).collect();
        assert_eq!(unique.len(), set.suggestions.len());
    }

    #[test]
    fn suggestions_come_from_every_searched_field() {
        let set = run("u2@studio", &SearchFilters::new());
        assert_eq!(titles(&set, EntityType::Person), vec!["Devon Developer"]);
        assert_eq!(set.suggestions, vec!["u2@studio.test"]);

        let set = run("contact 2", &SearchFilters::new());
        assert_eq!(titles(&set, EntityType::Client), vec!["Globex"]);
        assert_eq!(set.suggestions, vec!["Contact 2"]);

        let set = run("urgent", &SearchFilters::new());
        assert_eq!(titles(&set, EntityType::Task), vec!["API integration"]);
        assert_eq!(set.suggestions, vec!["urgent"]);
    }

    #[test]
    fn quick_filter_counts_ignore_the_query() {
        let today = date(2026, 6, 1);
        let filters = quick_filters(&agency_snapshot(today), today, &SearchConfig::default());
        let counts: Vec<(&str, usize)> = filters.iter().map(|q| (q.label, q.count)).collect();
        assert_eq!(
            counts,
            vec![
                ("Active Projects", 2),
                ("Overdue Tasks", 1),
                ("High Priority Tasks", 1),
                ("Due This Week", 2),
            ]
        );
    }
}
