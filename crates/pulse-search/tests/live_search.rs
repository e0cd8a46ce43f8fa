//! Live search over loader-shaped JSON

use pulse_core::{CollabBus, WorkspaceSnapshot};
use pulse_search::{EntityType, LiveSearch, ResultView, SearchConfig};
use pulse_test_utils::{clock_on, date};
use std::sync::Arc;

const WORKSPACE: &str = r#"{
  "projects": [
    {"id": 1, "name": "Portal v1", "type": "web", "status": "active"},
    {"id": 2, "name": "Portal v2", "type": "web", "status": "active"},
    {"id": 3, "name": "Portal v3", "type": "web", "status": "planning"},
    {"id": 4, "name": "Client Portal", "type": "web", "status": "active"},
    {"id": 5, "name": "Annual report", "description": "Print portal handoff", "status": "active"}
  ],
  "tasks": [
    {"id": 10, "name": "Portal login", "status": "in-progress", "priority": "high",
     "due_date": "2026-06-03"},
    {"id": 11, "name": "Fix portal CSS", "status": "todo", "due_date": "2026-05-20T09:00:00Z"},
    {"id": 12, "name": "Portal QA", "status": "done"}
  ],
  "members": [
    {"id": "m1", "name": "Pat Porter", "role": "Producer"}
  ],
  "clients": [
    {"id": 1, "company_name": "Portals Inc", "industry": "Software"}
  ]
}"#;

fn engine() -> LiveSearch {
    let today = date(2026, 6, 1);
    let search = LiveSearch::new(
        SearchConfig::default().with_debounce_ms(250),
        CollabBus::new(),
        Arc::new(clock_on(today)),
    );
    let snapshot = WorkspaceSnapshot::from_json(WORKSPACE).unwrap();
    search.set_collections(Arc::new(snapshot));
    search
}

#[tokio::test(start_paused = true)]
async fn compact_and_full_views() {
    let search = engine();
    search.set_query("portal");
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    let results = search.results();
    let full = results.grouped(ResultView::Full);
    let compact = results.grouped(ResultView::Compact);

    let counts: Vec<(EntityType, usize, usize)> = full
        .iter()
        .zip(&compact)
        .map(|(f, c)| (f.entity, f.hits.len(), c.hits.len()))
        .collect();
    assert_eq!(
        counts,
        vec![
            (EntityType::Project, 5, 3),
            (EntityType::Task, 3, 2),
            (EntityType::Client, 1, 1),
        ]
    );

    // Prefix matches first, description-only match last
    let projects: Vec<&str> = full[0].hits.iter().map(|h| h.title()).collect();
    assert_eq!(
        projects,
        vec!["Portal v1", "Portal v2", "Portal v3", "Client Portal", "Annual report"]
    );
    assert_eq!(results.total, 9);
}

#[tokio::test(start_paused = true)]
async fn quick_filters_count_loader_dates() {
    let search = engine();
    search.flush().await;

    let counts: Vec<(&str, usize)> = search
        .quick_filters()
        .iter()
        .map(|q| (q.label, q.count))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("Active Projects", 4),
            ("Overdue Tasks", 1),
            ("High Priority Tasks", 1),
            ("Due This Week", 1),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn regex_syntax_in_queries_is_literal() {
    let search = engine();
    search.set_query("portal v[12]");
    search.flush().await;
    assert!(search.results().is_empty());
    assert!(search.suggestions().is_empty());
}
