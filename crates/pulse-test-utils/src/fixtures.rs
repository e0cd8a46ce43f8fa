//! Workspace snapshot fixtures

use chrono::NaiveDate;
use pulse_core::{
    Client, ManualClock, Member, Project, Task, TaskPriority, TaskStatus, WorkspaceSnapshot,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}

/// Manual clock at noon UTC of `day`
pub fn clock_on(day: NaiveDate) -> ManualClock {
    ManualClock::at_date(day)
}

pub fn task_due(id: u64, name: &str, due: NaiveDate, status: TaskStatus) -> Task {
    Task {
        id,
        project_id: Some(1),
        name: Some(name.to_string()),
        status,
        priority: Some(TaskPriority::Medium),
        due_date: Some(due.format("%Y-%m-%d").to_string()),
        ..Task::default()
    }
}

pub fn project(id: u64, name: &str, project_type: &str, status: &str) -> Project {
    Project {
        id,
        name: Some(name.to_string()),
        project_type: Some(project_type.to_string()),
        status: Some(status.to_string()),
        ..Project::default()
    }
}

pub fn member(id: &str, name: &str, role: &str, department: &str) -> Member {
    Member {
        id: id.to_string(),
        name: Some(name.to_string()),
        email: Some(format!("{id}@studio.test")),
        role: Some(role.to_string()),
        department: Some(department.to_string()),
        status: Some("active".to_string()),
    }
}

pub fn client(id: u64, company: &str, industry: &str) -> Client {
    Client {
        id,
        company_name: Some(company.to_string()),
        contact_name: Some(format!("Contact {id}")),
        industry: Some(industry.to_string()),
        status: Some("active".to_string()),
        ..Client::default()
    }
}

pub fn snapshot_with_tasks(tasks: Vec<Task>) -> WorkspaceSnapshot {
    WorkspaceSnapshot {
        tasks,
        ..WorkspaceSnapshot::default()
    }
}

/// A small agency workspace, dated relative to `today`
pub fn agency_snapshot(today: NaiveDate) -> WorkspaceSnapshot {
    let days = |n: i64| today + chrono::Duration::days(n);

    let mut design_review = task_due(11, "Design review", days(1), TaskStatus::Pending);
    design_review.description = Some("Review homepage mockups with the client".into());
    design_review.priority = Some(TaskPriority::High);
    design_review.assignee_id = Some("u1".into());

    let mut api = task_due(12, "API integration", days(-2), TaskStatus::InProgress);
    api.project_id = Some(2);
    api.priority = Some(TaskPriority::Urgent);

    let mut copy = task_due(13, "Write launch copy", days(5), TaskStatus::Review);
    copy.priority = Some(TaskPriority::Low);

    let done = task_due(14, "Design system audit", days(-1), TaskStatus::Completed);

    let mut website = project(1, "Website Redesign", "web", "active");
    website.description = Some("Full redesign of the marketing site".into());
    website.client_id = Some(1);
    website.end_date = Some(days(3).format("%Y-%m-%d").to_string());
    website.budget = Some(20_000.0);
    website.spent = Some(12_500.0);

    let mut app = project(2, "Mobile App", "mobile", "active");
    app.client_id = Some(2);

    WorkspaceSnapshot {
        projects: vec![
            website,
            app,
            project(3, "Brand Refresh", "branding", "completed"),
        ],
        tasks: vec![design_review, api, copy, done],
        members: vec![
            member("u1", "Dana Designer", "Designer", "Design"),
            member("u2", "Devon Developer", "Developer", "Engineering"),
            member("u3", "Morgan Manager", "Project Manager", "Operations"),
        ],
        clients: vec![
            client(1, "Acme Design Co", "Retail"),
            client(2, "Globex", "Technology"),
        ],
    }
}
