//! Titles, messages, priorities and actions per notification kind

use chrono::{DateTime, Utc};
use pulse_core::{
    ActionKind, EntityRef, NotificationAction, NotificationData, NotificationId, NotificationRecord,
    Priority,
};

/// Build a fresh, unread record from a payload
#[must_use]
pub fn build_record(data: NotificationData, now: DateTime<Utc>) -> NotificationRecord {
    NotificationRecord {
        id: NotificationId::new(),
        kind: data.kind(),
        title: title(&data),
        message: message(&data),
        priority: priority(&data),
        actions: actions(&data),
        read: false,
        dismissed: false,
        created_at: now,
        data,
    }
}

/// Title line
#[must_use]
pub fn title(data: &NotificationData) -> String {
    match data {
        NotificationData::TaskAssigned { .. } => "New Task Assigned".into(),
        NotificationData::TaskUpdated { .. } => "Task Updated".into(),
        NotificationData::TaskCompleted { .. } => "Task Completed".into(),
        NotificationData::DueDateReminder { days_until_due, .. } => {
            if *days_until_due == 1 {
                "Task Due Tomorrow".into()
            } else {
                format!("Task Due in {days_until_due} Days")
            }
        }
        NotificationData::OverdueAlert { .. } => "Task Overdue".into(),
        NotificationData::ProjectUpdate { .. } => "Project Updated".into(),
        NotificationData::ProjectDeadline { days_until_due, .. } => {
            if *days_until_due == 1 {
                "Project Deadline Tomorrow".into()
            } else {
                format!("Project Deadline in {days_until_due} Days")
            }
        }
        NotificationData::CommentAdded { .. } => "New Comment".into(),
        NotificationData::Mention { .. } => "You Were Mentioned".into(),
        NotificationData::TeamUpdate { .. } => "Team Update".into(),
        NotificationData::BudgetAlert { .. } => "Budget Alert".into(),
        NotificationData::System { .. } => "System Message".into(),
    }
}

/// Body text
#[must_use]
pub fn message(data: &NotificationData) -> String {
    match data {
        NotificationData::TaskAssigned {
            task_name,
            assigned_by,
            project_name,
            ..
        } => {
            let mut text = match assigned_by {
                Some(who) => format!("{who} assigned you \"{task_name}\""),
                None => format!("You were assigned \"{task_name}\""),
            };
            if let Some(project) = project_name {
                text.push_str(&format!(" in {project}"));
            }
            text
        }
        NotificationData::TaskUpdated {
            task_name,
            updated_by,
            changes,
            ..
        } => {
            let mut text = match updated_by {
                Some(who) => format!("\"{task_name}\" was updated by {who}"),
                None => format!("\"{task_name}\" was updated"),
            };
            if !changes.is_empty() {
                text.push_str(&format!(" ({})", changes.join(", ")));
            }
            text
        }
        NotificationData::TaskCompleted {
            task_name,
            completed_by,
            ..
        } => match completed_by {
            Some(who) => format!("\"{task_name}\" was completed by {who}"),
            None => format!("\"{task_name}\" was completed"),
        },
        NotificationData::DueDateReminder {
            task_name,
            due_date,
            ..
        } => format!("\"{task_name}\" is due on {}", due_date.format("%b %-d, %Y")),
        NotificationData::OverdueAlert {
            task_name,
            days_overdue,
            ..
        } => format!("\"{task_name}\" is {} overdue", days(*days_overdue)),
        NotificationData::ProjectUpdate {
            project_name,
            summary,
            ..
        } => format!("{project_name}: {summary}"),
        NotificationData::ProjectDeadline {
            project_name,
            end_date,
            ..
        } => format!("\"{project_name}\" ends on {}", end_date.format("%b %-d, %Y")),
        NotificationData::CommentAdded {
            author, excerpt, ..
        } => format!("{author} commented: {excerpt}"),
        NotificationData::Mention {
            author, excerpt, ..
        } => format!("{author} mentioned you: {excerpt}"),
        NotificationData::TeamUpdate {
            member_name,
            message,
        } => format!("{member_name}: {message}"),
        NotificationData::BudgetAlert {
            project_name,
            percent_used,
            ..
        } => format!("\"{project_name}\" has used {percent_used:.0}% of its budget"),
        NotificationData::System { message } => message.clone(),
    }
}

/// Default priority for a payload
#[must_use]
pub fn priority(data: &NotificationData) -> Priority {
    match data {
        NotificationData::TaskAssigned { .. } | NotificationData::ProjectUpdate { .. } => {
            Priority::Medium
        }
        NotificationData::TaskUpdated { .. }
        | NotificationData::TaskCompleted { .. }
        | NotificationData::CommentAdded { .. }
        | NotificationData::TeamUpdate { .. }
        | NotificationData::System { .. } => Priority::Low,
        NotificationData::DueDateReminder { days_until_due, .. }
        | NotificationData::ProjectDeadline { days_until_due, .. } => {
            if *days_until_due <= 1 {
                Priority::High
            } else {
                Priority::Medium
            }
        }
        NotificationData::OverdueAlert { .. } | NotificationData::Mention { .. } => Priority::High,
        NotificationData::BudgetAlert { percent_used, .. } => {
            if *percent_used >= 100.0 {
                Priority::High
            } else {
                Priority::Medium
            }
        }
    }
}

/// Ordered action buttons
#[must_use]
pub fn actions(data: &NotificationData) -> Vec<NotificationAction> {
    let view_task = |id: u64| NotificationAction::new("View Task", ActionKind::OpenTask, id);
    let view_project =
        |id: u64| NotificationAction::new("View Project", ActionKind::OpenProject, id);
    let complete = |id: u64| NotificationAction::new("Mark Complete", ActionKind::CompleteTask, id);

    match data {
        NotificationData::TaskAssigned { task_id, .. }
        | NotificationData::TaskUpdated { task_id, .. }
        | NotificationData::TaskCompleted { task_id, .. } => vec![view_task(*task_id)],
        NotificationData::DueDateReminder { task_id, .. }
        | NotificationData::OverdueAlert { task_id, .. } => {
            vec![view_task(*task_id), complete(*task_id)]
        }
        NotificationData::ProjectUpdate { project_id, .. }
        | NotificationData::ProjectDeadline { project_id, .. }
        | NotificationData::BudgetAlert { project_id, .. } => vec![view_project(*project_id)],
        NotificationData::CommentAdded { entity, .. }
        | NotificationData::Mention { entity, .. } => {
            let view = match entity {
                EntityRef::Task(id) => NotificationAction::new("View", ActionKind::OpenTask, id),
                EntityRef::Project(id) => {
                    NotificationAction::new("View", ActionKind::OpenProject, id)
                }
            };
            let target = match entity {
                EntityRef::Task(id) | EntityRef::Project(id) => *id,
            };
            vec![NotificationAction::new("Reply", ActionKind::Reply, target), view]
        }
        NotificationData::TeamUpdate { .. } | NotificationData::System { .. } => Vec::new(),
    }
}

/// Leading part of a text, cut on a character boundary
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", trimmed[..cut].trim_end()),
        None => trimmed.to_string(),
    }
}

fn days(n: i64) -> String {
    if n == 1 {
        "1 day".into()
    } else {
        format!("{n} days")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use pulse_core::NotificationKind;

    fn due(days_until_due: i64) -> NotificationData {
        NotificationData::DueDateReminder {
            task_id: 1,
            task_name: "Design review".into(),
            days_until_due,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
        }
    }

    #[test]
    fn due_reminder_wording_and_priority() {
        let record = build_record(due(1), Utc::now());
        assert_eq!(record.kind, NotificationKind::DueDateReminder);
        assert_eq!(record.title, "Task Due Tomorrow");
        assert_eq!(record.message, "\"Design review\" is due on Mar 3, 2026");
        assert_eq!(record.priority, Priority::High);
        assert!(!record.read);
        assert!(!record.dismissed);

        let later = build_record(due(3), Utc::now());
        assert_eq!(later.title, "Task Due in 3 Days");
        assert_eq!(later.priority, Priority::Medium);
    }

    #[test]
    fn due_and_overdue_offer_completion() {
        let labels: Vec<_> = actions(&due(1)).into_iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["View Task", "Mark Complete"]);

        let overdue = NotificationData::OverdueAlert {
            task_id: 4,
            task_name: "API".into(),
            days_overdue: 2,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        };
        assert_eq!(message(&overdue), "\"API\" is 2 days overdue");
        assert_eq!(priority(&overdue), Priority::High);
        assert_eq!(actions(&overdue)[1].kind, ActionKind::CompleteTask);
    }

    #[test]
    fn comment_actions_reply_then_view_by_entity() {
        let data = NotificationData::CommentAdded {
            entity: EntityRef::Project(8),
            author: "Ana".into(),
            excerpt: "Looks good".into(),
        };
        let actions = actions(&data);
        assert_eq!(actions[0], NotificationAction::new("Reply", ActionKind::Reply, 8));
        assert_eq!(actions[1], NotificationAction::new("View", ActionKind::OpenProject, 8));
        assert_eq!(priority(&data), Priority::Low);
    }

    #[test]
    fn budget_priority_threshold() {
        let at = |percent_used| NotificationData::BudgetAlert {
            project_id: 1,
            project_name: "Site".into(),
            percent_used,
        };
        assert_eq!(priority(&at(99.5)), Priority::Medium);
        assert_eq!(priority(&at(100.0)), Priority::High);
        assert_eq!(message(&at(112.4)), "\"Site\" has used 112% of its budget");
    }

    #[test]
    fn team_and_system_have_no_actions() {
        assert!(actions(&NotificationData::System {
            message: "hi".into()
        })
        .is_empty());
        assert!(actions(&NotificationData::TeamUpdate {
            member_name: "Ana".into(),
            message: "joined".into()
        })
        .is_empty());
    }

    #[test]
    fn excerpt_cuts_on_char_boundary() {
        assert_eq!(excerpt("  short  ", 10), "short");
        assert_eq!(excerpt("héllo wörld", 5), "héllo…");
    }
}
