//! Due-date scan
//!
//! Turns a workspace snapshot into due-soon, overdue and project-deadline
//! candidates for one calendar day. Deduplication against existing records
//! happens in the notification center.

use chrono::NaiveDate;
use pulse_core::{
    parse_calendar_date, NotificationData, NotificationKind, NotificationRecord, ScanError,
    TaskStatus, WorkspaceSnapshot,
};
use serde::Serialize;
use tracing::debug;

/// Day offsets that trigger a due-soon reminder
pub const REMINDER_DAYS: [i64; 2] = [1, 3];

/// Outcome of one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Another scan was running; nothing was done
    pub skipped_busy: bool,
    /// Open tasks with a due date
    pub tasks_checked: usize,
    /// Open projects with an end date
    pub projects_checked: usize,
    /// Due-soon reminders created
    pub reminders: usize,
    /// Overdue alerts created
    pub overdue: usize,
    /// Project deadline reminders created
    pub deadlines: usize,
    /// Candidates already notified today
    pub duplicates: usize,
    /// Candidates whose category is disabled
    pub disabled: usize,
    /// Entities skipped for unparseable dates
    pub malformed: usize,
}

impl ScanReport {
    /// Notifications created
    #[must_use]
    pub fn created(&self) -> usize {
        self.reminders + self.overdue + self.deadlines
    }

    pub(crate) fn busy() -> Self {
        Self {
            skipped_busy: true,
            ..Self::default()
        }
    }

    pub(crate) fn count_created(&mut self, kind: NotificationKind) {
        match kind {
            NotificationKind::DueDateReminder => self.reminders += 1,
            NotificationKind::OverdueAlert => self.overdue += 1,
            NotificationKind::ProjectDeadline => self.deadlines += 1,
            _ => {}
        }
    }
}

/// Scan candidates for `today`, in snapshot order (tasks, then projects)
pub fn candidates(
    snapshot: &WorkspaceSnapshot,
    today: NaiveDate,
    report: &mut ScanReport,
) -> Vec<NotificationData> {
    let mut out = Vec::new();

    for task in &snapshot.tasks {
        let Some(raw) = task.due_date.as_deref() else {
            continue;
        };
        if task.status == TaskStatus::Completed {
            continue;
        }
        report.tasks_checked += 1;
        let due = match parse_date("task", task.id, raw) {
            Ok(due) => due,
            Err(err) => {
                debug!(error = %err, "skipping task in scan");
                report.malformed += 1;
                continue;
            }
        };
        let task_name = task
            .name
            .clone()
            .unwrap_or_else(|| format!("Task #{}", task.id));

        let delta = (due - today).num_days();
        if REMINDER_DAYS.contains(&delta) {
            out.push(NotificationData::DueDateReminder {
                task_id: task.id,
                task_name,
                days_until_due: delta,
                due_date: due,
            });
        } else if delta < 0 {
            out.push(NotificationData::OverdueAlert {
                task_id: task.id,
                task_name,
                days_overdue: -delta,
                due_date: due,
            });
        }
    }

    for project in &snapshot.projects {
        let Some(raw) = project.end_date.as_deref() else {
            continue;
        };
        let closed = project.status.as_deref().is_some_and(|s| {
            s.eq_ignore_ascii_case("completed") || s.eq_ignore_ascii_case("cancelled")
        });
        if closed {
            continue;
        }
        report.projects_checked += 1;
        let end = match parse_date("project", project.id, raw) {
            Ok(end) => end,
            Err(err) => {
                debug!(error = %err, "skipping project in scan");
                report.malformed += 1;
                continue;
            }
        };

        let delta = (end - today).num_days();
        if REMINDER_DAYS.contains(&delta) {
            out.push(NotificationData::ProjectDeadline {
                project_id: project.id,
                project_name: project
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Project #{}", project.id)),
                days_until_due: delta,
                end_date: end,
            });
        }
    }

    out
}

/// Same scan notification already among `records`
///
/// Only records created on `today` (by `created_on`) count, so alerts recur
/// on later days. Payloads that are not scan output never match.
pub fn already_notified<F>(
    data: &NotificationData,
    records: &[NotificationRecord],
    today: NaiveDate,
    created_on: F,
) -> bool
where
    F: Fn(&NotificationRecord) -> NaiveDate,
{
    records
        .iter()
        .filter(|r| created_on(r) == today)
        .any(|r| same_scan_key(&r.data, data))
}

fn same_scan_key(a: &NotificationData, b: &NotificationData) -> bool {
    match (a, b) {
        (
            NotificationData::DueDateReminder {
                task_id: t1,
                days_until_due: d1,
                ..
            },
            NotificationData::DueDateReminder {
                task_id: t2,
                days_until_due: d2,
                ..
            },
        )
        | (
            NotificationData::ProjectDeadline {
                project_id: t1,
                days_until_due: d1,
                ..
            },
            NotificationData::ProjectDeadline {
                project_id: t2,
                days_until_due: d2,
                ..
            },
        ) => t1 == t2 && d1 == d2,
        (
            NotificationData::OverdueAlert { task_id: t1, .. },
            NotificationData::OverdueAlert { task_id: t2, .. },
        ) => t1 == t2,
        _ => false,
    }
}

fn parse_date(entity: &'static str, id: u64, raw: &str) -> Result<NaiveDate, ScanError> {
    parse_calendar_date(raw).ok_or_else(|| ScanError::MalformedDate {
        entity,
        id,
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::build_record;
    use chrono::Utc;
    use pulse_core::{Project, Task};
    use pulse_test_utils::{date, snapshot_with_tasks, task_due};

    #[test]
    fn classifies_by_day_delta() {
        let today = date(2026, 3, 10);
        let snapshot = snapshot_with_tasks(vec![
            task_due(1, "tomorrow", date(2026, 3, 11), TaskStatus::Pending),
            task_due(2, "in two", date(2026, 3, 12), TaskStatus::Pending),
            task_due(3, "in three", date(2026, 3, 13), TaskStatus::InProgress),
            task_due(4, "late", date(2026, 3, 8), TaskStatus::Review),
            task_due(5, "done", date(2026, 3, 1), TaskStatus::Completed),
            task_due(6, "today", date(2026, 3, 10), TaskStatus::Pending),
        ]);
        let mut report = ScanReport::default();
        let found = candidates(&snapshot, today, &mut report);

        let summary: Vec<(NotificationKind, Option<u64>)> =
            found.iter().map(|d| (d.kind(), d.task_id())).collect();
        assert_eq!(
            summary,
            vec![
                (NotificationKind::DueDateReminder, Some(1)),
                (NotificationKind::DueDateReminder, Some(3)),
                (NotificationKind::OverdueAlert, Some(4)),
            ]
        );
        assert!(matches!(
            found[2],
            NotificationData::OverdueAlert { days_overdue: 2, .. }
        ));
        assert_eq!(report.tasks_checked, 5);
    }

    #[test]
    fn malformed_dates_are_skipped_individually() {
        let today = date(2026, 3, 10);
        let mut bad = task_due(1, "bad", today, TaskStatus::Pending);
        bad.due_date = Some("next friday".into());
        let good = task_due(2, "good", date(2026, 3, 11), TaskStatus::Pending);
        let no_date = Task {
            id: 3,
            ..Task::default()
        };

        let mut report = ScanReport::default();
        let found = candidates(&snapshot_with_tasks(vec![bad, good, no_date]), today, &mut report);
        assert_eq!(found.len(), 1);
        assert_eq!(report.malformed, 1);
        assert_eq!(report.tasks_checked, 2);
    }

    #[test]
    fn open_projects_get_deadline_reminders() {
        let today = date(2026, 3, 10);
        let mut snapshot = WorkspaceSnapshot::new();
        snapshot.projects = vec![
            Project {
                id: 1,
                name: Some("Site".into()),
                status: Some("active".into()),
                end_date: Some("2026-03-13".into()),
                ..Project::default()
            },
            Project {
                id: 2,
                status: Some("Completed".into()),
                end_date: Some("2026-03-11".into()),
                ..Project::default()
            },
        ];
        let mut report = ScanReport::default();
        let found = candidates(&snapshot, today, &mut report);
        assert_eq!(found.len(), 1);
        assert!(matches!(
            found[0],
            NotificationData::ProjectDeadline {
                project_id: 1,
                days_until_due: 3,
                ..
            }
        ));
        assert_eq!(report.projects_checked, 1);
    }

    #[test]
    fn dedup_only_counts_records_from_today() {
        let today = date(2026, 3, 10);
        let overdue = |days_overdue| NotificationData::OverdueAlert {
            task_id: 7,
            task_name: "late".into(),
            days_overdue,
            due_date: date(2026, 3, 8),
        };
        let records = vec![build_record(overdue(1), Utc::now())];

        assert!(already_notified(&overdue(2), &records, today, |_| today));
        assert!(!already_notified(&overdue(2), &records, today, |_| date(2026, 3, 9)));

        let reminder = NotificationData::DueDateReminder {
            task_id: 7,
            task_name: "late".into(),
            days_until_due: 1,
            due_date: date(2026, 3, 11),
        };
        assert!(!already_notified(&reminder, &records, today, |_| today));
    }
}
