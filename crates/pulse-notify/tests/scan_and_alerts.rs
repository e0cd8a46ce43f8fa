//! End-to-end notification flows over the shared fixtures

use pulse_core::{
    AlertSink, Clock, CollabBus, NotificationCategory, NotificationKind, NotificationSettings,
    Priority, SharedSnapshot, SnapshotProvider,
};
use pulse_notify::{JsonFileSettingsStore, NotificationCenter, NotificationConfig, SettingsStore};
use pulse_test_utils::{agency_snapshot, clock_on, date, RecordingAlertSink};
use std::sync::Arc;
use std::time::Duration;

fn center(
    store: Arc<dyn SettingsStore>,
    alerts: Option<Arc<dyn AlertSink>>,
) -> NotificationCenter {
    let today = date(2026, 6, 1);
    let clock: Arc<dyn Clock> = Arc::new(clock_on(today));
    let snapshot: Arc<dyn SnapshotProvider> = Arc::new(SharedSnapshot::new(agency_snapshot(today)));
    NotificationCenter::new(
        NotificationConfig::default(),
        CollabBus::new(),
        clock,
        snapshot,
        store,
        alerts,
    )
}

#[tokio::test(start_paused = true)]
async fn agency_scan_creates_and_alerts() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileSettingsStore::new(dir.path().join("settings.json")));
    let sink = Arc::new(RecordingAlertSink::granted());
    let center = center(store, Some(Arc::clone(&sink) as Arc<dyn AlertSink>));

    let report = center.scan();
    assert_eq!(report.reminders, 1);
    assert_eq!(report.overdue, 1);
    assert_eq!(report.deadlines, 1);
    assert_eq!(report.tasks_checked, 3);

    let kinds: Vec<NotificationKind> = center.list().iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::ProjectDeadline,
            NotificationKind::OverdueAlert,
            NotificationKind::DueDateReminder,
        ]
    );

    tokio::time::sleep(Duration::from_secs(6)).await;
    let shown = sink.shown();
    assert_eq!(shown.len(), 3);

    // Only the medium-priority deadline closes itself
    let deadline = &center.list()[0];
    assert_eq!(deadline.priority, Priority::Medium);
    assert_eq!(sink.closed(), vec![deadline.id.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn native_alerts_follow_the_browser_switch() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileSettingsStore::new(dir.path().join("settings.json")));
    store
        .save(
            &NotificationSettings::all_enabled()
                .with(NotificationCategory::BrowserNotifications, false),
        )
        .unwrap();
    let sink = Arc::new(RecordingAlertSink::prompting(pulse_core::AlertPermission::Granted));
    let center = center(store, Some(Arc::clone(&sink) as Arc<dyn AlertSink>));

    assert_eq!(center.scan().created(), 3);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(sink.shown().is_empty());
    assert_eq!(sink.permission_requests(), 0);
}

#[test]
fn settings_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs/notifications.json");

    let first = center(Arc::new(JsonFileSettingsStore::new(&path)), None);
    first
        .set_category(NotificationCategory::OverdueAlerts, false)
        .unwrap();

    let second = center(Arc::new(JsonFileSettingsStore::new(&path)), None);
    assert!(!second.settings().is_enabled(NotificationCategory::OverdueAlerts));
    let report = second.scan();
    assert_eq!(report.overdue, 0);
    assert_eq!(report.disabled, 1);
}
