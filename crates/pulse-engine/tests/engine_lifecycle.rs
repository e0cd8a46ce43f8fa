//! Full engine over the in-memory transport

use pulse_core::{
    CollabEvent, ConnectionState, Location, NotificationEvent, NotificationKind, OutboundMessage,
    PulseError, RemoteEvent, SharedSnapshot, UserId,
};
use pulse_engine::{Collaborators, EngineConfig, PulseEngine};
use pulse_notify::MemorySettingsStore;
use pulse_test_utils::{
    agency_snapshot, clock_on, date, ChannelTransport, RecordingAlertSink, ScriptedServer,
    StaticCredentials,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn engine() -> (PulseEngine, ScriptedServer, Arc<RecordingAlertSink>) {
    let today = date(2026, 6, 1);
    let (transport, handle) = ChannelTransport::new();
    let server = ScriptedServer::spawn(handle, "me");
    let alerts = Arc::new(RecordingAlertSink::granted());
    let collaborators = Collaborators::new(
        transport,
        Arc::new(StaticCredentials::new("tok")),
        Arc::new(SharedSnapshot::new(agency_snapshot(today))),
        Arc::new(MemorySettingsStore::new()),
    )
    .with_alerts(alerts.clone())
    .with_clock(Arc::new(clock_on(today)));
    (PulseEngine::new(EngineConfig::default(), collaborators), server, alerts)
}

#[tokio::test(start_paused = true)]
async fn start_connects_scans_and_loads_search() {
    let (engine, server, _alerts) = engine();
    let mut state = engine.connection().subscribe_state();
    engine.presence().join(Location::project(1));

    engine.start().unwrap();
    assert!(engine.is_started());
    state
        .wait_for(|s| *s == ConnectionState::Authenticated)
        .await
        .unwrap();
    settle().await;

    // Joins made before the session are sent once it authenticates
    assert_eq!(
        server.received(),
        vec![OutboundMessage::JoinLocation {
            location: Location::project(1)
        }]
    );
    assert_eq!(engine.connection().current_user(), Some(UserId::new("me")));

    // The first scan runs immediately
    let kinds: Vec<NotificationKind> = engine
        .notifications()
        .list()
        .iter()
        .map(|r| r.kind)
        .collect();
    assert_eq!(kinds.len(), 3);
    assert!(kinds.contains(&NotificationKind::OverdueAlert));

    engine.search().set_query("design");
    engine.search().flush().await;
    assert_eq!(engine.search().results().total, 5);

    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn remote_events_reach_presence_and_notifications() {
    let (engine, server, alerts) = engine();
    let mut state = engine.connection().subscribe_state();
    let location = Location::task(11);
    engine.presence().join(location.clone());
    engine.start().unwrap();
    state
        .wait_for(|s| *s == ConnectionState::Authenticated)
        .await
        .unwrap();
    settle().await;
    let before = engine.notifications().list().len();

    let unread = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&unread);
    let _sub = engine.bus().on_any(move |event| {
        if let CollabEvent::Notification(NotificationEvent::UnreadCount(count)) = event {
            seen.lock().unwrap().push(*count);
        }
    });

    assert!(server.push(RemoteEvent::UserJoined {
        user_id: UserId::new("ana"),
        user_name: Some("Ana".into()),
        location: location.clone(),
    }));
    assert!(server.push(RemoteEvent::TaskAssigned {
        task_id: 11,
        task_name: "Design review".into(),
        assignee_id: UserId::new("me"),
        actor_id: Some(UserId::new("ana")),
        actor_name: Some("Ana".into()),
        project_name: Some("Website Redesign".into()),
    }));
    settle().await;

    assert_eq!(engine.presence().online(&location).len(), 1);
    let list = engine.notifications().list();
    assert_eq!(list.len(), before + 1);
    assert_eq!(list[0].kind, NotificationKind::TaskAssigned);
    assert_eq!(*unread.lock().unwrap(), vec![before + 1]);
    assert!(alerts.shown().iter().any(|a| a.tag == list[0].id.to_string()));

    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stop_releases_everything() {
    let (engine, server, _alerts) = engine();
    let mut state = engine.connection().subscribe_state();
    engine.start().unwrap();
    state
        .wait_for(|s| *s == ConnectionState::Authenticated)
        .await
        .unwrap();

    engine.stop().await;
    assert!(!engine.is_started());
    assert_eq!(engine.connection().state(), ConnectionState::Disconnected);
    assert_eq!(engine.bus().subscriber_count(), 0);

    // No reconnect and no further scans once stopped
    let scanned = engine.notifications().list().len();
    tokio::time::sleep(Duration::from_secs(2 * 60 * 60)).await;
    assert_eq!(server.session_count(), 1);
    assert_eq!(engine.notifications().list().len(), scanned);
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_is_rejected() {
    let (engine, server, _alerts) = engine();
    let mut state = engine.connection().subscribe_state();
    engine.start().unwrap();
    state
        .wait_for(|s| *s == ConnectionState::Authenticated)
        .await
        .unwrap();
    settle().await;
    engine.stop().await;

    let err = engine.start().unwrap_err();
    assert!(matches!(err, PulseError::Lifecycle(_)));
    assert!(!engine.is_started());
    assert_eq!(engine.connection().state(), ConnectionState::Disconnected);
    assert_eq!(engine.bus().subscriber_count(), 0);
    settle().await;
    assert_eq!(server.session_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn second_start_is_a_no_op() {
    let (engine, server, _alerts) = engine();
    engine.start().unwrap();
    engine.start().unwrap();
    settle().await;
    assert_eq!(server.session_count(), 1);
    engine.stop().await;
}

#[test]
fn start_needs_a_runtime() {
    let (engine, _server, _alerts) = {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();
        engine()
    };
    let err = engine.start().unwrap_err();
    assert!(matches!(err, PulseError::Lifecycle(_)));
    assert!(!engine.is_started());
}
