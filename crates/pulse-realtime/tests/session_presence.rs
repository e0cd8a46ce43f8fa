//! Connection manager and presence tracker wired through one bus

use pulse_core::{
    CollabBus, ConnectionState, Location, OutboundMessage, PresenceEvent, RemoteEvent, UserId,
};
use pulse_realtime::{ConnectionConfig, ConnectionManager, PresenceConfig, PresenceTracker};
use pulse_test_utils::{date, ChannelTransport, ManualClock, ScriptedServer, StaticCredentials};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

async fn reach(rx: &mut watch::Receiver<ConnectionState>, want: ConnectionState) {
    rx.wait_for(|s| *s == want).await.expect("state channel open");
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn wire() -> (ConnectionManager, PresenceTracker, ScriptedServer, CollabBus) {
    let (transport, handle) = ChannelTransport::new();
    let server = ScriptedServer::spawn(handle, "me");
    let bus = CollabBus::new();
    let manager = ConnectionManager::new(
        ConnectionConfig::default(),
        transport,
        Arc::new(StaticCredentials::new("tok")),
        bus.clone(),
    );
    let presence = PresenceTracker::new(
        PresenceConfig::default(),
        bus.clone(),
        Arc::new(manager.clone()),
        Arc::new(ManualClock::at_date(date(2026, 1, 5))),
    );
    (manager, presence, server, bus)
}

#[tokio::test(start_paused = true)]
async fn joined_locations_survive_reconnects() {
    let (manager, presence, server, _bus) = wire();
    let loc = Location::project(7);
    presence.join(loc.clone());

    let mut state = manager.subscribe_state();
    manager.initialize();
    reach(&mut state, ConnectionState::Authenticated).await;
    settle().await;
    assert_eq!(
        server.received(),
        vec![OutboundMessage::JoinLocation {
            location: loc.clone()
        }]
    );

    assert!(server.push(RemoteEvent::UserJoined {
        user_id: UserId::new("ana"),
        user_name: Some("Ana".into()),
        location: loc.clone(),
    }));
    settle().await;
    assert_eq!(presence.online(&loc).len(), 1);

    server.drop_session();
    reach(&mut state, ConnectionState::Reconnecting).await;
    assert!(presence.online(&loc).is_empty());

    reach(&mut state, ConnectionState::Authenticated).await;
    settle().await;
    assert_eq!(server.session_count(), 2);
    assert_eq!(
        server.received(),
        vec![
            OutboundMessage::JoinLocation {
                location: loc.clone()
            },
            OutboundMessage::JoinLocation { location: loc }
        ]
    );

    manager.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn typing_round_trip_through_the_live_session() {
    let (manager, presence, server, bus) = wire();
    let loc = Location::task(3);
    presence.join(loc.clone());

    let typing_events = Arc::new(parking_lot::Mutex::new(0usize));
    let _sub = {
        let typing_events = Arc::clone(&typing_events);
        bus.on::<PresenceEvent, _>(move |e| {
            if matches!(e, PresenceEvent::TypingChanged { .. }) {
                *typing_events.lock() += 1;
            }
        })
    };

    let mut state = manager.subscribe_state();
    manager.initialize();
    reach(&mut state, ConnectionState::Authenticated).await;

    presence.set_typing(&loc, true).unwrap();
    server.push(RemoteEvent::UserTyping {
        user_id: UserId::new("ana"),
        location: loc.clone(),
        is_typing: true,
    });
    settle().await;
    assert_eq!(presence.typing(&loc).len(), 1);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(presence.typing(&loc).is_empty());
    assert_eq!(*typing_events.lock(), 2);

    let typing_sent: Vec<bool> = server
        .received()
        .into_iter()
        .filter_map(|m| match m {
            OutboundMessage::Typing { is_typing, .. } => Some(is_typing),
            _ => None,
        })
        .collect();
    assert_eq!(typing_sent, vec![true, false]);

    manager.disconnect().await;
}
