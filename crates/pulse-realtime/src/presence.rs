//! Presence Tracker
//!
//! Keeps a roster per joined location from server-pushed presence events,
//! plus a transient typing overlay whose entries expire after a fixed TTL.
//!
//! - Rosters are keyed by `(user_id, location)` and kept in arrival order
//! - Events for locations that were never joined are dropped
//! - A typing entry fires exactly one `TypingChanged` when it is set and
//!   exactly one when it is cleared; refreshing it only restarts its timer
//! - On re-authentication every joined location is joined again; on session
//!   loss remote rosters and typing overlays are cleared

use crate::config::PresenceConfig;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::Mutex;
use pulse_core::{
    Activity, Clock, CollabBus, ConnectionEvent, ConnectionState, Location, OutboundMessage,
    OutboundSink, PresenceError, PresenceEvent, PresenceRecord, PresenceStatus, RemoteEvent,
    Subscription, TypingIndicator, UserId,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

type Roster = IndexMap<UserId, PresenceRecord>;
type TypingKey = (Location, UserId);

struct TypingEntry {
    since: DateTime<Utc>,
    generation: u64,
    timer: JoinHandle<()>,
}

struct LocalTyping {
    generation: u64,
    last_sent: Instant,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct PresenceState {
    rosters: IndexMap<Location, Roster>,
    typing: IndexMap<TypingKey, TypingEntry>,
    local_typing: HashMap<Location, LocalTyping>,
    status: PresenceStatus,
    activity: Activity,
    next_generation: u64,
}

impl PresenceState {
    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn online(&self, location: &Location) -> Vec<PresenceRecord> {
        self.rosters
            .get(location)
            .map(|roster| {
                roster
                    .values()
                    .filter(|r| r.status.is_online())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn typing(&self, location: &Location) -> Vec<TypingIndicator> {
        self.typing
            .iter()
            .filter(|((loc, _), _)| loc == location)
            .map(|((loc, user), entry)| TypingIndicator {
                user_id: user.clone(),
                location: loc.clone(),
                since: entry.since,
            })
            .collect()
    }

    fn roster_changed(&self, location: &Location) -> PresenceEvent {
        PresenceEvent::RosterChanged {
            location: location.clone(),
            online: self.online(location),
        }
    }

    fn typing_changed(
        &self,
        location: &Location,
        user_id: &UserId,
        is_typing: bool,
    ) -> PresenceEvent {
        PresenceEvent::TypingChanged {
            location: location.clone(),
            user_id: user_id.clone(),
            is_typing,
            typing: self.typing(location),
        }
    }

    fn abort_timers(&mut self) {
        for (_, entry) in self.typing.drain(..) {
            entry.timer.abort();
        }
        for (_, entry) in self.local_typing.drain() {
            entry.timer.abort();
        }
    }
}

/// Side effects collected under the lock and applied after it is released
#[derive(Default)]
struct Effects {
    events: Vec<PresenceEvent>,
    outbound: Vec<OutboundMessage>,
}

struct Inner {
    config: PresenceConfig,
    bus: CollabBus,
    sink: Arc<dyn OutboundSink>,
    clock: Arc<dyn Clock>,
    state: Mutex<PresenceState>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl Inner {
    fn apply(&self, effects: Effects) {
        for message in effects.outbound {
            if let Err(err) = self.sink.send(message) {
                debug!(error = %err, "presence message not sent");
            }
        }
        for event in effects.events {
            self.bus.emit(event);
        }
    }

    fn on_remote(self: &Arc<Self>, event: &RemoteEvent) {
        let Some(location) = event.location() else {
            return;
        };
        let mut fx = Effects::default();
        {
            let mut state = self.state.lock();
            if !state.rosters.contains_key(location) {
                debug!(
                    %location,
                    event = event.name(),
                    "presence event for unjoined location ignored"
                );
                return;
            }
            let now = self.clock.now();

            match event {
                RemoteEvent::UserJoined {
                    user_id, user_name, ..
                } => {
                    if let Some(roster) = state.rosters.get_mut(location) {
                        roster
                            .entry(user_id.clone())
                            .and_modify(|r| {
                                r.last_seen = now;
                                if user_name.is_some() {
                                    r.user_name.clone_from(user_name);
                                }
                            })
                            .or_insert_with(|| {
                                let mut record =
                                    PresenceRecord::new(user_id.clone(), location.clone(), now);
                                record.user_name.clone_from(user_name);
                                record
                            });
                    }
                    fx.events.push(state.roster_changed(location));
                }
                RemoteEvent::UserLeft { user_id, .. } => {
                    let removed = state
                        .rosters
                        .get_mut(location)
                        .and_then(|roster| roster.shift_remove(user_id))
                        .is_some();
                    if removed {
                        fx.events.push(state.roster_changed(location));
                    }
                    let key = (location.clone(), user_id.clone());
                    if let Some(entry) = state.typing.shift_remove(&key) {
                        entry.timer.abort();
                        fx.events.push(state.typing_changed(location, user_id, false));
                    }
                }
                RemoteEvent::PresenceUpdate {
                    user_id,
                    status,
                    activity,
                    ..
                } => {
                    if let Some(roster) = state.rosters.get_mut(location) {
                        let record = roster.entry(user_id.clone()).or_insert_with(|| {
                            PresenceRecord::new(user_id.clone(), location.clone(), now)
                        });
                        record.status = *status;
                        record.activity = activity.clone();
                        record.last_seen = now;
                    }
                    fx.events.push(state.roster_changed(location));
                }
                RemoteEvent::LocationRoster { users, .. } => {
                    let roster: Roster = users
                        .iter()
                        .filter(|r| &r.location == location)
                        .map(|r| (r.user_id.clone(), r.clone()))
                        .collect();
                    state.rosters.insert(location.clone(), roster);
                    fx.events.push(state.roster_changed(location));
                }
                RemoteEvent::UserTyping {
                    user_id, is_typing, ..
                } => {
                    let key = (location.clone(), user_id.clone());
                    if *is_typing {
                        if self.typing_on(&mut state, key, now) {
                            fx.events.push(state.typing_changed(location, user_id, true));
                        }
                    } else if let Some(entry) = state.typing.shift_remove(&key) {
                        entry.timer.abort();
                        fx.events.push(state.typing_changed(location, user_id, false));
                    }
                }
                _ => {}
            }
        }
        self.apply(fx);
    }

    /// Set or refresh a remote typing entry; `true` when newly set
    fn typing_on(
        self: &Arc<Self>,
        state: &mut PresenceState,
        key: TypingKey,
        now: DateTime<Utc>,
    ) -> bool {
        let generation = state.bump();
        let timer = self.spawn_remote_expiry(key.clone(), generation);
        if let Some(entry) = state.typing.get_mut(&key) {
            entry.timer.abort();
            entry.timer = timer;
            entry.generation = generation;
            entry.since = now;
            false
        } else {
            state.typing.insert(
                key,
                TypingEntry {
                    since: now,
                    generation,
                    timer,
                },
            );
            true
        }
    }

    fn spawn_remote_expiry(self: &Arc<Self>, key: TypingKey, generation: u64) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let ttl = self.config.typing_ttl();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire_remote(&key, generation);
            }
        })
    }

    fn expire_remote(&self, key: &TypingKey, generation: u64) {
        let mut fx = Effects::default();
        {
            let mut state = self.state.lock();
            let current = state.typing.get(key).map(|e| e.generation);
            if current != Some(generation) {
                return;
            }
            state.typing.shift_remove(key);
            debug!(location = %key.0, user = %key.1, "typing indicator expired");
            fx.events.push(state.typing_changed(&key.0, &key.1, false));
        }
        self.apply(fx);
    }

    fn spawn_local_expiry(self: &Arc<Self>, location: Location, generation: u64) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let ttl = self.config.typing_ttl();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire_local(&location, generation);
            }
        })
    }

    fn expire_local(&self, location: &Location, generation: u64) {
        let mut fx = Effects::default();
        {
            let mut state = self.state.lock();
            let current = state.local_typing.get(location).map(|e| e.generation);
            if current != Some(generation) {
                return;
            }
            state.local_typing.remove(location);
            fx.outbound.push(OutboundMessage::Typing {
                location: location.clone(),
                is_typing: false,
            });
        }
        self.apply(fx);
    }

    fn on_connection(&self, event: &ConnectionEvent) {
        let mut fx = Effects::default();
        match event {
            ConnectionEvent::Authenticated { .. } => {
                let state = self.state.lock();
                let announce = (state.status, state.activity.clone())
                    != (PresenceStatus::default(), Activity::default());
                for location in state.rosters.keys() {
                    fx.outbound.push(OutboundMessage::JoinLocation {
                        location: location.clone(),
                    });
                    if announce {
                        fx.outbound.push(OutboundMessage::PresenceUpdate {
                            location: location.clone(),
                            status: state.status,
                            activity: state.activity.clone(),
                        });
                    }
                }
                if !state.rosters.is_empty() {
                    info!(
                        locations = state.rosters.len(),
                        "rejoining locations after authentication"
                    );
                }
            }
            ConnectionEvent::StateChanged {
                from: ConnectionState::Authenticated,
                to,
            } => {
                let mut state = self.state.lock();
                let typing: Vec<TypingKey> = state.typing.keys().cloned().collect();
                for key in typing {
                    if let Some(entry) = state.typing.shift_remove(&key) {
                        entry.timer.abort();
                        fx.events.push(state.typing_changed(&key.0, &key.1, false));
                    }
                }
                for (_, entry) in state.local_typing.drain() {
                    entry.timer.abort();
                }
                let mut cleared = Vec::new();
                for (location, roster) in &mut state.rosters {
                    if !roster.is_empty() {
                        roster.clear();
                        cleared.push(location.clone());
                    }
                }
                for location in &cleared {
                    fx.events.push(state.roster_changed(location));
                }
                debug!(%to, cleared = cleared.len(), "session lost; presence cleared");
            }
            _ => {}
        }
        self.apply(fx);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state.get_mut().abort_timers();
    }
}

/// Per-location rosters and typing indicators
///
/// Cloning yields another handle to the same tracker. Typing timers are
/// tokio tasks, so typing events must arrive inside a runtime.
#[derive(Clone)]
pub struct PresenceTracker {
    inner: Arc<Inner>,
}

impl PresenceTracker {
    /// Create a tracker listening on `bus`
    #[must_use]
    pub fn new(
        config: PresenceConfig,
        bus: CollabBus,
        sink: Arc<dyn OutboundSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let inner = Arc::new(Inner {
            config,
            bus: bus.clone(),
            sink,
            clock,
            state: Mutex::new(PresenceState::default()),
            subscriptions: Mutex::new(Vec::new()),
        });

        let weak = Arc::downgrade(&inner);
        let remote = {
            let weak = weak.clone();
            bus.on::<RemoteEvent, _>(move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_remote(event);
                }
            })
        };
        let connection = bus.on::<ConnectionEvent, _>(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_connection(event);
            }
        });
        inner.subscriptions.lock().extend([remote, connection]);

        Self { inner }
    }

    /// Join a location; returns `false` when already joined
    ///
    /// The join is remembered even without a live session and sent on the
    /// next authentication.
    pub fn join(&self, location: Location) -> bool {
        let newly = {
            let mut state = self.inner.state.lock();
            if state.rosters.contains_key(&location) {
                false
            } else {
                state.rosters.insert(location.clone(), Roster::new());
                true
            }
        };
        if newly {
            info!(%location, "joined location");
            self.inner.apply(Effects {
                events: Vec::new(),
                outbound: vec![OutboundMessage::JoinLocation { location }],
            });
        }
        newly
    }

    /// Leave a location, dropping its roster and typing state
    ///
    /// # Errors
    /// - `PresenceError::NotJoined` if the location was not joined
    pub fn leave(&self, location: &Location) -> Result<(), PresenceError> {
        let mut fx = Effects::default();
        {
            let mut state = self.inner.state.lock();
            let roster = state
                .rosters
                .shift_remove(location)
                .ok_or_else(|| PresenceError::NotJoined(location.clone()))?;
            let keys: Vec<TypingKey> = state
                .typing
                .keys()
                .filter(|(loc, _)| loc == location)
                .cloned()
                .collect();
            for key in keys {
                if let Some(entry) = state.typing.shift_remove(&key) {
                    entry.timer.abort();
                }
            }
            if let Some(local) = state.local_typing.remove(location) {
                local.timer.abort();
            }
            if !roster.is_empty() {
                fx.events.push(PresenceEvent::RosterChanged {
                    location: location.clone(),
                    online: Vec::new(),
                });
            }
            fx.outbound.push(OutboundMessage::LeaveLocation {
                location: location.clone(),
            });
        }
        info!(%location, "left location");
        self.inner.apply(fx);
        Ok(())
    }

    /// Report local typing in a joined location
    ///
    /// `true` (re)starts a TTL timer; expiry sends `typing{false}`. Repeated
    /// `true` calls are forwarded at most once per half TTL.
    ///
    /// # Errors
    /// - `PresenceError::NotJoined` if the location was not joined
    pub fn set_typing(&self, location: &Location, is_typing: bool) -> Result<(), PresenceError> {
        let mut fx = Effects::default();
        {
            let mut state = self.inner.state.lock();
            if !state.rosters.contains_key(location) {
                return Err(PresenceError::NotJoined(location.clone()));
            }
            if is_typing {
                let generation = state.bump();
                let timer = self.inner.spawn_local_expiry(location.clone(), generation);
                let now = Instant::now();
                let send = match state.local_typing.get_mut(location) {
                    Some(entry) => {
                        entry.timer.abort();
                        entry.timer = timer;
                        entry.generation = generation;
                        if now.duration_since(entry.last_sent)
                            >= self.inner.config.typing_refresh()
                        {
                            entry.last_sent = now;
                            true
                        } else {
                            false
                        }
                    }
                    None => {
                        state.local_typing.insert(
                            location.clone(),
                            LocalTyping {
                                generation,
                                last_sent: now,
                                timer,
                            },
                        );
                        true
                    }
                };
                if send {
                    fx.outbound.push(OutboundMessage::Typing {
                        location: location.clone(),
                        is_typing: true,
                    });
                }
            } else if let Some(entry) = state.local_typing.remove(location) {
                entry.timer.abort();
                fx.outbound.push(OutboundMessage::Typing {
                    location: location.clone(),
                    is_typing: false,
                });
            }
        }
        self.inner.apply(fx);
        Ok(())
    }

    /// Change the local status and activity, announcing it in every joined location
    ///
    /// Returns the number of locations the update was sent to.
    pub fn set_status(&self, status: PresenceStatus, activity: Activity) -> usize {
        let outbound: Vec<OutboundMessage> = {
            let mut state = self.inner.state.lock();
            state.status = status;
            state.activity = activity.clone();
            state
                .rosters
                .keys()
                .map(|location| OutboundMessage::PresenceUpdate {
                    location: location.clone(),
                    status,
                    activity: activity.clone(),
                })
                .collect()
        };
        let sent = outbound.len();
        self.inner.apply(Effects {
            events: Vec::new(),
            outbound,
        });
        sent
    }

    /// Online users in a location, in arrival order
    #[must_use]
    pub fn online(&self, location: &Location) -> Vec<PresenceRecord> {
        self.inner.state.lock().online(location)
    }

    /// Users currently typing in a location
    #[must_use]
    pub fn typing(&self, location: &Location) -> Vec<TypingIndicator> {
        self.inner.state.lock().typing(location)
    }

    /// Joined locations, in join order
    #[must_use]
    pub fn joined(&self) -> Vec<Location> {
        self.inner.state.lock().rosters.keys().cloned().collect()
    }

    /// Local status and activity
    #[must_use]
    pub fn local_status(&self) -> (PresenceStatus, Activity) {
        let state = self.inner.state.lock();
        (state.status, state.activity.clone())
    }

    /// Stop listening and cancel every typing timer
    pub fn shutdown(&self) {
        self.inner.subscriptions.lock().clear();
        let mut state = self.inner.state.lock();
        state.abort_timers();
        state.rosters.clear();
    }
}

impl fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PresenceTracker")
            .field("joined", &state.rosters.len())
            .field("typing", &state.typing.len())
            .finish_non_exhaustive()
    }
}
