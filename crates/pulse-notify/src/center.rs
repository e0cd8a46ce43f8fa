//! Notification Center
//!
//! Owns the in-app notification list and the user's category settings.
//!
//! - Records are kept newest-first and capped; overflow evicts the oldest
//! - Dismissing deletes; a dismissed scan alert can recur on a later day
//! - Every creation passes the category gate before any work is done
//! - Native alerts are fire-and-forget and never affect the in-app list

use crate::alerts::AlertDispatcher;
use crate::config::NotificationConfig;
use crate::format::build_record;
use crate::live::notification_for;
use crate::scan::{already_notified, candidates, ScanReport};
use crate::store::SettingsStore;
use chrono::NaiveDate;
use parking_lot::Mutex;
use pulse_core::{
    AlertSink, Clock, CollabBus, ConnectionEvent, NotificationCategory, NotificationData,
    NotificationEvent, NotificationId, NotificationRecord, NotificationSettings, PulseError,
    RemoteEvent, SettingsError, SnapshotProvider, Subscription, UserId,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct CenterState {
    records: Vec<NotificationRecord>,
    settings: NotificationSettings,
}

impl CenterState {
    fn unread(&self) -> usize {
        self.records.iter().filter(|r| !r.read).count()
    }
}

enum Rejected {
    Disabled,
    Duplicate,
}

struct Inner {
    config: NotificationConfig,
    bus: CollabBus,
    clock: Arc<dyn Clock>,
    snapshot: Arc<dyn SnapshotProvider>,
    store: Arc<dyn SettingsStore>,
    alerts: Option<Arc<AlertDispatcher>>,
    state: Mutex<CenterState>,
    current_user: Mutex<Option<UserId>>,
    scanning: AtomicBool,
    cancel: CancellationToken,
    scan_job: Mutex<Option<JoinHandle<()>>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

/// Clears the scan flag when the scan ends, even by unwinding
struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Inner {
    /// Gate, build and insert; `dedup_day` also rejects scan duplicates
    fn admit(
        &self,
        data: NotificationData,
        dedup_day: Option<NaiveDate>,
    ) -> Result<(NotificationRecord, usize, bool), Rejected> {
        let mut state = self.state.lock();
        if !state.settings.is_enabled(data.kind().category()) {
            return Err(Rejected::Disabled);
        }
        if let Some(today) = dedup_day {
            let clock = &self.clock;
            if already_notified(&data, &state.records, today, |r| {
                clock.local_date(r.created_at)
            }) {
                return Err(Rejected::Duplicate);
            }
        }

        let record = build_record(data, self.clock.now());
        state.records.insert(0, record.clone());
        let cap = self.config.max_notifications.max(1);
        if state.records.len() > cap {
            let evicted = state.records.len() - cap;
            state.records.truncate(cap);
            debug!(evicted, "oldest notifications evicted");
        }
        let native = state
            .settings
            .is_enabled(NotificationCategory::BrowserNotifications);
        Ok((record, state.unread(), native))
    }

    fn announce(&self, record: &NotificationRecord, unread: usize, native: bool) {
        debug!(id = %record.id, kind = record.kind.as_str(), "notification created");
        self.bus.emit(NotificationEvent::Created(record.clone()));
        self.bus.emit(NotificationEvent::UnreadCount(unread));
        if native {
            if let Some(alerts) = &self.alerts {
                alerts.deliver(record);
            }
        }
    }

    fn create(&self, data: NotificationData) -> Option<NotificationRecord> {
        let kind = data.kind();
        match self.admit(data, None) {
            Ok((record, unread, native)) => {
                self.announce(&record, unread, native);
                Some(record)
            }
            Err(_) => {
                debug!(kind = kind.as_str(), "notification category disabled");
                None
            }
        }
    }

    fn scan(&self) -> ScanReport {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("scan already in progress");
            return ScanReport::busy();
        }
        let _guard = ScanGuard(&self.scanning);

        let snapshot = self.snapshot.current();
        let today = self.clock.today();
        let mut report = ScanReport::default();

        for data in candidates(&snapshot, today, &mut report) {
            let kind = data.kind();
            match self.admit(data, Some(today)) {
                Ok((record, unread, native)) => {
                    report.count_created(kind);
                    self.announce(&record, unread, native);
                }
                Err(Rejected::Disabled) => report.disabled += 1,
                Err(Rejected::Duplicate) => report.duplicates += 1,
            }
        }

        info!(
            %today,
            tasks = report.tasks_checked,
            projects = report.projects_checked,
            created = report.created(),
            duplicates = report.duplicates,
            malformed = report.malformed,
            "due-date scan finished"
        );
        report
    }

    fn on_remote(&self, event: &RemoteEvent) {
        let me = self.current_user.lock().clone();
        if let Some(data) = notification_for(event, me.as_ref(), self.config.excerpt_chars) {
            self.create(data);
        }
    }

    fn on_connection(&self, event: &ConnectionEvent) {
        if let ConnectionEvent::Authenticated { user_id } = event {
            *self.current_user.lock() = Some(user_id.clone());
        }
    }
}

/// In-app notification list, settings gate and scan job
///
/// Cloning yields another handle to the same center.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    /// Create a center and subscribe it to remote and connection events
    ///
    /// Settings are loaded from `store` once; a failing store is logged and
    /// every category starts enabled.
    pub fn new(
        config: NotificationConfig,
        bus: CollabBus,
        clock: Arc<dyn Clock>,
        snapshot: Arc<dyn SnapshotProvider>,
        store: Arc<dyn SettingsStore>,
        alert_sink: Option<Arc<dyn AlertSink>>,
    ) -> Self {
        let settings = match store.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => NotificationSettings::all_enabled(),
            Err(err) => {
                warn!(error = %err, "notification settings unreadable; using defaults");
                NotificationSettings::all_enabled()
            }
        };

        let cancel = CancellationToken::new();
        let alerts = alert_sink
            .map(|sink| Arc::new(AlertDispatcher::new(sink, &config, cancel.child_token())));

        let inner = Arc::new(Inner {
            config,
            bus: bus.clone(),
            clock,
            snapshot,
            store,
            alerts,
            state: Mutex::new(CenterState {
                records: Vec::new(),
                settings,
            }),
            current_user: Mutex::new(None),
            scanning: AtomicBool::new(false),
            cancel,
            scan_job: Mutex::new(None),
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

    /// Create a notification; `None` when its category is disabled
    pub fn create(&self, data: NotificationData) -> Option<NotificationRecord> {
        self.inner.create(data)
    }

    /// Mark one record read; `false` if unknown or already read
    pub fn mark_read(&self, id: NotificationId) -> bool {
        let unread = {
            let mut state = self.inner.state.lock();
            match state.records.iter_mut().find(|r| r.id == id) {
                Some(record) if !record.read => record.read = true,
                _ => return false,
            }
            state.unread()
        };
        self.inner.bus.emit(NotificationEvent::Read { id });
        self.inner.bus.emit(NotificationEvent::UnreadCount(unread));
        true
    }

    /// Mark every record read; returns how many changed
    pub fn mark_all_read(&self) -> usize {
        let changed = {
            let mut state = self.inner.state.lock();
            let mut changed = 0;
            for record in state.records.iter_mut().filter(|r| !r.read) {
                record.read = true;
                changed += 1;
            }
            changed
        };
        if changed > 0 {
            self.inner.bus.emit(NotificationEvent::AllRead);
            self.inner.bus.emit(NotificationEvent::UnreadCount(0));
        }
        changed
    }

    /// Delete one record; `false` if it was not there
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let unread = {
            let mut state = self.inner.state.lock();
            let before = state.records.len();
            state.records.retain(|r| r.id != id);
            if state.records.len() == before {
                return false;
            }
            state.unread()
        };
        self.inner.bus.emit(NotificationEvent::Dismissed { id });
        self.inner.bus.emit(NotificationEvent::UnreadCount(unread));
        true
    }

    /// Delete every record; returns how many were removed
    pub fn dismiss_all(&self) -> usize {
        let removed = {
            let mut state = self.inner.state.lock();
            let removed = state.records.len();
            state.records.clear();
            removed
        };
        self.inner.bus.emit(NotificationEvent::Cleared);
        self.inner.bus.emit(NotificationEvent::UnreadCount(0));
        removed
    }

    /// Unread records
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.inner.state.lock().unread()
    }

    /// All records, newest first
    #[must_use]
    pub fn list(&self) -> Vec<NotificationRecord> {
        self.inner.state.lock().records.clone()
    }

    /// One record
    #[must_use]
    pub fn get(&self, id: NotificationId) -> Option<NotificationRecord> {
        self.inner
            .state
            .lock()
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Current settings
    #[must_use]
    pub fn settings(&self) -> NotificationSettings {
        self.inner.state.lock().settings.clone()
    }

    /// Replace the settings and persist them
    ///
    /// The in-memory settings change even when persisting fails.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the settings could not be written.
    pub fn save_settings(&self, settings: NotificationSettings) -> Result<(), SettingsError> {
        self.inner.state.lock().settings = settings.clone();
        self.inner.bus.emit(NotificationEvent::SettingsChanged);
        self.inner.store.save(&settings).map_err(|err| {
            warn!(error = %err, "notification settings not persisted");
            err
        })
    }

    /// Toggle one category and persist
    ///
    /// # Errors
    ///
    /// Returns the store's error if the settings could not be written.
    pub fn set_category(
        &self,
        category: NotificationCategory,
        enabled: bool,
    ) -> Result<(), SettingsError> {
        let settings = self.settings().with(category, enabled);
        self.save_settings(settings)
    }

    /// Run the due-date scan now
    pub fn scan(&self) -> ScanReport {
        self.inner.scan()
    }

    /// Scan immediately, then every `scan_interval`
    ///
    /// Calling it again while the job runs does nothing.
    ///
    /// # Errors
    ///
    /// Fails outside a Tokio runtime.
    pub fn start_scan_job(&self) -> Result<(), PulseError> {
        let handle = Handle::try_current()
            .map_err(|_| PulseError::Lifecycle("scan job needs a Tokio runtime".into()))?;
        let mut job = self.inner.scan_job.lock();
        if job.as_ref().is_some_and(|j| !j.is_finished()) {
            return Ok(());
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.clone();
        let period = self.inner.config.scan_interval();
        *job = Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let Some(inner) = weak.upgrade() else { break };
                inner.scan();
            }
            debug!("scan job stopped");
        }));
        info!(every_secs = period.as_secs(), "scan job started");
        Ok(())
    }

    /// Stop the scan job and pending alerts, and leave the bus
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(job) = self.inner.scan_job.lock().take() {
            job.abort();
        }
        self.inner.subscriptions.lock().clear();
    }
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("NotificationCenter")
            .field("records", &state.records.len())
            .field("unread", &state.unread())
            .field("alerts", &self.inner.alerts.is_some())
            .finish_non_exhaustive()
    }
}
