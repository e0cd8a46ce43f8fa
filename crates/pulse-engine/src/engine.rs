//! Engine facade
//!
//! Wires the components to one bus and owns their lifecycle. There are no
//! globals: every collaborator is injected through [`Collaborators`].

use crate::config::EngineConfig;
use pulse_core::{
    AlertSink, Clock, CollabBus, CredentialProvider, OutboundSink, PulseError, SnapshotProvider,
    SystemClock, Transport,
};
use pulse_notify::{NotificationCenter, SettingsStore};
use pulse_realtime::{ConnectionManager, PresenceTracker};
use pulse_search::LiveSearch;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

/// Everything the engine consumes from its host
pub struct Collaborators {
    /// Live transport
    pub transport: Arc<dyn Transport>,
    /// Bearer credential source
    pub credentials: Arc<dyn CredentialProvider>,
    /// Workspace snapshot source
    pub snapshot: Arc<dyn SnapshotProvider>,
    /// Notification settings persistence
    pub settings: Arc<dyn SettingsStore>,
    /// Native alerts, if the platform has them
    pub alerts: Option<Arc<dyn AlertSink>>,
    /// Wall clock
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Collaborators with the system clock and no native alerts
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        snapshot: Arc<dyn SnapshotProvider>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            transport,
            credentials,
            snapshot,
            settings,
            alerts: None,
            clock: Arc::new(SystemClock::local()),
        }
    }

    /// With a native alert sink
    #[must_use]
    pub fn with_alerts(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// With a clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// The collaboration and notification engine
pub struct PulseEngine {
    bus: CollabBus,
    snapshot: Arc<dyn SnapshotProvider>,
    connection: ConnectionManager,
    presence: PresenceTracker,
    notifications: NotificationCenter,
    search: LiveSearch,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl PulseEngine {
    /// Build every component on a fresh bus; nothing runs until [`start`](Self::start)
    #[must_use]
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            transport,
            credentials,
            snapshot,
            settings,
            alerts,
            clock,
        } = collaborators;
        let bus = CollabBus::new();

        let connection =
            ConnectionManager::new(config.connection, transport, credentials, bus.clone());
        let sink: Arc<dyn OutboundSink> = Arc::new(connection.clone());
        let presence = PresenceTracker::new(config.presence, bus.clone(), sink, Arc::clone(&clock));
        let notifications = NotificationCenter::new(
            config.notifications,
            bus.clone(),
            Arc::clone(&clock),
            Arc::clone(&snapshot),
            settings,
            alerts,
        );
        let search = LiveSearch::new(config.search, bus.clone(), clock);

        Self {
            bus,
            snapshot,
            connection,
            presence,
            notifications,
            search,
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Connect, start the scan job and load the search collections
    ///
    /// A second call while started does nothing. A stopped engine stays
    /// stopped; build a new one instead.
    ///
    /// # Errors
    /// - `PulseError::Lifecycle` outside a Tokio runtime or after [`stop`](Self::stop)
    pub fn start(&self) -> Result<(), PulseError> {
        if Handle::try_current().is_err() {
            return Err(PulseError::Lifecycle("engine must start inside a Tokio runtime".into()));
        }
        if self.stopped.load(Ordering::Acquire) {
            return Err(PulseError::Lifecycle("engine was stopped; build a new one".into()));
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.search.set_collections(self.snapshot.current());
        self.notifications.start_scan_job()?;
        self.connection.initialize();
        info!("pulse engine started");
        Ok(())
    }

    /// Cancel every timer, close the connection and clear the bus
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.connection.disconnect().await;
        self.presence.shutdown();
        self.notifications.shutdown();
        self.search.shutdown();
        self.bus.clear();
        self.started.store(false, Ordering::Release);
        info!("pulse engine stopped");
    }

    /// Reload the search collections after the host replaced the snapshot
    pub fn refresh_collections(&self) {
        self.search.set_collections(self.snapshot.current());
    }

    /// Started and not yet stopped
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Shared event bus
    #[must_use]
    pub fn bus(&self) -> &CollabBus {
        &self.bus
    }

    /// Connection manager
    #[must_use]
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Presence tracker
    #[must_use]
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Notification center
    #[must_use]
    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Live search
    #[must_use]
    pub fn search(&self) -> &LiveSearch {
        &self.search
    }
}

impl fmt::Debug for PulseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PulseEngine")
            .field("started", &self.is_started())
            .field("stopped", &self.stopped.load(Ordering::Acquire))
            .field("connection", &self.connection.state())
            .field("subscribers", &self.bus.subscriber_count())
            .finish_non_exhaustive()
    }
}
