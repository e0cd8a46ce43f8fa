//! Presence simulator - seeded randomized testing of the Presence Tracker
//!
//! Drives a real [`PresenceTracker`] with a reproducible stream of local
//! joins and leaves, server-pushed presence events and session changes,
//! mirrors every operation in a plain model, and checks the tracker
//! against the model after each step.

use indexmap::IndexMap;
use pulse_core::{
    Activity, CollabBus, ConnectionError, ConnectionEvent, ConnectionState, Location,
    OutboundMessage, OutboundSink, PresenceRecord, PresenceStatus, PulseError, RemoteEvent,
    SystemClock, UserId,
};
use pulse_realtime::{PresenceConfig, PresenceTracker};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Typing entries never expire during a run
const SIMULATION_TYPING_TTL_MS: u64 = 24 * 60 * 60 * 1_000;

const STATUSES: [PresenceStatus; 4] = [
    PresenceStatus::Active,
    PresenceStatus::Idle,
    PresenceStatus::Busy,
    PresenceStatus::Offline,
];

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Total operations to execute
    pub total_operations: u64,
    /// Stop at the first violation instead of collecting all of them
    pub stop_on_first_violation: bool,
    /// Size of the location pool
    pub locations: u64,
    /// Size of the remote user pool
    pub users: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_operations: 10_000,
            stop_on_first_violation: true,
            locations: 4,
            users: 6,
        }
    }
}

/// Every operation the simulator can generate
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedOperation {
    /// Local join
    Join(Location),
    /// Local leave
    Leave(Location),
    /// Server: user entered a location
    RemoteJoin(UserId, Location),
    /// Server: user left a location
    RemoteLeave(UserId, Location),
    /// Server: user changed status
    RemoteStatus(UserId, Location, PresenceStatus),
    /// Server: user started or stopped typing
    RemoteTyping(UserId, Location, bool),
    /// Server: full roster of a location
    RosterSnapshot(Location, Vec<(UserId, PresenceStatus)>),
    /// The authenticated session dropped
    SessionLost,
    /// A session authenticated again
    Reauthenticate,
}

impl SimulatedOperation {
    /// Operation name used in statistics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join(_) => "Join",
            Self::Leave(_) => "Leave",
            Self::RemoteJoin(..) => "RemoteJoin",
            Self::RemoteLeave(..) => "RemoteLeave",
            Self::RemoteStatus(..) => "RemoteStatus",
            Self::RemoteTyping(..) => "RemoteTyping",
            Self::RosterSnapshot(..) => "RosterSnapshot",
            Self::SessionLost => "SessionLost",
            Self::Reauthenticate => "Reauthenticate",
        }
    }
}

/// Expected result classification for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedResult {
    /// The tracker accepts the operation
    ShouldSucceed,
    /// The tracker rejects the operation
    ShouldFail,
}

/// A violation detected during simulation
#[derive(Debug, Clone)]
pub enum Violation {
    /// Operation outcome didn't match expectation
    UnexpectedOutcome {
        /// Position in the run
        operation_index: u64,
        /// The operation
        operation: SimulatedOperation,
        /// What the model predicted
        expected: ExpectedResult,
        /// What the tracker did
        actual: Result<String, String>,
    },
    /// Invariant was violated
    Invariant(InvariantViolation),
}

/// A specific invariant violation
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Failed check
    pub check: InvariantCheck,
    /// What differed
    pub details: String,
}

/// Invariants checked after every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantCheck {
    /// Joined locations match the model, in join order
    JoinedLocationsMatch,
    /// Online users and their statuses match the model
    RostersMatch,
    /// No user is listed twice in a roster
    RosterUsersUnique,
    /// Typing users match the model
    TypingMatches,
    /// Locations never joined, or left, show nobody
    UnjoinedLocationsEmpty,
    /// Join and leave messages sent match the model
    OutboundMatches,
}

/// Statistics collected during simulation
#[derive(Debug, Clone, Default)]
pub struct OperationStats {
    /// Operations executed
    pub total_operations: u64,
    /// Accepted operations
    pub successful_operations: u64,
    /// Rejected operations
    pub failed_operations: u64,
    /// Count per operation name
    pub operations_by_type: HashMap<&'static str, u64>,
}

impl OperationStats {
    /// Account for one executed operation
    pub fn record(&mut self, operation: &SimulatedOperation, result: &Result<String, String>) {
        self.total_operations += 1;
        *self.operations_by_type.entry(operation.name()).or_insert(0) += 1;
        match result {
            Ok(_) => self.successful_operations += 1,
            Err(_) => self.failed_operations += 1,
        }
    }
}

/// Final report from the simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration of the run
    pub config: SimulatorConfig,
    /// Operation statistics
    pub stats: OperationStats,
    /// Everything that went wrong
    pub violations: Vec<Violation>,
    /// Locations joined at the end
    pub final_locations: usize,
    /// Online users across locations at the end
    pub final_online: usize,
}

impl SimulatorReport {
    /// No violations
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Plain-text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Presence Simulator Report ===\n\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Total Operations: {}", self.stats.total_operations);
        let _ = writeln!(report, "Successful: {}", self.stats.successful_operations);
        let _ = writeln!(report, "Rejected: {}", self.stats.failed_operations);
        let _ = writeln!(report, "Violations: {}", self.violations.len());
        let _ = writeln!(report, "Final Locations: {}", self.final_locations);
        let _ = writeln!(report, "Final Online: {}", self.final_online);

        let mut by_type: Vec<_> = self.stats.operations_by_type.iter().collect();
        by_type.sort();
        report.push_str("\n=== Operations ===\n");
        for (name, count) in by_type {
            let _ = writeln!(report, "{name}: {count}");
        }

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v:?}", i + 1);
            }
        }

        let _ = write!(
            report,
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

/// Outbound sink that only counts membership messages
#[derive(Debug, Default)]
struct CountingSink {
    joins: AtomicU64,
    leaves: AtomicU64,
}

impl OutboundSink for CountingSink {
    fn send(&self, message: OutboundMessage) -> Result<(), ConnectionError> {
        match message {
            OutboundMessage::JoinLocation { .. } => self.joins.fetch_add(1, Ordering::Relaxed),
            OutboundMessage::LeaveLocation { .. } => self.leaves.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };
        Ok(())
    }
}

/// What the tracker should hold
#[derive(Debug, Default)]
struct Model {
    rosters: IndexMap<Location, IndexMap<UserId, PresenceStatus>>,
    typing: HashSet<(Location, UserId)>,
    joins_sent: u64,
    leaves_sent: u64,
}

impl Model {
    fn expected(&self, operation: &SimulatedOperation) -> ExpectedResult {
        match operation {
            SimulatedOperation::Join(location) if self.rosters.contains_key(location) => {
                ExpectedResult::ShouldFail
            }
            SimulatedOperation::Leave(location) if !self.rosters.contains_key(location) => {
                ExpectedResult::ShouldFail
            }
            _ => ExpectedResult::ShouldSucceed,
        }
    }

    fn apply(&mut self, operation: &SimulatedOperation) {
        match operation {
            SimulatedOperation::Join(location) => {
                if !self.rosters.contains_key(location) {
                    self.rosters.insert(location.clone(), IndexMap::new());
                    self.joins_sent += 1;
                }
            }
            SimulatedOperation::Leave(location) => {
                if self.rosters.shift_remove(location).is_some() {
                    self.typing.retain(|(loc, _)| loc != location);
                    self.leaves_sent += 1;
                }
            }
            SimulatedOperation::RemoteJoin(user, location) => {
                if let Some(roster) = self.rosters.get_mut(location) {
                    roster.entry(user.clone()).or_insert(PresenceStatus::Active);
                }
            }
            SimulatedOperation::RemoteLeave(user, location) => {
                if let Some(roster) = self.rosters.get_mut(location) {
                    roster.shift_remove(user);
                    self.typing.remove(&(location.clone(), user.clone()));
                }
            }
            SimulatedOperation::RemoteStatus(user, location, status) => {
                if let Some(roster) = self.rosters.get_mut(location) {
                    roster.insert(user.clone(), *status);
                }
            }
            SimulatedOperation::RemoteTyping(user, location, is_typing) => {
                if self.rosters.contains_key(location) {
                    let key = (location.clone(), user.clone());
                    if *is_typing {
                        self.typing.insert(key);
                    } else {
                        self.typing.remove(&key);
                    }
                }
            }
            SimulatedOperation::RosterSnapshot(location, users) => {
                if let Some(roster) = self.rosters.get_mut(location) {
                    *roster = users.iter().cloned().collect();
                }
            }
            SimulatedOperation::SessionLost => {
                for roster in self.rosters.values_mut() {
                    roster.clear();
                }
                self.typing.clear();
            }
            SimulatedOperation::Reauthenticate => {
                self.joins_sent += self.rosters.len() as u64;
            }
        }
    }

    fn online(&self, location: &Location) -> Vec<(UserId, PresenceStatus)> {
        self.rosters
            .get(location)
            .map(|roster| {
                roster
                    .iter()
                    .filter(|(_, status)| status.is_online())
                    .map(|(user, status)| (user.clone(), *status))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn typing(&self, location: &Location) -> BTreeSet<String> {
        self.typing
            .iter()
            .filter(|(loc, _)| loc == location)
            .map(|(_, user)| user.as_str().to_string())
            .collect()
    }
}

struct Harness {
    bus: CollabBus,
    tracker: PresenceTracker,
    sink: Arc<CountingSink>,
    locations: Vec<Location>,
    users: Vec<UserId>,
}

impl Harness {
    fn new(config: &SimulatorConfig) -> Self {
        let bus = CollabBus::new();
        let sink = Arc::new(CountingSink::default());
        let tracker = PresenceTracker::new(
            PresenceConfig::default().with_typing_ttl(SIMULATION_TYPING_TTL_MS),
            bus.clone(),
            Arc::clone(&sink) as Arc<dyn OutboundSink>,
            Arc::new(SystemClock::utc()),
        );
        Self {
            bus,
            tracker,
            sink,
            locations: (1..=config.locations.max(1)).map(Location::project).collect(),
            users: (1..=config.users.max(1))
                .map(|i| UserId::new(format!("user-{i}")))
                .collect(),
        }
    }

    fn generate(&self, rng: &mut StdRng) -> SimulatedOperation {
        let location = self.locations[rng.gen_range(0..self.locations.len())].clone();
        let user = self.users[rng.gen_range(0..self.users.len())].clone();
        let status = STATUSES[rng.gen_range(0..STATUSES.len())];

        match rng.gen_range(0..100) {
            0..=14 => SimulatedOperation::Join(location),
            15..=24 => SimulatedOperation::Leave(location),
            25..=44 => SimulatedOperation::RemoteJoin(user, location),
            45..=54 => SimulatedOperation::RemoteLeave(user, location),
            55..=69 => SimulatedOperation::RemoteStatus(user, location, status),
            70..=84 => SimulatedOperation::RemoteTyping(user, location, rng.gen_bool(0.6)),
            85..=91 => {
                let mut users = Vec::new();
                for user in &self.users {
                    if rng.gen_bool(0.5) {
                        users.push((user.clone(), STATUSES[rng.gen_range(0..STATUSES.len())]));
                    }
                }
                SimulatedOperation::RosterSnapshot(location, users)
            }
            92..=95 => SimulatedOperation::SessionLost,
            _ => SimulatedOperation::Reauthenticate,
        }
    }

    fn execute(&self, operation: &SimulatedOperation) -> Result<String, String> {
        match operation {
            SimulatedOperation::Join(location) => {
                if self.tracker.join(location.clone()) {
                    Ok("joined".into())
                } else {
                    Err("already joined".into())
                }
            }
            SimulatedOperation::Leave(location) => self
                .tracker
                .leave(location)
                .map(|()| "left".into())
                .map_err(|err| err.to_string()),
            SimulatedOperation::RemoteJoin(user, location) => {
                self.bus.emit(RemoteEvent::UserJoined {
                    user_id: user.clone(),
                    user_name: None,
                    location: location.clone(),
                });
                Ok("delivered".into())
            }
            SimulatedOperation::RemoteLeave(user, location) => {
                self.bus.emit(RemoteEvent::UserLeft {
                    user_id: user.clone(),
                    location: location.clone(),
                });
                Ok("delivered".into())
            }
            SimulatedOperation::RemoteStatus(user, location, status) => {
                self.bus.emit(RemoteEvent::PresenceUpdate {
                    user_id: user.clone(),
                    location: location.clone(),
                    status: *status,
                    activity: Activity::Viewing,
                });
                Ok("delivered".into())
            }
            SimulatedOperation::RemoteTyping(user, location, is_typing) => {
                self.bus.emit(RemoteEvent::UserTyping {
                    user_id: user.clone(),
                    location: location.clone(),
                    is_typing: *is_typing,
                });
                Ok("delivered".into())
            }
            SimulatedOperation::RosterSnapshot(location, users) => {
                let now = chrono::Utc::now();
                let users = users
                    .iter()
                    .map(|(user, status)| {
                        let mut record = PresenceRecord::new(user.clone(), location.clone(), now);
                        record.status = *status;
                        record
                    })
                    .collect();
                self.bus.emit(RemoteEvent::LocationRoster {
                    location: location.clone(),
                    users,
                });
                Ok("delivered".into())
            }
            SimulatedOperation::SessionLost => {
                self.bus.emit(ConnectionEvent::StateChanged {
                    from: ConnectionState::Authenticated,
                    to: ConnectionState::Reconnecting,
                });
                Ok("delivered".into())
            }
            SimulatedOperation::Reauthenticate => {
                self.bus.emit(ConnectionEvent::Authenticated {
                    user_id: UserId::new("local"),
                });
                Ok("delivered".into())
            }
        }
    }

    fn check(&self, model: &Model) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let mut fail =
            |check, details: String| violations.push(InvariantViolation { check, details });

        let joined = self.tracker.joined();
        let expected: Vec<Location> = model.rosters.keys().cloned().collect();
        if joined != expected {
            fail(
                InvariantCheck::JoinedLocationsMatch,
                format!("tracker {joined:?}, model {expected:?}"),
            );
        }

        for location in &self.locations {
            let online = self.tracker.online(location);
            let typing: BTreeSet<String> = self
                .tracker
                .typing(location)
                .into_iter()
                .map(|t| t.user_id.as_str().to_string())
                .collect();

            let mut seen = HashSet::new();
            if !online.iter().all(|r| seen.insert(r.user_id.clone())) {
                fail(
                    InvariantCheck::RosterUsersUnique,
                    format!("{location}: duplicate users in {online:?}"),
                );
            }

            if !model.rosters.contains_key(location) {
                if !online.is_empty() || !typing.is_empty() {
                    fail(
                        InvariantCheck::UnjoinedLocationsEmpty,
                        format!("{location}: {} online, {} typing", online.len(), typing.len()),
                    );
                }
                continue;
            }

            let actual: Vec<(UserId, PresenceStatus)> = online
                .iter()
                .map(|r| (r.user_id.clone(), r.status))
                .collect();
            let wanted = model.online(location);
            if actual != wanted {
                fail(
                    InvariantCheck::RostersMatch,
                    format!("{location}: tracker {actual:?}, model {wanted:?}"),
                );
            }

            let wanted_typing = model.typing(location);
            if typing != wanted_typing {
                fail(
                    InvariantCheck::TypingMatches,
                    format!("{location}: tracker {typing:?}, model {wanted_typing:?}"),
                );
            }
        }

        let joins = self.sink.joins.load(Ordering::Relaxed);
        let leaves = self.sink.leaves.load(Ordering::Relaxed);
        if (joins, leaves) != (model.joins_sent, model.leaves_sent) {
            fail(
                InvariantCheck::OutboundMatches,
                format!(
                    "sent {joins} joins/{leaves} leaves, model {}/{}",
                    model.joins_sent, model.leaves_sent
                ),
            );
        }

        violations
    }
}

/// Run the presence simulator
///
/// Typing timers are Tokio tasks, so the run must happen inside a runtime.
///
/// # Errors
/// - `PulseError::Lifecycle` outside a Tokio runtime
pub fn run_simulator(config: SimulatorConfig) -> Result<SimulatorReport, PulseError> {
    if Handle::try_current().is_err() {
        return Err(PulseError::Lifecycle("simulator must run inside a Tokio runtime".into()));
    }

    let harness = Harness::new(&config);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut model = Model::default();
    let mut stats = OperationStats::default();
    let mut violations = Vec::new();

    for i in 0..config.total_operations {
        let operation = harness.generate(&mut rng);
        let expected = model.expected(&operation);
        let actual = harness.execute(&operation);
        model.apply(&operation);

        let outcome_matches = matches!(
            (expected, &actual),
            (ExpectedResult::ShouldSucceed, Ok(_)) | (ExpectedResult::ShouldFail, Err(_))
        );
        if !outcome_matches {
            debug!(index = i, op = operation.name(), "unexpected outcome");
            violations.push(Violation::UnexpectedOutcome {
                operation_index: i,
                operation: operation.clone(),
                expected,
                actual: actual.clone(),
            });
            if config.stop_on_first_violation {
                break;
            }
        }

        let broken = harness.check(&model);
        if !broken.is_empty() {
            violations.extend(broken.into_iter().map(Violation::Invariant));
            if config.stop_on_first_violation {
                break;
            }
        }

        stats.record(&operation, &actual);
    }

    let final_locations = harness.tracker.joined().len();
    let final_online = harness
        .locations
        .iter()
        .map(|location| harness.tracker.online(location).len())
        .sum();
    harness.tracker.shutdown();

    info!(
        seed = config.seed,
        operations = stats.total_operations,
        violations = violations.len(),
        "presence simulation finished"
    );

    Ok(SimulatorReport {
        config,
        stats,
        violations,
        final_locations,
        final_online,
    })
}
