//! Testing utilities for the Pulse workspace
//!
//! Shared fakes, fixtures and a scriptable in-memory transport.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

pub mod fixtures;
pub mod sinks;
pub mod transport;

pub use fixtures::{
    agency_snapshot, client, clock_on, date, member, project, snapshot_with_tasks, task_due,
};
pub use pulse_core::ManualClock;
pub use sinks::{RecordingAlertSink, RecordingSink, StaticCredentials};
pub use transport::{ChannelTransport, ScriptedServer, ServerHandle, ServerSession};
