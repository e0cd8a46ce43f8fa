//! Pulse Realtime - live session and presence
//!
//! - [`ConnectionManager`]: connect, authenticate, heartbeat, reconnect
//! - [`PresenceTracker`]: per-location rosters and typing indicators
//! - [`state`]: the connection state transition table
//!
//! Both components talk to the rest of the engine only through the shared
//! [`CollabBus`](pulse_core::CollabBus).

#![warn(unreachable_pub)]

pub mod config;
pub mod connection;
pub mod presence;
pub mod state;

pub use config::{ConnectionConfig, PresenceConfig};
pub use connection::{ConnectionManager, ConnectionStatus};
pub use presence::PresenceTracker;
pub use state::{allowed_transitions, validate_transition};
