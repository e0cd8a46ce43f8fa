//! Pulse Engine - the assembled collaboration and notification engine
//!
//! - [`PulseEngine`]: one bus, the connection manager, presence tracker,
//!   notification center and live search, started and stopped together
//! - [`EngineConfig`]: TOML configuration for every component
//! - [`simulator`]: seeded randomized testing of presence tracking
//!
//! # Example
//!
//! ```rust,no_run
//! use pulse_engine::{Collaborators, EngineConfig, PulseEngine};
//! # async fn run(collaborators: Collaborators) -> Result<(), pulse_core::PulseError> {
//! let engine = PulseEngine::new(EngineConfig::load("pulse.toml")?, collaborators);
//! engine.start()?;
//! engine.search().set_query("design");
//! engine.stop().await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod engine;
pub mod simulator;

pub use config::EngineConfig;
pub use engine::{Collaborators, PulseEngine};
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
