//! Pulse Notify - notification engine
//!
//! - [`NotificationCenter`]: record list, read/dismiss, settings gate
//! - [`scan`]: due-soon, overdue and project deadline detection
//! - [`format`]: titles, messages, priorities and actions per kind
//! - [`SettingsStore`]: settings persistence (JSON file or memory)
//!
//! Remote events arriving on the [`CollabBus`](pulse_core::CollabBus) are
//! turned into notifications; native alerts go to an optional
//! [`AlertSink`](pulse_core::AlertSink).

#![warn(unreachable_pub)]

mod alerts;
pub mod center;
pub mod config;
pub mod format;
pub mod live;
pub mod scan;
pub mod store;

pub use center::NotificationCenter;
pub use config::NotificationConfig;
pub use scan::ScanReport;
pub use store::{JsonFileSettingsStore, MemorySettingsStore, SettingsStore};
