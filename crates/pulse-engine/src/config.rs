//! Engine configuration
//!
//! One TOML document with a table per component. Every field has a default,
//! so a partial file (or none at all) is valid.
//!
//! ```toml
//! [connection]
//! max_attempts = 8
//!
//! [notifications]
//! auto_dismiss_high_priority = true
//! ```

use pulse_core::PulseError;
use pulse_notify::NotificationConfig;
use pulse_realtime::{ConnectionConfig, PresenceConfig};
use pulse_search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of every component
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Connection manager
    pub connection: ConnectionConfig,
    /// Presence tracker
    pub presence: PresenceConfig,
    /// Notification engine
    pub notifications: NotificationConfig,
    /// Live search
    pub search: SearchConfig,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With connection configuration
    #[inline]
    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    /// With presence configuration
    #[inline]
    #[must_use]
    pub fn with_presence(mut self, presence: PresenceConfig) -> Self {
        self.presence = presence;
        self
    }

    /// With notification configuration
    #[inline]
    #[must_use]
    pub fn with_notifications(mut self, notifications: NotificationConfig) -> Self {
        self.notifications = notifications;
        self
    }

    /// With search configuration
    #[inline]
    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// - `PulseError::Config` on malformed TOML or mistyped fields
    pub fn from_toml_str(text: &str) -> Result<Self, PulseError> {
        toml::from_str(text).map_err(|err| PulseError::Config(err.to_string()))
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// - `PulseError::Config` if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PulseError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| PulseError::Config(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// - `PulseError::Config` if a value cannot be represented in TOML
    pub fn to_toml_string(&self) -> Result<String, PulseError> {
        toml::to_string_pretty(self).map_err(|err| PulseError::Config(err.to_string()))
    }
}
