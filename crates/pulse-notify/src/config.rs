//! Notification engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Notification engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Records kept in the in-app list
    pub max_notifications: usize,
    /// Period of the due/overdue scan in seconds
    pub scan_interval_secs: u64,
    /// Native alert lifetime in milliseconds
    pub auto_dismiss_ms: u64,
    /// Also auto-close high-priority native alerts
    pub auto_dismiss_high_priority: bool,
    /// Characters of comment text kept in comment/mention notifications
    pub excerpt_chars: usize,
}

impl NotificationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With list cap
    #[inline]
    #[must_use]
    pub fn with_max_notifications(mut self, max: usize) -> Self {
        self.max_notifications = max;
        self
    }

    /// With scan period
    #[inline]
    #[must_use]
    pub fn with_scan_interval_secs(mut self, secs: u64) -> Self {
        self.scan_interval_secs = secs;
        self
    }

    /// With native alert auto-close behaviour
    #[inline]
    #[must_use]
    pub fn with_auto_dismiss(mut self, after_ms: u64, high_priority: bool) -> Self {
        self.auto_dismiss_ms = after_ms;
        self.auto_dismiss_high_priority = high_priority;
        self
    }

    /// Scan period
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    /// Native alert lifetime
    #[must_use]
    pub fn auto_dismiss_after(&self) -> Duration {
        Duration::from_millis(self.auto_dismiss_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_notifications: 50,
            scan_interval_secs: 3_600,
            auto_dismiss_ms: 5_000,
            auto_dismiss_high_priority: false,
            excerpt_chars: 120,
        }
    }
}
