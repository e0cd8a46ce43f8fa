//! Live search configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Live search configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last query change, in milliseconds
    pub debounce_ms: u64,
    /// Suggestions returned at most
    pub max_suggestions: usize,
    /// Days ahead covered by the "due this week" window, today included
    pub due_window_days: i64,
}

impl SearchConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With debounce period
    #[inline]
    #[must_use]
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// With suggestion cap
    #[inline]
    #[must_use]
    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    /// Debounce period
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            max_suggestions: 8,
            due_window_days: 7,
        }
    }
}
