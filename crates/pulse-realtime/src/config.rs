//! Connection and presence configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// First reconnect delay in milliseconds
    pub initial_delay_ms: u64,
    /// Reconnect delay ceiling in milliseconds
    pub max_delay_ms: u64,
    /// Growth factor between attempts
    pub backoff_multiplier: f64,
    /// Reconnect attempts before giving up
    pub max_attempts: u32,
    /// Ping period while authenticated, in milliseconds
    pub heartbeat_interval_ms: u64,
    /// Pong deadline after a ping, in milliseconds
    pub heartbeat_timeout_ms: u64,
    /// Deadline for the authentication answer, in milliseconds
    pub auth_timeout_ms: u64,
}

impl ConnectionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With backoff parameters
    #[inline]
    #[must_use]
    pub fn with_backoff(mut self, initial_ms: u64, max_ms: u64, multiplier: f64) -> Self {
        self.initial_delay_ms = initial_ms;
        self.max_delay_ms = max_ms;
        self.backoff_multiplier = multiplier;
        self
    }

    /// With reconnect bound
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// With heartbeat period and pong deadline
    #[inline]
    #[must_use]
    pub fn with_heartbeat(mut self, interval_ms: u64, timeout_ms: u64) -> Self {
        self.heartbeat_interval_ms = interval_ms;
        self.heartbeat_timeout_ms = timeout_ms;
        self
    }

    /// With authentication deadline
    #[inline]
    #[must_use]
    pub fn with_auth_timeout(mut self, timeout_ms: u64) -> Self {
        self.auth_timeout_ms = timeout_ms;
        self
    }

    /// Delay before reconnect attempt `attempt` (1-based)
    ///
    /// `initial * multiplier^(attempt-1)`, capped at the ceiling.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        #[allow(clippy::cast_precision_loss)]
        let raw = self.initial_delay_ms as f64 * self.backoff_multiplier.max(1.0).powi(exponent);
        #[allow(clippy::cast_precision_loss)]
        let ceiling = self.max_delay_ms as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ms = raw.min(ceiling).max(0.0) as u64;
        Duration::from_millis(ms)
    }

    /// Ping period
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }

    /// Pong deadline
    #[must_use]
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    /// Authentication deadline
    #[must_use]
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            max_attempts: 5,
            heartbeat_interval_ms: 25_000,
            heartbeat_timeout_ms: 10_000,
            auth_timeout_ms: 10_000,
        }
    }
}

/// Presence tracker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Typing indicator lifetime in milliseconds
    pub typing_ttl_ms: u64,
}

impl PresenceConfig {
    /// With typing indicator lifetime
    #[inline]
    #[must_use]
    pub fn with_typing_ttl(mut self, ttl_ms: u64) -> Self {
        self.typing_ttl_ms = ttl_ms;
        self
    }

    /// Typing indicator lifetime
    #[must_use]
    pub fn typing_ttl(&self) -> Duration {
        Duration::from_millis(self.typing_ttl_ms)
    }

    /// Minimum gap between repeated local `typing{true}` messages
    #[must_use]
    pub fn typing_refresh(&self) -> Duration {
        self.typing_ttl() / 2
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            typing_ttl_ms: 3_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let config = ConnectionConfig::default();
        assert_eq!(config.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(4));
        assert_eq!(config.backoff_delay(5), Duration::from_secs(16));
        assert_eq!(config.backoff_delay(6), Duration::from_secs(30));
        assert_eq!(config.backoff_delay(60), Duration::from_secs(30));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: ConnectionConfig = serde_json::from_str(r#"{"max_attempts": 2}"#).unwrap();
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.initial_delay_ms, 1_000);
    }
}
