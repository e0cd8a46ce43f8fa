//! Error types for Pulse
//!
//! Provides the error taxonomy shared by every component:
//! - Transport failures (transient, retried with backoff)
//! - Authentication failures (terminal for the session)
//! - Native alert delivery failures (logged, never fatal)
//! - Scan and search failures (skipped per entity, logged)
//! - Settings persistence failures

use crate::types::{ConnectionState, Location};

/// Main Pulse error type
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// Connection manager error
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Presence tracker error
    #[error("presence error: {0}")]
    Presence(#[from] PresenceError),

    /// Native alert delivery error
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Scan job error
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// Search error
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Settings persistence error
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Engine already running or not started
    #[error("engine lifecycle error: {0}")]
    Lifecycle(String),
}

impl PulseError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection(ConnectionError::Transport(_) | ConnectionError::NotConnected)
        )
    }

    /// Check if the user must supply a fresh credential
    #[inline]
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::Connection(ConnectionError::Auth(_)))
    }
}

/// Transport-level failures; always transient
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Could not open a link
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Link closed by the peer or the network
    #[error("link closed")]
    Closed,

    /// Outbound queue is full
    #[error("outbound queue saturated")]
    Saturated,

    /// No pong for a ping within the heartbeat timeout
    #[error("heartbeat {seq} not acknowledged within {timeout_ms}ms")]
    HeartbeatTimeout {
        /// Unanswered ping
        seq: u64,
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// No answer to the authenticate message
    #[error("no authentication answer within {timeout_ms}ms")]
    AuthTimeout {
        /// Timeout that elapsed
        timeout_ms: u64,
    },
}

/// Authentication failures; never retried automatically
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credential available
    #[error("no credential available")]
    MissingCredential,

    /// Server rejected the credential
    #[error("credential rejected: {0}")]
    Rejected(String),
}

/// Connection manager errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Authentication failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// No authenticated session to send through
    #[error("not connected")]
    NotConnected,

    /// Transition outside the state table
    #[error("illegal connection state transition {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: ConnectionState,
        /// Requested state
        to: ConnectionState,
    },

    /// Retry budget exhausted
    #[error("reconnect failed after {attempts} attempts")]
    ReconnectExhausted {
        /// Attempts made
        attempts: u32,
    },
}

/// Presence tracker errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresenceError {
    /// Location not joined
    #[error("location not joined: {0}")]
    NotJoined(Location),
}

/// Native alert failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// User denied permission
    #[error("permission denied")]
    PermissionDenied,

    /// Platform has no native alerts
    #[error("native alerts unavailable")]
    Unavailable,

    /// Platform error
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Per-entity scan failures; the entity is skipped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// Due/end date cannot be parsed
    #[error("{entity} {id} has malformed date {raw:?}")]
    MalformedDate {
        /// `task` or `project`
        entity: &'static str,
        /// Entity ID
        id: u64,
        /// Raw date string
        raw: String,
    },

    /// Required field missing
    #[error("{entity} {id} is missing {field}")]
    MissingField {
        /// `task` or `project`
        entity: &'static str,
        /// Entity ID
        id: u64,
        /// Field name
        field: &'static str,
    },
}

/// Search failures; the offending field counts as non-matching
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Query could not be compiled into a matcher
    #[error("invalid query pattern: {0}")]
    InvalidPattern(String),
}

/// Settings persistence failures
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// I/O failure
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data cannot be decoded
    #[error("settings format: {0}")]
    Format(#[from] serde_json::Error),

    /// Store-specific failure
    #[error("settings store: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_error_display() {
        let err = PulseError::Config("bad".to_string());
        assert!(err.to_string().contains("configuration error"));
    }

    #[test]
    fn pulse_error_is_retryable() {
        assert!(PulseError::from(ConnectionError::from(TransportError::Closed)).is_retryable());
        assert!(PulseError::from(ConnectionError::NotConnected).is_retryable());
        assert!(
            !PulseError::from(ConnectionError::from(AuthError::MissingCredential)).is_retryable()
        );
        assert!(!PulseError::from(DeliveryError::PermissionDenied).is_retryable());
    }

    #[test]
    fn pulse_error_requires_reauth() {
        let err = PulseError::from(ConnectionError::from(AuthError::Rejected("expired".into())));
        assert!(err.requires_reauth());
        assert!(err.to_string().contains("credential rejected: expired"));
    }

    #[test]
    fn scan_error_display() {
        let err = ScanError::MalformedDate {
            entity: "task",
            id: 4,
            raw: "soon".into(),
        };
        assert_eq!(err.to_string(), r#"task 4 has malformed date "soon""#);
    }
}
