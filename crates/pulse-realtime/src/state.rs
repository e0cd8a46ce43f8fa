//! Connection state transition table

use pulse_core::{ConnectionError, ConnectionState};

/// Validates a connection state transition.
///
/// Illegal transitions are returned as errors, never panics.
pub fn validate_transition(
    from: ConnectionState,
    to: ConnectionState,
) -> Result<(), ConnectionError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(ConnectionError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: ConnectionState) -> Vec<ConnectionState> {
    use ConnectionState::{
        AuthError, Authenticated, Connected, Connecting, Disconnected, Reconnecting,
    };
    match from {
        Disconnected => vec![Connecting],
        Connecting => vec![Connected, Reconnecting, Disconnected],
        Connected => vec![Authenticated, AuthError, Reconnecting, Disconnected],
        Authenticated => vec![Reconnecting, AuthError, Disconnected],
        AuthError => vec![Connecting, Disconnected],
        Reconnecting => vec![Connecting, Disconnected],
    }
}

fn allowed(from: ConnectionState, to: ConnectionState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
