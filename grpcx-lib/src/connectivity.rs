use std::fmt;

use crate::error::{GrpcxError, Result};

/// Client connection state as reported by the RPC runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityState {
    Idle,
    Connecting,
    Ready,
    TransientFailure,
    Shutdown,
}

impl ConnectivityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityState::Idle => "IDLE",
            ConnectivityState::Connecting => "CONNECTING",
            ConnectivityState::Ready => "READY",
            ConnectivityState::TransientFailure => "TRANSIENT_FAILURE",
            ConnectivityState::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a client connection is usable.
///
/// `None` means the connection was never created.
pub fn check_conn_state(state: Option<ConnectivityState>) -> Result<()> {
    match state {
        None => Err(GrpcxError::ConnectionNotInitialized),
        Some(ConnectivityState::TransientFailure | ConnectivityState::Shutdown) => {
            Err(GrpcxError::ConnectionShutdown)
        }
        Some(_) => Ok(()),
    }
}
