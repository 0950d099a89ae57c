use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::codec::CodecError;

// -----------------------------------------------------------------------------
// ----- SessionError ----------------------------------------------------------

/// Everything the session surface can fail with. Command-level failures
/// (`Nack`, `Timeout`, `Closing`, `ConnectionLost`) are returned to the
/// individual caller and never take down the dispatcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Transport-level failure before or during the handshake. Retryable
    /// with backoff; the credentials are not the problem.
    #[error("gateway unreachable: {reason}")]
    Unreachable { reason: String },

    /// The gateway itself rejected (or demanded) credentials.
    #[error("authentication rejected: {0}")]
    AuthRejected(AuthRejection),

    /// Unexpected frame where the protocol allows no such thing.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No acknowledgement within the configured window.
    #[error("command not acknowledged within {0:?}")]
    Timeout(Duration),

    /// The gateway answered NACK.
    #[error("command rejected by gateway")]
    Nack,

    /// The transport died while the command was queued or in flight.
    #[error("connection to gateway lost")]
    ConnectionLost,

    /// The session is shutting down (or was never running).
    #[error("session is closing")]
    Closing,

    /// The command failed the codec validity check; nothing was queued.
    #[error("invalid command: {0}")]
    InvalidCommand(#[from] CodecError),
}

// -----------------------------------------------------------------------------
// ----- AuthRejection ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// The gateway wants a password and none is configured.
    PasswordRequired,

    /// The configured password was refused.
    PasswordError,
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthRejection::PasswordRequired => f.write_str("password required"),
            AuthRejection::PasswordError => f.write_str("password refused"),
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Conversions -----------------------------------------------------------

impl SessionError {
    pub fn unreachable(err: &std::io::Error) -> Self {
        SessionError::Unreachable {
            reason: err.to_string(),
        }
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
