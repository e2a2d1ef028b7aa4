//! Real-time channel error types.
//!
//! Covers the failure modes of the WebSocket connection manager: credential
//! problems before any network call, transport failures before the channel
//! opens, closes after it opened, sends while not open and malformed inbound
//! frames.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the connection manager.
///
/// Handshake failures (`Auth`, `Transport`, `Timeout`, `InvalidEndpoint`) are
/// returned to the caller of `connect`. `UnexpectedClose`, `NotConnected` and
/// `MalformedFrame` occur after `connect` has resolved; the manager absorbs
/// them and reports them through its event stream.
///
/// # Examples
///
/// ```
/// use parley_core::error::ConnectionError;
///
/// let error = ConnectionError::missing_token();
/// assert!(error.is_auth());
/// assert!(error.to_string().contains("token"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionError {
    /// No usable credential was supplied at connect time.
    #[error("[Connection] Authentication failed: {reason}")]
    Auth {
        /// Why the credential was rejected.
        reason: String,
    },

    /// The transport failed before reaching the open state.
    #[error("[Connection] Transport error: {reason}")]
    Transport {
        /// Description of the transport failure.
        reason: String,
    },

    /// The handshake did not complete in time.
    #[error("[Connection] Connect timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The endpoint URL could not be built.
    #[error("[Connection] Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint {
        /// The offending URL.
        url: String,
        /// Parse failure.
        reason: String,
    },

    /// The transport closed after it had been open.
    #[error("[Connection] Connection closed unexpectedly: {reason}")]
    UnexpectedClose {
        /// Close reason reported by the transport, if any.
        reason: String,
    },

    /// A send was attempted while the channel was not open.
    #[error("[Connection] Not connected, message dropped")]
    NotConnected,

    /// An inbound frame could not be parsed into an envelope.
    #[error("[Connection] Malformed frame: {reason}")]
    MalformedFrame {
        /// Parse failure.
        reason: String,
    },

    /// The pending connect was abandoned by an explicit disconnect.
    #[error("[Connection] Connect cancelled by disconnect")]
    Cancelled,
}

impl ConnectionError {
    /// Creates the error returned when `connect` is called without a token.
    #[must_use]
    pub fn missing_token() -> Self {
        Self::Auth {
            reason: "no authentication token supplied".to_string(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Creates an unexpected close error.
    #[must_use]
    pub fn unexpected_close(reason: impl Into<String>) -> Self {
        Self::UnexpectedClose {
            reason: reason.into(),
        }
    }

    /// Creates a malformed frame error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }

    /// Returns true for credential errors.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Returns true for failures that happened before the channel opened.
    #[must_use]
    pub fn is_handshake_failure(&self) -> bool {
        matches!(
            self,
            Self::Auth { .. } | Self::Transport { .. } | Self::Timeout { .. } | Self::InvalidEndpoint { .. }
        )
    }

    /// Returns true if the reconnection policy may act on this error.
    ///
    /// Only closes after a successful open drive automatic reconnection.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnexpectedClose { .. })
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::Auth { .. } | Self::InvalidEndpoint { .. } => ErrorSeverity::Fatal,
            Self::Transport { .. } | Self::Timeout { .. } | Self::UnexpectedClose { .. } => {
                ErrorSeverity::Recoverable
            }
            Self::NotConnected | Self::MalformedFrame { .. } => ErrorSeverity::Warning,
            Self::Cancelled => ErrorSeverity::Info,
        }
    }
}
