//! Network-related error types for the REST collaborator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Network error type covering HTTP connection failures, timeouts, error
/// statuses and undecodable response bodies.
///
/// # Examples
///
/// ```
/// use parley_core::error::NetworkError;
///
/// let error = NetworkError::ConnectionFailed {
///     reason: "Connection refused".to_string(),
/// };
/// assert!(error.to_string().contains("Connection refused"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkError {
    /// Connection to remote host failed.
    #[error("[Network] Connection failed: {reason}")]
    ConnectionFailed {
        /// Reason for the connection failure.
        reason: String,
    },

    /// Request timed out.
    #[error("[Network] Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Server answered with an error status.
    #[error("[Network] HTTP error: status {status_code} - {reason}")]
    Http {
        /// HTTP status code.
        status_code: u16,
        /// Response body or error message.
        reason: String,
    },

    /// Server rejected the credentials (401/403).
    #[error("[Network] Unauthorized: {reason}")]
    Unauthorized {
        /// Server supplied reason.
        reason: String,
    },

    /// Response body could not be decoded.
    #[error("[Network] Failed to decode response: {reason}")]
    Decode {
        /// Decoder error.
        reason: String,
    },
}

impl NetworkError {
    /// Returns true if this error is recoverable (can be retried).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionFailed { .. } => true,
            Self::Http { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::Unauthorized { .. } | Self::Decode { .. } => false,
        }
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::Unauthorized { .. } => ErrorSeverity::Fatal,
            Self::Timeout { .. } | Self::ConnectionFailed { .. } => ErrorSeverity::Recoverable,
            Self::Http { status_code, .. } if *status_code >= 500 => ErrorSeverity::Recoverable,
            Self::Http { .. } | Self::Decode { .. } => ErrorSeverity::Warning,
        }
    }

    /// Returns a suggested retry delay in milliseconds, if applicable.
    #[must_use]
    pub fn suggested_retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::Timeout { timeout_ms } => Some(*timeout_ms / 2),
            Self::ConnectionFailed { .. } => Some(1000),
            Self::Http { status_code, .. } if *status_code == 429 => Some(2000),
            _ => None,
        }
    }
}
