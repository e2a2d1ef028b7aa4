//! Error types and handling framework.
//!
//! This module provides a hierarchical error type system for the Parley
//! chat client.
//!
//! # Error Hierarchy
//!
//! - `ParleyError` - Top-level error type
//!   - `ConnectionError` - Real-time channel errors (auth, transport, closes, frames)
//!   - `NetworkError` - REST collaborator errors
//!   - `ConfigError` - Configuration errors
//!
//! # Example
//!
//! ```
//! use parley_core::error::{ConnectionError, ParleyError};
//!
//! let error = ConnectionError::missing_token();
//! let top: ParleyError = error.into();
//! assert_eq!(top.category(), "connection");
//! assert!(!top.is_recoverable());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error severity levels for categorizing errors.
///
/// - `Fatal`: the operation cannot succeed without caller intervention
/// - `Recoverable`: the operation may succeed if retried
/// - `Warning`: non-critical, logged and otherwise ignored
/// - `Info`: an expected condition worth noting
///
/// # Examples
///
/// ```
/// use parley_core::error::ErrorSeverity;
///
/// let severity = ErrorSeverity::Recoverable;
/// assert!(severity.is_recoverable());
/// assert!(!severity.is_fatal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Unrecoverable without caller intervention.
    Fatal,

    /// Can be retried or recovered from.
    #[default]
    Recoverable,

    /// Non-critical issue that should be logged.
    Warning,

    /// Informational message about an expected condition.
    Info,
}

impl ErrorSeverity {
    /// Returns true if this error is recoverable (not fatal).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Fatal)
    }

    /// Returns true if this error is fatal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }

    /// Returns the severity as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Recoverable => "RECOVERABLE",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

mod config;
mod connection;
mod network;

pub use config::ConfigError;
pub use connection::ConnectionError;
pub use network::NetworkError;

/// Top-level error type for the Parley chat client.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParleyError {
    /// Real-time channel error.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// REST collaborator error.
    #[error("{0}")]
    Network(#[from] NetworkError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl ParleyError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(e) => e.severity(),
            Self::Network(e) => e.severity(),
            Self::Config(e) => e.severity(),
        }
    }

    /// Returns true if this error is recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.severity().is_recoverable()
    }

    /// Returns the error category as a string.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Network(_) => "network",
            Self::Config(_) => "config",
        }
    }

    /// Returns the inner connection error, if this is one.
    #[must_use]
    pub fn as_connection_error(&self) -> Option<&ConnectionError> {
        match self {
            Self::Connection(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the inner network error, if this is one.
    #[must_use]
    pub fn as_network_error(&self) -> Option<&NetworkError> {
        match self {
            Self::Network(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the inner config error, if this is one.
    #[must_use]
    pub fn as_config_error(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized Result type for Parley operations.
pub type Result<T> = std::result::Result<T, ParleyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity_display() {
        assert_eq!(ErrorSeverity::Fatal.to_string(), "FATAL");
        assert_eq!(ErrorSeverity::Recoverable.to_string(), "RECOVERABLE");
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARNING");
        assert_eq!(ErrorSeverity::Info.to_string(), "INFO");
    }

    #[test]
    fn test_connection_error_conversion() {
        let err = ConnectionError::transport("connection refused");
        let top: ParleyError = err.clone().into();
        assert_eq!(top.category(), "connection");
        assert_eq!(top.as_connection_error(), Some(&err));
        assert!(top.as_network_error().is_none());
    }

    #[test]
    fn test_network_error_conversion() {
        let err = NetworkError::Timeout { timeout_ms: 5000 };
        let top: ParleyError = err.clone().into();
        assert_eq!(top.category(), "network");
        assert_eq!(top.as_network_error(), Some(&err));
        assert!(top.is_recoverable());
    }

    #[test]
    fn test_config_error_conversion() {
        let err = ConfigError::missing_field("server.api_url");
        let top: ParleyError = err.clone().into();
        assert_eq!(top.category(), "config");
        assert_eq!(top.as_config_error(), Some(&err));
        assert!(!top.is_recoverable());
    }

    #[test]
    fn test_severity_delegates() {
        let auth: ParleyError = ConnectionError::missing_token().into();
        assert_eq!(auth.severity(), ErrorSeverity::Fatal);

        let dropped: ParleyError = ConnectionError::NotConnected.into();
        assert_eq!(dropped.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_serde_roundtrip() {
        let err = ParleyError::Network(NetworkError::Timeout { timeout_ms: 3000 });
        let json = serde_json::to_string(&err).unwrap();
        let parsed: ParleyError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, parsed);
    }
}
