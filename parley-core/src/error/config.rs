//! Configuration-related error types.
//!
//! Missing fields, invalid values, unreadable or unparsable files and bad
//! environment overrides.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error type covering missing fields, invalid values,
/// and file access errors.
///
/// # Examples
///
/// ```
/// use parley_core::error::ConfigError;
///
/// let error = ConfigError::MissingField {
///     field: "ws_url".to_string(),
///     section: Some("server".to_string()),
/// };
/// assert!(error.to_string().contains("ws_url"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    /// Required configuration field is missing.
    #[error("[Config] Missing field '{field}'{}", section.as_ref().map(|s| format!(" in section '{s}'")).unwrap_or_default())]
    MissingField {
        /// Name of the missing field.
        field: String,
        /// Optional section where the field should be.
        section: Option<String>,
    },

    /// Configuration value is invalid.
    #[error("[Config] Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field with the invalid value.
        field: String,
        /// Reason why the value is invalid.
        reason: String,
    },

    /// Configuration file could not be read.
    #[error("[Config] Failed to read file '{path}': {reason}")]
    FileReadError {
        /// Path to the configuration file.
        path: String,
        /// Reason for the read failure.
        reason: String,
    },

    /// Configuration file could not be written.
    #[error("[Config] Failed to write file '{path}': {reason}")]
    FileWriteError {
        /// Path to the configuration file.
        path: String,
        /// Reason for the write failure.
        reason: String,
    },

    /// Configuration file format is invalid.
    #[error("[Config] Invalid format in '{path}': {reason}")]
    InvalidFormat {
        /// Path to the configuration file.
        path: String,
        /// Reason for the format error.
        reason: String,
    },

    /// Environment variable has invalid value.
    #[error("[Config] Invalid environment variable '{name}': {reason}")]
    InvalidEnvVar {
        /// Name of the environment variable.
        name: String,
        /// Reason why the value is invalid.
        reason: String,
    },

    /// Configuration validation failed.
    #[error("[Config] Validation failed: {reason}")]
    ValidationFailed {
        /// Reason for the validation failure.
        reason: String,
    },
}

impl ConfigError {
    /// Returns true if this error is recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.severity().is_recoverable()
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::MissingField { .. } | Self::InvalidFormat { .. } => ErrorSeverity::Fatal,
            Self::InvalidValue { .. }
            | Self::FileReadError { .. }
            | Self::FileWriteError { .. }
            | Self::InvalidEnvVar { .. }
            | Self::ValidationFailed { .. } => ErrorSeverity::Warning,
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            section: None,
        }
    }

    /// Creates a missing field error with section.
    #[must_use]
    pub fn missing_field_in_section(field: impl Into<String>, section: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            section: Some(section.into()),
        }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_without_section() {
        let error = ConfigError::missing_field("api_url");
        assert!(error.to_string().contains("api_url"));
        assert!(!error.to_string().contains("section"));
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_missing_field_with_section() {
        let error = ConfigError::missing_field_in_section("ws_url", "server");
        assert!(error.to_string().contains("ws_url"));
        assert!(error.to_string().contains("server"));
    }

    #[test]
    fn test_invalid_value() {
        let error = ConfigError::invalid_value("max_reconnect_attempts", "Must be positive");
        assert!(matches!(error, ConfigError::InvalidValue { .. }));
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_serde_roundtrip() {
        let error = ConfigError::InvalidFormat {
            path: "parley.yaml".to_string(),
            reason: "Invalid YAML syntax".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        let parsed: ConfigError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, parsed);
    }
}
