//! Configuration traits for validation and environment overrides.

use crate::error::ConfigError;

/// Trait for types that can be validated.
///
/// # Example
///
/// ```rust
/// use parley_core::config::Validatable;
/// use parley_core::error::ConfigError;
///
/// struct Endpoint {
///     url: String,
/// }
///
/// impl Validatable for Endpoint {
///     fn validate(&self) -> Result<(), ConfigError> {
///         if self.url.is_empty() {
///             return Err(ConfigError::missing_field("url"));
///         }
///         Ok(())
///     }
/// }
///
/// assert!(Endpoint { url: String::new() }.validate().is_err());
/// ```
pub trait Validatable {
    /// Validates the configuration.
    ///
    /// Returns `Ok(())` if the configuration is valid, or the first
    /// `ConfigError` found.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Trait for types whose values may be overridden by environment variables.
///
/// Names are built as `{prefix}_{SECTION}_{FIELD}`, e.g.
/// `PARLEY_CONNECTION_MAX_RECONNECT_ATTEMPTS`.
pub trait Configurable: Sized {
    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self, prefix: &str);

    /// Returns the environment variable names that can override this configuration.
    fn env_var_names(prefix: &str) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AttemptLimit {
        value: i32,
    }

    impl Validatable for AttemptLimit {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.value < 0 {
                return Err(ConfigError::invalid_value("value", "Value must be non-negative"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_validatable() {
        assert!(AttemptLimit { value: 5 }.validate().is_ok());

        let err = AttemptLimit { value: -1 }.validate().unwrap_err();
        assert!(err.to_string().contains("value"));
    }
}
