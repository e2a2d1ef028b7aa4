//! Configuration validation utilities.

use crate::error::ConfigError;

/// Result type for validation operations.
pub type ValidationResult = Result<(), ConfigError>;

/// Context for validation operations.
///
/// Tracks the current path in the configuration tree (e.g.
/// `connection.reconnect_delay_ms`) and collects every error found.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    path: Vec<String>,
    errors: Vec<ConfigError>,
}

impl ValidationContext {
    /// Creates a new validation context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a new section in the configuration.
    pub fn enter(&mut self, section: impl Into<String>) {
        self.path.push(section.into());
    }

    /// Exits the current section.
    pub fn exit(&mut self) {
        self.path.pop();
    }

    /// Returns the current path as a dot-separated string.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.path.join(".")
    }

    /// Adds a validation error.
    pub fn add_error(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Returns true if there are no validation errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the collected validation errors.
    #[must_use]
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Consumes the context and returns the first error, if any.
    pub fn into_result(self) -> ValidationResult {
        self.errors.into_iter().next().map_or(Ok(()), Err)
    }

    /// Creates a missing field error with the current path context.
    #[must_use]
    pub fn missing_field(&self, field: impl Into<String>) -> ConfigError {
        let section = if self.path.is_empty() {
            None
        } else {
            Some(self.current_path())
        };
        ConfigError::MissingField {
            field: field.into(),
            section,
        }
    }

    /// Creates an invalid value error with the current path context.
    #[must_use]
    pub fn invalid_value(&self, field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
        let field_name = field.into();
        let full_field = if self.path.is_empty() {
            field_name
        } else {
            format!("{}.{}", self.current_path(), field_name)
        };
        ConfigError::InvalidValue {
            field: full_field,
            reason: reason.into(),
        }
    }
}

/// Fluent validator over a [`ValidationContext`].
#[derive(Debug)]
pub struct Validator<'a> {
    ctx: &'a mut ValidationContext,
}

impl<'a> Validator<'a> {
    /// Creates a new validator with the given context.
    pub fn new(ctx: &'a mut ValidationContext) -> Self {
        Self { ctx }
    }

    /// Validates that a string field is not empty or whitespace.
    pub fn require_non_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.ctx.add_error(self.ctx.missing_field(field));
        }
        self
    }

    /// Validates that a numeric value is within an inclusive range.
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        &mut self,
        field: &str,
        value: &T,
        min: &T,
        max: &T,
    ) -> &mut Self {
        if value < min || value > max {
            self.ctx.add_error(self.ctx.invalid_value(
                field,
                format!("Value {value} must be between {min} and {max}"),
            ));
        }
        self
    }

    /// Validates that a numeric value is positive.
    pub fn positive<T: PartialOrd + Default + std::fmt::Display>(
        &mut self,
        field: &str,
        value: &T,
    ) -> &mut Self {
        if *value <= T::default() {
            self.ctx
                .add_error(self.ctx.invalid_value(field, format!("Value {value} must be positive")));
        }
        self
    }

    /// Validates using a custom predicate.
    pub fn custom<F>(&mut self, field: &str, predicate: F, error_msg: &str) -> &mut Self
    where
        F: FnOnce() -> bool,
    {
        if !predicate() {
            self.ctx.add_error(self.ctx.invalid_value(field, error_msg));
        }
        self
    }

    /// Validates that a URL uses one of the given schemes.
    pub fn url_with_scheme(&mut self, field: &str, value: &str, schemes: &[&str]) -> &mut Self {
        let ok = schemes
            .iter()
            .any(|scheme| value.strip_prefix(scheme).is_some_and(|rest| rest.starts_with("://")));
        if !ok {
            let expected = schemes
                .iter()
                .map(|s| format!("{s}://"))
                .collect::<Vec<_>>()
                .join(" or ");
            self.ctx
                .add_error(self.ctx.invalid_value(field, format!("Must start with {expected}")));
        }
        self
    }

    /// Returns the validation result.
    pub fn result(&self) -> ValidationResult {
        match self.ctx.errors().first() {
            None => Ok(()),
            Some(first) => Err(first.clone()),
        }
    }
}

/// Environment variable helper for applying overrides.
///
/// Unset variables and unparsable values leave the target untouched.
///
/// # Example
///
/// ```rust
/// use parley_core::config::validation::EnvOverride;
///
/// let mut url = "ws://localhost:8080/api/ws".to_string();
/// EnvOverride::apply_string("PARLEY_DOC_UNSET_WS_URL", &mut url);
/// assert_eq!(url, "ws://localhost:8080/api/ws");
/// ```
pub struct EnvOverride;

impl EnvOverride {
    /// Applies an environment variable override to a string value.
    pub fn apply_string(var_name: &str, target: &mut String) {
        if let Ok(value) = std::env::var(var_name) {
            *target = value;
        }
    }

    /// Applies an environment variable override to an optional string value.
    pub fn apply_optional_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(value) = std::env::var(var_name) {
            *target = Some(value);
        }
    }

    /// Applies an environment variable override to a numeric value.
    pub fn apply_number<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(value) = std::env::var(var_name)
            && let Ok(parsed) = value.parse()
        {
            *target = parsed;
        }
    }

    /// Applies an environment variable override to a boolean value.
    pub fn apply_bool(var_name: &str, target: &mut bool) {
        if let Ok(value) = std::env::var(var_name) {
            match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => *target = true,
                "false" | "0" | "no" | "off" => *target = false,
                _ => {}
            }
        }
    }

    /// Applies an environment variable override to a duration in milliseconds.
    pub fn apply_duration_ms(var_name: &str, target: &mut u64) {
        Self::apply_number(var_name, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_context_path() {
        let mut ctx = ValidationContext::new();
        assert_eq!(ctx.current_path(), "");

        ctx.enter("connection");
        assert_eq!(ctx.current_path(), "connection");

        ctx.enter("heartbeat");
        assert_eq!(ctx.current_path(), "connection.heartbeat");

        ctx.exit();
        ctx.exit();
        assert_eq!(ctx.current_path(), "");
    }

    #[test]
    fn test_invalid_value_carries_path() {
        let mut ctx = ValidationContext::new();
        ctx.enter("connection");
        let err = ctx.invalid_value("reconnect_delay_ms", "Must be positive");
        assert!(err.to_string().contains("connection.reconnect_delay_ms"));
    }

    #[test]
    fn test_validator_require_non_empty() {
        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx).require_non_empty("ws_url", "   ");
        assert!(!ctx.is_valid());
    }

    #[test]
    fn test_validator_in_range() {
        let mut ctx = ValidationContext::new();
        let mut validator = Validator::new(&mut ctx);
        validator.in_range("max_reconnect_attempts", &5u32, &0, &100);
        assert!(validator.result().is_ok());

        let mut ctx = ValidationContext::new();
        let mut validator = Validator::new(&mut ctx);
        validator.in_range("max_reconnect_attempts", &500u32, &0, &100);
        assert!(validator.result().is_err());
    }

    #[test]
    fn test_validator_url_with_scheme() {
        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx)
            .url_with_scheme("ws_url", "ws://localhost:8080/api/ws", &["ws", "wss"])
            .url_with_scheme("api_url", "https://chat.example.com", &["http", "https"]);
        assert!(ctx.is_valid());

        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx).url_with_scheme("ws_url", "http://localhost", &["ws", "wss"]);
        assert_eq!(ctx.errors().len(), 1);
        assert!(ctx.errors()[0].to_string().contains("ws:// or wss://"));
    }

    #[test]
    fn test_validator_positive() {
        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx).positive("reconnect_delay_ms", &0u64);
        assert!(ctx.into_result().is_err());
    }

    #[test]
    fn test_env_override_unset_leaves_value() {
        let mut enabled = true;
        EnvOverride::apply_bool("PARLEY_TEST_UNSET_FLAG_5121", &mut enabled);
        assert!(enabled);

        let mut attempts = 5u32;
        EnvOverride::apply_number("PARLEY_TEST_UNSET_NUMBER_5121", &mut attempts);
        assert_eq!(attempts, 5);
    }
}
