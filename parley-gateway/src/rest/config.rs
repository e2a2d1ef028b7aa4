//! REST client configuration.

use parley_core::config::ServerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the REST client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestConfig {
    /// Base URL for API requests.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum retry attempts for recoverable failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry delay in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Maximum retry delay in milliseconds.
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_retry_delay_ms() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    format!("Parley/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl RestConfig {
    /// Creates a new builder for `RestConfig`.
    #[must_use]
    pub fn builder() -> RestConfigBuilder {
        RestConfigBuilder::default()
    }

    /// Builds the configuration from the application's server section.
    #[must_use]
    pub fn from_settings(server: &ServerConfig) -> Self {
        Self {
            base_url: server.api_url.clone(),
            timeout_ms: server.request_timeout_ms,
            ..Self::default()
        }
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Calculates the retry delay for a given attempt using exponential backoff.
    #[must_use]
    pub fn calculate_retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt);
        let delay = self.retry_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_retry_delay_ms))
    }

    /// Returns whether a retry should be attempted.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Builder for `RestConfig`.
#[derive(Debug, Default)]
pub struct RestConfigBuilder {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    max_retry_delay_ms: Option<u64>,
    user_agent: Option<String>,
}

impl RestConfigBuilder {
    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the request timeout in milliseconds.
    #[must_use]
    pub fn timeout_ms(mut self, timeout: u64) -> Self {
        self.timeout_ms = Some(timeout);
        self
    }

    /// Sets the maximum retry attempts.
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Sets the initial retry delay in milliseconds.
    #[must_use]
    pub fn retry_delay_ms(mut self, delay: u64) -> Self {
        self.retry_delay_ms = Some(delay);
        self
    }

    /// Sets the maximum retry delay in milliseconds.
    #[must_use]
    pub fn max_retry_delay_ms(mut self, delay: u64) -> Self {
        self.max_retry_delay_ms = Some(delay);
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> RestConfig {
        RestConfig {
            base_url: self.base_url.unwrap_or_else(default_base_url),
            timeout_ms: self.timeout_ms.unwrap_or_else(default_timeout_ms),
            max_retries: self.max_retries.unwrap_or_else(default_max_retries),
            retry_delay_ms: self.retry_delay_ms.unwrap_or_else(default_retry_delay_ms),
            max_retry_delay_ms: self
                .max_retry_delay_ms
                .unwrap_or_else(default_max_retry_delay_ms),
            user_agent: self.user_agent.unwrap_or_else(default_user_agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = RestConfig::builder()
            .base_url("https://chat.example.com")
            .timeout_ms(5_000)
            .max_retries(4)
            .build();

        assert_eq!(config.base_url, "https://chat.example.com");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.should_retry(3));
        assert!(!config.should_retry(4));
        assert!(config.user_agent.starts_with("Parley/"));
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let config = RestConfig::builder()
            .retry_delay_ms(500)
            .max_retry_delay_ms(3_000)
            .build();

        assert_eq!(config.calculate_retry_delay(0), Duration::from_millis(500));
        assert_eq!(config.calculate_retry_delay(1), Duration::from_millis(1_000));
        assert_eq!(config.calculate_retry_delay(3), Duration::from_millis(3_000));
        assert_eq!(config.calculate_retry_delay(64), Duration::from_millis(3_000));
    }

    #[test]
    fn test_from_settings() {
        let server = ServerConfig {
            api_url: "https://chat.example.com".to_string(),
            request_timeout_ms: 1_500,
            ..ServerConfig::default()
        };
        let config = RestConfig::from_settings(&server);
        assert_eq!(config.base_url, "https://chat.example.com");
        assert_eq!(config.timeout_ms, 1_500);
    }
}
