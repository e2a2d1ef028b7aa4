//! WebSocket connection manager configuration.

use parley_core::config::{ConnectionConfig, ServerConfig};
use parley_core::error::ConnectionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::policy::ReconnectPolicy;

/// Configuration for the WebSocket connection manager.
///
/// Contains the endpoint, reconnection parameters and heartbeat settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebSocketConfig {
    /// WebSocket endpoint URL, without the token.
    #[serde(default = "default_url")]
    pub url: String,

    /// Handshake timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Whether automatic reconnection is enabled.
    #[serde(default = "default_true")]
    pub reconnect_enabled: bool,

    /// Maximum number of reconnection attempts per disconnection episode.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Base reconnection delay in milliseconds; attempt `n` waits `n` times this.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Heartbeat/ping interval in milliseconds.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Pong timeout in milliseconds (how long to wait for pong after ping).
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,

    /// Whether to send ping frames automatically.
    #[serde(default = "default_true")]
    pub auto_ping: bool,

    /// Capacity of the outbound frame queue.
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,

    /// Capacity of the lifecycle event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_url() -> String {
    "ws://localhost:8080/api/ws".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    1_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_pong_timeout_ms() -> u64 {
    10_000
}

fn default_outbound_capacity() -> usize {
    256
}

fn default_event_capacity() -> usize {
    64
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            reconnect_enabled: default_true(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
            auto_ping: default_true(),
            outbound_capacity: default_outbound_capacity(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl WebSocketConfig {
    /// Creates a new builder for `WebSocketConfig`.
    #[must_use]
    pub fn builder() -> WebSocketConfigBuilder {
        WebSocketConfigBuilder::default()
    }

    /// Builds the configuration from the application's server and connection sections.
    #[must_use]
    pub fn from_settings(server: &ServerConfig, connection: &ConnectionConfig) -> Self {
        Self {
            url: server.ws_url.clone(),
            connect_timeout_ms: connection.connect_timeout_ms,
            reconnect_enabled: connection.reconnect_enabled,
            max_reconnect_attempts: connection.max_reconnect_attempts,
            reconnect_delay_ms: connection.reconnect_delay_ms,
            heartbeat_interval_ms: connection.heartbeat_interval_ms,
            pong_timeout_ms: connection.pong_timeout_ms,
            auto_ping: connection.auto_ping,
            ..Self::default()
        }
    }

    /// Returns the connection timeout as a Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the heartbeat interval as a Duration, never shorter than 1ms.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }

    /// Returns the pong timeout as a Duration, never shorter than 1ms.
    #[must_use]
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms.max(1))
    }

    /// Returns the reconnection policy described by this configuration.
    #[must_use]
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        if self.reconnect_enabled {
            ReconnectPolicy::new(
                self.max_reconnect_attempts,
                Duration::from_millis(self.reconnect_delay_ms),
            )
        } else {
            ReconnectPolicy::disabled()
        }
    }

    /// Builds the handshake URL carrying `token` as the `token` query parameter.
    ///
    /// Any `token` parameter already present in the configured URL is replaced.
    ///
    /// # Example
    ///
    /// ```
    /// use parley_gateway::ws::WebSocketConfig;
    ///
    /// let config = WebSocketConfig::builder().url("ws://localhost:8080/api/ws").build();
    /// let url = config.endpoint_url("abc").unwrap();
    /// assert_eq!(url, "ws://localhost:8080/api/ws?token=abc");
    /// ```
    pub fn endpoint_url(&self, token: &str) -> Result<String, ConnectionError> {
        let invalid = |reason: String| ConnectionError::InvalidEndpoint {
            url: self.url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }

        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "token")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair("token", token);

        Ok(url.into())
    }
}

/// Builder for `WebSocketConfig`.
#[derive(Debug, Default)]
pub struct WebSocketConfigBuilder {
    url: Option<String>,
    connect_timeout_ms: Option<u64>,
    reconnect_enabled: Option<bool>,
    max_reconnect_attempts: Option<u32>,
    reconnect_delay_ms: Option<u64>,
    heartbeat_interval_ms: Option<u64>,
    pong_timeout_ms: Option<u64>,
    auto_ping: Option<bool>,
    outbound_capacity: Option<usize>,
    event_capacity: Option<usize>,
}

impl WebSocketConfigBuilder {
    /// Sets the WebSocket URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the connection timeout in milliseconds.
    #[must_use]
    pub fn connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.connect_timeout_ms = Some(timeout);
        self
    }

    /// Enables or disables automatic reconnection.
    #[must_use]
    pub fn reconnect_enabled(mut self, enabled: bool) -> Self {
        self.reconnect_enabled = Some(enabled);
        self
    }

    /// Sets the maximum reconnection attempts.
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Sets the base reconnection delay in milliseconds.
    #[must_use]
    pub fn reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.reconnect_delay_ms = Some(delay);
        self
    }

    /// Sets the heartbeat interval in milliseconds.
    #[must_use]
    pub fn heartbeat_interval_ms(mut self, interval: u64) -> Self {
        self.heartbeat_interval_ms = Some(interval);
        self
    }

    /// Sets the pong timeout in milliseconds.
    #[must_use]
    pub fn pong_timeout_ms(mut self, timeout: u64) -> Self {
        self.pong_timeout_ms = Some(timeout);
        self
    }

    /// Enables or disables automatic ping.
    #[must_use]
    pub fn auto_ping(mut self, enabled: bool) -> Self {
        self.auto_ping = Some(enabled);
        self
    }

    /// Sets the outbound queue capacity.
    #[must_use]
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = Some(capacity);
        self
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> WebSocketConfig {
        WebSocketConfig {
            url: self.url.unwrap_or_else(default_url),
            connect_timeout_ms: self
                .connect_timeout_ms
                .unwrap_or_else(default_connect_timeout_ms),
            reconnect_enabled: self.reconnect_enabled.unwrap_or_else(default_true),
            max_reconnect_attempts: self
                .max_reconnect_attempts
                .unwrap_or_else(default_max_reconnect_attempts),
            reconnect_delay_ms: self
                .reconnect_delay_ms
                .unwrap_or_else(default_reconnect_delay_ms),
            heartbeat_interval_ms: self
                .heartbeat_interval_ms
                .unwrap_or_else(default_heartbeat_interval_ms)
                .max(1),
            pong_timeout_ms: self
                .pong_timeout_ms
                .unwrap_or_else(default_pong_timeout_ms)
                .max(1),
            auto_ping: self.auto_ping.unwrap_or_else(default_true),
            outbound_capacity: self
                .outbound_capacity
                .unwrap_or_else(default_outbound_capacity)
                .max(1),
            event_capacity: self.event_capacity.unwrap_or_else(default_event_capacity).max(1),
        }
    }
}
