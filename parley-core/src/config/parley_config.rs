//! Parley client configuration structures.

use super::traits::{Configurable, Validatable};
use super::validation::{EnvOverride, ValidationContext, Validator};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level client configuration.
///
/// # Example YAML
///
/// ```yaml
/// server:
///   api_url: "https://chat.example.com"
///   ws_url: "wss://chat.example.com/api/ws"
///
/// connection:
///   max_reconnect_attempts: 5
///   reconnect_delay_ms: 1000
///
/// logging:
///   level: debug
///   format: compact
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ParleyConfig {
    /// Server endpoints.
    #[serde(default)]
    pub server: ServerConfig,

    /// Real-time channel behaviour.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Credential store location.
    #[serde(default)]
    pub session: SessionConfig,
}

impl Validatable for ParleyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut ctx = ValidationContext::new();

        ctx.enter("server");
        self.server.validate_with_context(&mut ctx);
        ctx.exit();

        ctx.enter("connection");
        self.connection.validate_with_context(&mut ctx);
        ctx.exit();

        ctx.enter("logging");
        self.logging.validate_with_context(&mut ctx);
        ctx.exit();

        ctx.into_result()
    }
}

impl Configurable for ParleyConfig {
    /// Applies overrides such as `PARLEY_SERVER_WS_URL` or
    /// `PARLEY_CONNECTION_RECONNECT_DELAY_MS`.
    fn apply_env_overrides(&mut self, prefix: &str) {
        self.server.apply_env_overrides(&format!("{prefix}_SERVER"));
        self.connection.apply_env_overrides(&format!("{prefix}_CONNECTION"));
        self.logging.apply_env_overrides(&format!("{prefix}_LOGGING"));
        self.session.apply_env_overrides(&format!("{prefix}_SESSION"));
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        let sections: [(&str, &[&str]); 4] = [
            ("SERVER", &["API_URL", "WS_URL", "REQUEST_TIMEOUT_MS"]),
            (
                "CONNECTION",
                &[
                    "MAX_RECONNECT_ATTEMPTS",
                    "RECONNECT_DELAY_MS",
                    "CONNECT_TIMEOUT_MS",
                    "HEARTBEAT_INTERVAL_MS",
                    "PONG_TIMEOUT_MS",
                    "AUTO_PING",
                    "RECONNECT_ENABLED",
                ],
            ),
            ("LOGGING", &["LEVEL", "FORMAT", "DIRECTORY"]),
            ("SESSION", &["FILE"]),
        ];
        sections
            .iter()
            .flat_map(|(section, fields)| {
                fields
                    .iter()
                    .map(move |field| format!("{prefix}_{section}_{field}"))
            })
            .collect()
    }
}

/// Server endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Base URL of the REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// WebSocket endpoint; the token is appended as a `token` query parameter.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// REST request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8080/api/ws".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ws_url: default_ws_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServerConfig {
    fn validate_with_context(&self, ctx: &mut ValidationContext) {
        Validator::new(ctx)
            .require_non_empty("api_url", &self.api_url)
            .url_with_scheme("api_url", &self.api_url, &["http", "https"])
            .require_non_empty("ws_url", &self.ws_url)
            .url_with_scheme("ws_url", &self.ws_url, &["ws", "wss"])
            .positive("request_timeout_ms", &self.request_timeout_ms);
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        EnvOverride::apply_string(&format!("{prefix}_API_URL"), &mut self.api_url);
        EnvOverride::apply_string(&format!("{prefix}_WS_URL"), &mut self.ws_url);
        EnvOverride::apply_duration_ms(
            &format!("{prefix}_REQUEST_TIMEOUT_MS"),
            &mut self.request_timeout_ms,
        );
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Real-time channel behaviour: reconnection policy, timeouts and heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Maximum automatic reconnection attempts after an unexpected close.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Base reconnection delay; attempt `n` waits `n * reconnect_delay_ms`.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Handshake timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Interval between keep-alive pings in milliseconds.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// How long to wait for a pong before treating the link as dead.
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,

    /// Whether to send keep-alive pings.
    #[serde(default = "default_true")]
    pub auto_ping: bool,

    /// Whether to reconnect automatically after an unexpected close.
    #[serde(default = "default_true")]
    pub reconnect_enabled: bool,
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_pong_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
            auto_ping: true,
            reconnect_enabled: true,
        }
    }
}

impl ConnectionConfig {
    fn validate_with_context(&self, ctx: &mut ValidationContext) {
        Validator::new(ctx)
            .in_range("max_reconnect_attempts", &self.max_reconnect_attempts, &0, &100)
            .positive("reconnect_delay_ms", &self.reconnect_delay_ms)
            .positive("connect_timeout_ms", &self.connect_timeout_ms)
            .positive("heartbeat_interval_ms", &self.heartbeat_interval_ms)
            .positive("pong_timeout_ms", &self.pong_timeout_ms);
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        EnvOverride::apply_number(
            &format!("{prefix}_MAX_RECONNECT_ATTEMPTS"),
            &mut self.max_reconnect_attempts,
        );
        EnvOverride::apply_duration_ms(
            &format!("{prefix}_RECONNECT_DELAY_MS"),
            &mut self.reconnect_delay_ms,
        );
        EnvOverride::apply_duration_ms(
            &format!("{prefix}_CONNECT_TIMEOUT_MS"),
            &mut self.connect_timeout_ms,
        );
        EnvOverride::apply_duration_ms(
            &format!("{prefix}_HEARTBEAT_INTERVAL_MS"),
            &mut self.heartbeat_interval_ms,
        );
        EnvOverride::apply_duration_ms(&format!("{prefix}_PONG_TIMEOUT_MS"), &mut self.pong_timeout_ms);
        EnvOverride::apply_bool(&format!("{prefix}_AUTO_PING"), &mut self.auto_ping);
        EnvOverride::apply_bool(&format!("{prefix}_RECONNECT_ENABLED"), &mut self.reconnect_enabled);
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact).
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for daily-rolling log files; stdout only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    const LEVELS: [&'static str; 5] = ["trace", "debug", "info", "warn", "error"];
    const FORMATS: [&'static str; 3] = ["pretty", "json", "compact"];

    fn validate_with_context(&self, ctx: &mut ValidationContext) {
        let level = self.level.to_lowercase();
        let format = self.format.to_lowercase();
        Validator::new(ctx)
            .custom(
                "level",
                || Self::LEVELS.contains(&level.as_str()),
                "Must be one of trace, debug, info, warn, error",
            )
            .custom(
                "format",
                || Self::FORMATS.contains(&format.as_str()),
                "Must be one of pretty, json, compact",
            );
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        EnvOverride::apply_string(&format!("{prefix}_LEVEL"), &mut self.level);
        EnvOverride::apply_string(&format!("{prefix}_FORMAT"), &mut self.format);
        EnvOverride::apply_optional_string(&format!("{prefix}_DIRECTORY"), &mut self.directory);
    }
}

/// Where the CLI keeps the bearer token between invocations.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Session file path; defaults to `$HOME/.parley/session.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl SessionConfig {
    fn apply_env_overrides(&mut self, prefix: &str) {
        EnvOverride::apply_optional_string(&format!("{prefix}_FILE"), &mut self.file);
    }

    /// Resolves the session file path.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        if let Some(file) = &self.file {
            return PathBuf::from(file);
        }
        std::env::var_os("HOME")
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
            .join(".parley")
            .join("session.json")
    }
}
