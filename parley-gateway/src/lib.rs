//! # Parley Gateway
//!
//! Network communication for the Parley chat client.
//!
//! This crate provides:
//! - A WebSocket connection manager with token authentication, automatic
//!   reconnection, heartbeat liveness checks and handler fan-out
//! - A REST client for login, registration, message history and user listing
//!
//! # Architecture
//!
//! The gateway module is organized into:
//! - `ws` - real-time channel (connection lifecycle, reconnection policy,
//!   handler registry, `ConnectionManager` facade)
//! - `rest` - request/response collaborator for the chat server's HTTP API
//!
//! # Example
//!
//! ```no_run
//! use parley_gateway::ws::{ConnectionManager, WebSocketConfig};
//!
//! # async fn run() -> Result<(), parley_core::error::ConnectionError> {
//! let manager = ConnectionManager::new(WebSocketConfig::default());
//! manager.connect("token").await?;
//! manager.send_chat("hello")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::all)]
#![allow(clippy::pedantic)]
#![allow(clippy::cargo)]
#![allow(clippy::nursery)]

/// WebSocket connection manager
pub mod ws;

/// REST client infrastructure
pub mod rest;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::rest::{ChatApi, RestClient, RestConfig, RestConfigBuilder};
    pub use crate::ws::{
        AuthContext, ConnectionEvent, ConnectionManager, ConnectionState, HandlerRegistry,
        MessageHandler, ReconnectPolicy, Subscription, WebSocketClient, WebSocketConfig,
        WebSocketConfigBuilder, WebSocketMessage,
    };
}
