//! Real-time channel: a WebSocket connection manager.
//!
//! This module provides:
//! - Token-authenticated connect with a handshake timeout
//! - Automatic reconnection with linear backoff and an attempt ceiling
//! - Heartbeat/ping-pong liveness checks
//! - Envelope encoding and decoding, malformed frames skipped
//! - A handler registry fanning inbound envelopes out to subscribers
//!
//! # Example
//!
//! ```no_run
//! use parley_core::types::MessageEnvelope;
//! use parley_gateway::ws::{ConnectionManager, WebSocketConfig};
//!
//! # async fn run() -> Result<(), parley_core::error::ConnectionError> {
//! let config = WebSocketConfig::builder()
//!     .url("ws://localhost:8080/api/ws")
//!     .max_reconnect_attempts(5)
//!     .build();
//!
//! let manager = ConnectionManager::new(config);
//! let _subscription = manager.on_message(|envelope: &MessageEnvelope| {
//!     println!("{envelope}");
//! });
//! manager.connect("token").await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod event;
mod manager;
mod message;
mod policy;
mod registry;
mod state;
mod transport;

#[cfg(test)]
mod testing;

pub use client::WebSocketClient;
pub use config::{WebSocketConfig, WebSocketConfigBuilder};
pub use event::ConnectionEvent;
pub use manager::ConnectionManager;
pub use message::{CloseReason, MessageCodec, WebSocketMessage};
pub use policy::ReconnectPolicy;
pub use registry::{HandlerId, HandlerRegistry, MessageHandler, Subscription};
pub use state::{AuthContext, ConnectionState};
pub use transport::{Connector, FrameSink, FrameStream, Transport, TungsteniteConnector};
