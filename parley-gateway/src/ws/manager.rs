//! Application-facing facade over the connection lifecycle and handler registry.

use parley_core::config::ParleyConfig;
use parley_core::error::ConnectionError;
use parley_core::types::MessageEnvelope;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use super::client::WebSocketClient;
use super::config::WebSocketConfig;
use super::event::ConnectionEvent;
use super::registry::{HandlerRegistry, MessageHandler, Subscription};
use super::state::{AuthContext, ConnectionState};
use super::transport::{Connector, TungsteniteConnector};

/// Single entry point for the real-time channel.
///
/// Cheap to clone; every clone drives the same connection. The connection is
/// closed when the last clone is dropped.
///
/// # Example
///
/// ```no_run
/// use parley_core::types::MessageEnvelope;
/// use parley_gateway::ws::{ConnectionManager, WebSocketConfig};
///
/// # async fn run() -> Result<(), parley_core::error::ConnectionError> {
/// let manager = ConnectionManager::new(WebSocketConfig::default());
/// manager
///     .on_message(|envelope: &MessageEnvelope| println!("{envelope}"))
///     .detach();
/// manager.connect_as("alice", "token").await?;
/// manager.send_chat("hello")?;
/// manager.disconnect();
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

#[derive(Debug)]
struct ManagerInner {
    client: WebSocketClient,
    registry: Arc<HandlerRegistry>,
}

impl ConnectionManager {
    /// Creates a manager that connects with tokio-tungstenite.
    #[must_use]
    pub fn new(config: WebSocketConfig) -> Self {
        Self::with_connector(config, Arc::new(TungsteniteConnector::new()))
    }

    /// Creates a manager from the application configuration.
    #[must_use]
    pub fn from_config(config: &ParleyConfig) -> Self {
        Self::new(WebSocketConfig::from_settings(&config.server, &config.connection))
    }

    /// Creates a manager with a custom transport.
    #[must_use]
    pub fn with_connector(config: WebSocketConfig, connector: Arc<dyn Connector>) -> Self {
        let registry = Arc::new(HandlerRegistry::new());
        let client = WebSocketClient::new(config, connector, Arc::clone(&registry));
        Self {
            inner: Arc::new(ManagerInner { client, registry }),
        }
    }

    /// Opens the channel with a bearer token.
    ///
    /// # Errors
    ///
    /// See [`WebSocketClient::connect`].
    pub async fn connect(&self, token: impl Into<String>) -> Result<(), ConnectionError> {
        self.inner.client.connect(AuthContext::new(token)).await
    }

    /// Opens the channel and remembers `username` for [`Self::send_chat`].
    ///
    /// # Errors
    ///
    /// See [`WebSocketClient::connect`].
    pub async fn connect_as(
        &self,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<(), ConnectionError> {
        self.inner
            .client
            .connect(AuthContext::new(token).with_identity(username))
            .await
    }

    /// Sends an envelope if the channel is open.
    ///
    /// # Errors
    ///
    /// `NotConnected` when the channel is not open; the envelope is dropped.
    pub fn send(&self, envelope: &MessageEnvelope) -> Result<(), ConnectionError> {
        self.inner.client.send(envelope)
    }

    /// Sends a chat message stamped with the current time as the connected user.
    ///
    /// # Errors
    ///
    /// `NotConnected` when the channel is not open.
    pub fn send_chat(&self, content: impl Into<String>) -> Result<(), ConnectionError> {
        let username = self.inner.client.identity().unwrap_or_default();
        self.send(&MessageEnvelope::chat(username, content))
    }

    /// Closes the channel and cancels any pending reconnection.
    pub fn disconnect(&self) {
        self.inner.client.disconnect();
    }

    /// Registers a handler for inbound envelopes.
    pub fn on_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&MessageEnvelope) + Send + Sync + 'static,
    {
        self.add_message_handler(Arc::new(handler))
    }

    /// Registers a shared handler. Registering the same handler twice makes
    /// it run twice per message.
    pub fn add_message_handler(&self, handler: MessageHandler) -> Subscription {
        let id = self.inner.registry.add(handler);
        Subscription::new(id, &self.inner.registry)
    }

    /// Removes one registration of `handler`; unknown handlers are ignored.
    pub fn remove_message_handler(&self, handler: &MessageHandler) -> bool {
        self.inner.registry.remove(handler)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.client.state()
    }

    /// Returns true if the channel is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.client.is_connected()
    }

    /// Reconnection attempts in the current episode.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.client.reconnect_attempts()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.client.watch_state()
    }

    /// Subscribes to lifecycle events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.inner.client.events()
    }

    /// The underlying client.
    #[must_use]
    pub fn client(&self) -> &WebSocketClient {
        &self.inner.client
    }
}
