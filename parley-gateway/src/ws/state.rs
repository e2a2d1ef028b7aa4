//! WebSocket connection state management.

#![allow(clippy::redundant_pub_crate)]

use parley_telemetry::masking::Sensitive;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::message::WebSocketMessage;

/// Lifecycle state of the real-time channel.
///
/// `Idle` is the initial state and the state after an explicit disconnect.
/// `Closed` means the channel was lost and the reconnection policy owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Never connected, or explicitly disconnected.
    #[default]
    Idle,
    /// A handshake is in flight.
    Connecting,
    /// The channel is open.
    Open,
    /// The channel closed unexpectedly or a handshake failed.
    Closed,
}

impl ConnectionState {
    /// Returns true if the channel is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if a handshake is in flight.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// Returns true if the channel is idle or closed.
    #[must_use]
    pub fn is_inactive(&self) -> bool {
        matches!(self, Self::Idle | Self::Closed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Credentials of the current session.
///
/// The token is never printed; `Debug` shows `[REDACTED]`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    identity: Option<String>,
    token: Sensitive<String>,
}

impl AuthContext {
    /// Creates a context from a bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            identity: None,
            token: Sensitive::new(token.into()),
        }
    }

    /// Attaches the username outbound chat messages are sent as.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// The bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose()
    }

    /// The username, if known.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub(crate) fn has_token(&self) -> bool {
        !self.token.expose().trim().is_empty()
    }
}

/// One logical connection session, from a manual connect to the matching
/// disconnect. Reconnection attempts share their session's token.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub id: u64,
    pub token: CancellationToken,
}

impl Session {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            token: CancellationToken::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Internal state tracking for the WebSocket client.
#[derive(Debug, Default)]
pub(crate) struct InternalState {
    /// Current connection state.
    pub state: ConnectionState,
    /// Reconnection attempts in the current disconnection episode.
    pub attempts: u32,
    /// Credentials of the last successful open.
    pub auth: Option<AuthContext>,
    /// Active session, if any.
    pub session: Option<Session>,
    /// Counter used to number sessions.
    pub next_session_id: u64,
    /// Queue feeding the writer of the open transport.
    pub outbound: Option<mpsc::Sender<WebSocketMessage>>,
    /// Pending reconnection timer.
    pub reconnect_task: Option<JoinHandle<()>>,
}

impl InternalState {
    /// Returns true if `session` is the live session.
    pub fn is_current(&self, session: &Session) -> bool {
        !session.is_cancelled() && self.session.as_ref().is_some_and(|s| s.id == session.id)
    }

    /// Cancels the live session and starts a new one.
    pub fn begin_session(&mut self) -> Session {
        self.end_session();
        self.next_session_id += 1;
        let session = Session::new(self.next_session_id);
        self.session = Some(session.clone());
        self.attempts = 0;
        self.auth = None;
        session
    }

    /// Cancels the live session, its transport and any pending timer.
    pub fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.token.cancel();
        }
        if let Some(task) = self.reconnect_task.take() {
            task.abort();
        }
        self.outbound = None;
    }

    /// Resets to the initial state, keeping the session counter.
    pub fn reset(&mut self) {
        self.end_session();
        self.attempts = 0;
        self.auth = None;
    }

    /// Marks the connection as open.
    pub fn mark_open(&mut self, auth: AuthContext, outbound: mpsc::Sender<WebSocketMessage>) {
        self.attempts = 0;
        self.auth = Some(auth);
        self.outbound = Some(outbound);
    }

    /// Marks the transport as gone.
    pub fn mark_closed(&mut self) {
        self.outbound = None;
    }
}
