//! WebSocket frame types and the envelope codec.

use parley_core::error::ConnectionError;
use parley_core::types::MessageEnvelope;
use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message as TungsteniteMessage};

/// WebSocket frame, independent of the transport library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebSocketMessage {
    /// Text message.
    Text(String),
    /// Binary message.
    Binary(Vec<u8>),
    /// Ping frame.
    Ping(Vec<u8>),
    /// Pong frame.
    Pong(Vec<u8>),
    /// Close frame.
    Close(Option<CloseReason>),
}

/// Close frame reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseReason {
    /// Close code.
    pub code: u16,
    /// Close reason text.
    pub reason: String,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.reason.is_empty() {
            write!(f, "close code {}", self.code)
        } else {
            write!(f, "close code {}: {}", self.code, self.reason)
        }
    }
}

impl WebSocketMessage {
    /// Normal closure code.
    pub const NORMAL_CLOSE: u16 = 1000;

    /// Creates a text message.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Creates a binary message.
    #[must_use]
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self::Binary(data.into())
    }

    /// Creates a ping message.
    #[must_use]
    pub fn ping(data: impl Into<Vec<u8>>) -> Self {
        Self::Ping(data.into())
    }

    /// Creates a pong message.
    #[must_use]
    pub fn pong(data: impl Into<Vec<u8>>) -> Self {
        Self::Pong(data.into())
    }

    /// Creates a close message.
    #[must_use]
    pub fn close(code: u16, reason: impl Into<String>) -> Self {
        Self::Close(Some(CloseReason {
            code,
            reason: reason.into(),
        }))
    }

    /// Returns true for text and binary frames.
    #[must_use]
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Binary(_))
    }

    /// Returns true if this is a close message.
    #[must_use]
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close(_))
    }

    /// Returns the text content if this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a tungstenite message; raw frames yield `None`.
    #[must_use]
    pub fn from_tungstenite(message: TungsteniteMessage) -> Option<Self> {
        match message {
            TungsteniteMessage::Text(s) => Some(Self::Text(s)),
            TungsteniteMessage::Binary(b) => Some(Self::Binary(b)),
            TungsteniteMessage::Ping(b) => Some(Self::Ping(b)),
            TungsteniteMessage::Pong(b) => Some(Self::Pong(b)),
            TungsteniteMessage::Close(frame) => Some(Self::Close(frame.map(|f| CloseReason {
                code: f.code.into(),
                reason: f.reason.into_owned(),
            }))),
            TungsteniteMessage::Frame(_) => None,
        }
    }
}

impl From<WebSocketMessage> for TungsteniteMessage {
    fn from(message: WebSocketMessage) -> Self {
        match message {
            WebSocketMessage::Text(s) => Self::Text(s),
            WebSocketMessage::Binary(b) => Self::Binary(b),
            WebSocketMessage::Ping(b) => Self::Ping(b),
            WebSocketMessage::Pong(b) => Self::Pong(b),
            WebSocketMessage::Close(reason) => Self::Close(reason.map(|r| CloseFrame {
                code: CloseCode::from(r.code),
                reason: r.reason.into(),
            })),
        }
    }
}

/// Encodes envelopes as JSON text frames and decodes text or binary frames
/// back into envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCodec;

impl MessageCodec {
    /// Creates a new message codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Encodes an envelope to a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::MalformedFrame` if serialization fails.
    pub fn encode(&self, envelope: &MessageEnvelope) -> Result<WebSocketMessage, ConnectionError> {
        envelope
            .to_json()
            .map(WebSocketMessage::Text)
            .map_err(|e| ConnectionError::malformed(format!("failed to serialize envelope: {e}")))
    }

    /// Decodes a data frame into an envelope.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::MalformedFrame` for invalid JSON, JSON that is
    /// not an envelope, or a control frame.
    pub fn decode(&self, message: &WebSocketMessage) -> Result<MessageEnvelope, ConnectionError> {
        match message {
            WebSocketMessage::Text(text) => MessageEnvelope::from_json(text)
                .map_err(|e| ConnectionError::malformed(format!("invalid text frame: {e}"))),
            WebSocketMessage::Binary(data) => MessageEnvelope::from_slice(data)
                .map_err(|e| ConnectionError::malformed(format!("invalid binary frame: {e}"))),
            _ => Err(ConnectionError::malformed("cannot decode a control frame")),
        }
    }
}
