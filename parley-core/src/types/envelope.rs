//! The unit of communication on the real-time channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Discriminates what an envelope represents.
///
/// Known kinds are those the chat server emits; anything else is kept
/// verbatim in [`MessageKind::Other`] so it survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// A chat message.
    Message,
    /// A user joined the global channel.
    UserJoined,
    /// A user left the global channel.
    UserLeft,
    /// A user joined a room.
    RoomUserJoined,
    /// A user left a room.
    RoomUserLeft,
    /// Any other discriminator.
    Other(String),
}

impl MessageKind {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Message => "message",
            Self::UserJoined => "user_joined",
            Self::UserLeft => "user_left",
            Self::RoomUserJoined => "room_user_joined",
            Self::RoomUserLeft => "room_user_left",
            Self::Other(kind) => kind,
        }
    }

    /// Returns true for join/leave notifications.
    #[must_use]
    pub fn is_presence(&self) -> bool {
        matches!(
            self,
            Self::UserJoined | Self::UserLeft | Self::RoomUserJoined | Self::RoomUserLeft
        )
    }
}

impl From<String> for MessageKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "message" => Self::Message,
            "user_joined" => Self::UserJoined,
            "user_left" => Self::UserLeft,
            "room_user_joined" => Self::RoomUserJoined,
            "room_user_left" => Self::RoomUserLeft,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for MessageKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured record exchanged over the real-time channel.
///
/// Serialized as a flat JSON object: `{"type", "content", "username",
/// "timestamp", ...}`. Fields the client does not model (`user_id`,
/// `room_id`, ...) are kept in `extra` and written back unchanged.
///
/// # Examples
///
/// ```
/// use parley_core::types::{MessageEnvelope, MessageKind};
///
/// let envelope = MessageEnvelope::chat("alice", "hi");
/// let json = serde_json::to_string(&envelope).unwrap();
/// let parsed: MessageEnvelope = serde_json::from_str(&json).unwrap();
/// assert_eq!(parsed.kind, MessageKind::Message);
/// assert_eq!(parsed, envelope);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Discriminator.
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Message text; empty for presence notifications.
    #[serde(default)]
    pub content: String,

    /// Author or subject of the event.
    #[serde(default)]
    pub username: String,

    /// When the event happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageEnvelope {
    /// Creates an envelope of the given kind with no timestamp.
    #[must_use]
    pub fn new(kind: impl Into<MessageKind>, username: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
            username: username.into(),
            timestamp: None,
            extra: Map::new(),
        }
    }

    /// Creates a chat message stamped with the current time.
    #[must_use]
    pub fn chat(username: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(MessageKind::Message, username, content).with_timestamp(Utc::now())
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Adds an extra field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns an extra field by name.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Parses an envelope from a JSON text frame.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Parses an envelope from a JSON binary frame.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Encodes the envelope as a JSON text frame.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for MessageEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self
            .timestamp
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());
        match &self.kind {
            MessageKind::Message => write!(f, "[{time}] {}: {}", self.username, self.content),
            MessageKind::UserJoined => write!(f, "[{time}] * {} joined", self.username),
            MessageKind::UserLeft => write!(f, "[{time}] * {} left", self.username),
            MessageKind::RoomUserJoined | MessageKind::RoomUserLeft => {
                let verb = if self.kind == MessageKind::RoomUserJoined {
                    "joined"
                } else {
                    "left"
                };
                match self.extra("room_id") {
                    Some(room) => write!(f, "[{time}] * {} {verb} room {room}", self.username),
                    None => write!(f, "[{time}] * {} {verb} a room", self.username),
                }
            }
            MessageKind::Other(kind) => write!(f, "[{time}] <{kind}> {}: {}", self.username, self.content),
        }
    }
}
