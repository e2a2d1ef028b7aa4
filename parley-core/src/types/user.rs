//! Account and history records returned by the chat server's REST API.

use super::envelope::{MessageEnvelope, MessageKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier.
    #[serde(default)]
    pub id: u64,

    /// Login and display name.
    pub username: String,

    /// Contact address.
    #[serde(default)]
    pub email: String,

    /// Avatar URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Result of a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token for REST calls and the real-time channel.
    pub token: String,

    /// The authenticated account.
    pub user: User,
}

/// A persisted chat message as returned by `GET /api/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Message identifier.
    #[serde(default)]
    pub id: u64,

    /// Author identifier.
    #[serde(default)]
    pub user_id: u64,

    /// Author, when the server embeds it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    /// Room the message was posted to.
    #[serde(default)]
    pub room_id: u64,

    /// Message text.
    pub content: String,

    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl HistoryMessage {
    /// Returns the author's name, or a placeholder built from the id.
    #[must_use]
    pub fn author(&self) -> String {
        self.user
            .as_ref()
            .map_or_else(|| format!("user#{}", self.user_id), |u| u.username.clone())
    }

    /// Converts the record into an envelope so history renders like live traffic.
    #[must_use]
    pub fn to_envelope(&self) -> MessageEnvelope {
        MessageEnvelope::new(MessageKind::Message, self.author(), self.content.clone())
            .with_timestamp(self.created_at)
            .with_extra("id", self.id)
            .with_extra("room_id", self.room_id)
    }
}
