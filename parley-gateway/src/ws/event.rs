//! Lifecycle notifications published by the connection manager.

use parley_core::error::ConnectionError;
use std::time::Duration;

/// Something that happened to the connection outside a caller's `connect`.
///
/// Delivered over a broadcast channel; slow receivers may miss events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The channel opened.
    Connected,
    /// The channel closed, either unexpectedly or by `disconnect`.
    Disconnected {
        /// Close reason.
        reason: String,
    },
    /// A reconnection attempt was scheduled.
    Reconnecting {
        /// 1-based attempt number.
        attempt: u32,
        /// Attempt ceiling.
        max_attempts: u32,
        /// Delay before the attempt.
        delay: Duration,
    },
    /// The attempt ceiling was reached; the channel stays closed.
    GaveUp {
        /// Attempts made in this episode.
        attempts: u32,
    },
    /// An outbound envelope was not sent.
    MessageDropped {
        /// Why it was dropped.
        error: ConnectionError,
    },
    /// An inbound frame could not be decoded and was skipped.
    MalformedFrame {
        /// Decoder error.
        reason: String,
    },
}

impl std::fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Disconnected { reason } => write!(f, "disconnected: {reason}"),
            Self::Reconnecting {
                attempt,
                max_attempts,
                delay,
            } => write!(
                f,
                "reconnecting in {}ms (attempt {attempt}/{max_attempts})",
                delay.as_millis()
            ),
            Self::GaveUp { attempts } => write!(f, "gave up after {attempts} attempts"),
            Self::MessageDropped { error } => write!(f, "message dropped: {error}"),
            Self::MalformedFrame { reason } => write!(f, "malformed frame skipped: {reason}"),
        }
    }
}
