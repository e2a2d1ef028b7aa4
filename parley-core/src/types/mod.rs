//! Wire and REST data types.
//!
//! - [`MessageEnvelope`] - a frame on the real-time channel
//! - [`MessageKind`] - the envelope discriminator
//! - [`User`], [`AuthSession`], [`HistoryMessage`] - REST records

mod envelope;
mod user;

pub use envelope::{MessageEnvelope, MessageKind};
pub use user::{AuthSession, HistoryMessage, User};
