//! # Parley Core
//!
//! Shared types for the Parley chat client.
//!
//! This crate provides:
//! - The [`MessageEnvelope`](types::MessageEnvelope) exchanged on the real-time channel
//! - REST records (users, login sessions, message history)
//! - Error types and handling framework
//! - Configuration management with YAML/TOML/JSON support and environment variable overrides

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]

/// Envelope and REST data types
pub mod types;

/// Error types and handling
pub mod error;

/// Configuration management
pub mod config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::{ConfigError, ConnectionError, NetworkError, ParleyError};
    pub use crate::types::*;
}
