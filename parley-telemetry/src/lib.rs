//! # Parley Telemetry
//!
//! Logging and tracing for the Parley chat client.
//!
//! This crate provides:
//! - Structured logging with pretty, compact and JSON formats
//! - Rolling log files
//! - Masking of bearer tokens and passwords
//! - Spans for connection sessions, REST requests and CLI commands

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Logging configuration and initialization
pub mod logging;

/// Sensitive data masking
pub mod masking;

/// Span definitions for tracing
pub mod spans;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::logging::{LogConfig, LogFormat, LogOutput, init_logging};
    pub use crate::masking::{Sensitive, SensitiveDataMasker, mask};
    pub use crate::spans::*;
}
