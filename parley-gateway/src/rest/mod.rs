//! REST collaborator for the chat server.
//!
//! This module provides:
//! - A reqwest-based client with bearer authentication
//! - Error response parsing (`{"error": "..."}` bodies)
//! - Bounded retry with exponential backoff for transient failures
//! - Typed login, registration, history and user listing calls
//!
//! # Example
//!
//! ```no_run
//! use parley_gateway::rest::{ChatApi, RestClient, RestConfig};
//!
//! # async fn run() -> Result<(), parley_core::error::NetworkError> {
//! let config = RestConfig::builder().base_url("http://localhost:8080").build();
//! let api = ChatApi::new(RestClient::new(config)?);
//!
//! let session = api.login("alice", "secret").await?;
//! let history = api.authenticated(session.token).messages(50, 0).await?;
//! # Ok(())
//! # }
//! ```

mod api;
mod client;
mod config;

pub use api::{ChatApi, DEFAULT_HISTORY_LIMIT};
pub use client::{RequestBuilder, RestClient, status_error};
pub use config::{RestConfig, RestConfigBuilder};
