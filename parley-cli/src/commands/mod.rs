//! CLI command implementations.

pub mod auth;
pub mod chat;
pub mod history;

use anyhow::{Context as _, Result};
use parley_core::config::ParleyConfig;
use parley_gateway::rest::{ChatApi, RestClient, RestConfig};

use crate::session::{SessionStore, StoredSession};

/// Shared state handed to every command.
pub struct Context {
    config: ParleyConfig,
    session: SessionStore,
}

impl Context {
    /// Creates a command context from the loaded configuration.
    pub fn new(config: ParleyConfig) -> Self {
        let session = SessionStore::new(config.session.path());
        Self { config, session }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    /// Returns the credential store.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Builds an unauthenticated API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn api(&self) -> Result<ChatApi> {
        let client = RestClient::new(RestConfig::from_settings(&self.config.server))
            .context("Failed to create REST client")?;
        Ok(ChatApi::new(client))
    }

    /// Loads the stored session, failing with a hint when nobody is logged in.
    ///
    /// # Errors
    ///
    /// Returns error if there is no stored session.
    pub fn require_session(&self) -> Result<StoredSession> {
        self.session
            .load()?
            .context("Not logged in; run `parley login` first")
    }
}
