//! Typed operations against the chat server's REST routes.

use parley_core::error::NetworkError;
use parley_core::types::{AuthSession, HistoryMessage, User};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::client::RestClient;

/// Default page size for `messages`.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// A list that the server returns either bare or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Messages { messages: Vec<T> },
    Users { users: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Messages { messages: items } | Self::Users { users: items } => {
                items
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct Registration<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct Health {
    status: String,
}

/// Chat server API built on [`RestClient`].
#[derive(Debug, Clone)]
pub struct ChatApi {
    client: RestClient,
}

impl ChatApi {
    /// Wraps a REST client.
    #[must_use]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    /// Returns a copy that authenticates with `token`.
    #[must_use]
    pub fn authenticated(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone().with_bearer_token(token),
        }
    }

    /// Returns the underlying client.
    #[must_use]
    pub fn client(&self) -> &RestClient {
        &self.client
    }

    /// Checks server liveness. Returns the reported status.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the server is unreachable or unhealthy.
    pub async fn health(&self) -> Result<String, NetworkError> {
        let health: Health = self.client.get("/api/health").send_json().await?;
        Ok(health.status)
    }

    /// Exchanges credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Unauthorized` on bad credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, NetworkError> {
        let session: AuthSession = self
            .client
            .post("/api/login")
            .json(&Credentials { username, password })
            .send_json()
            .await?;
        info!(username = %session.user.username, "Logged in");
        Ok(session)
    }

    /// Creates an account and returns its session.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Http` with status 409 when the name or email is taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, NetworkError> {
        let session: AuthSession = self
            .client
            .post("/api/register")
            .json(&Registration {
                username,
                email,
                password,
            })
            .send_json()
            .await?;
        info!(username = %session.user.username, "Registered");
        Ok(session)
    }

    /// Fetches a page of message history.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the request fails or the body is not a message list.
    pub async fn messages(&self, limit: u32, offset: u32) -> Result<Vec<HistoryMessage>, NetworkError> {
        let listing: Listing<HistoryMessage> = self
            .client
            .get("/api/messages")
            .query("limit", limit)
            .query("offset", offset)
            .send_json()
            .await?;
        Ok(listing.into_vec())
    }

    /// Lists registered users.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the request fails or the body is not a user list.
    pub async fn users(&self) -> Result<Vec<User>, NetworkError> {
        let listing: Listing<User> = self.client.get("/api/users").send_json().await?;
        Ok(listing.into_vec())
    }
}
