//! REST client implementation with bearer authentication and retries.

use parley_core::error::NetworkError;
use parley_telemetry::masking::{Sensitive, mask};
use parley_telemetry::spans::request_span;
use reqwest::{Client, Method, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, warn};

use super::config::RestConfig;

/// REST client for the chat server.
///
/// # Example
///
/// ```no_run
/// use parley_gateway::rest::{RestClient, RestConfig};
///
/// # async fn run() -> Result<(), parley_core::error::NetworkError> {
/// let config = RestConfig::builder().base_url("http://localhost:8080").build();
/// let client = RestClient::new(config)?.with_bearer_token("token");
/// let body = client
///     .get("/api/messages")
///     .query("limit", "20")
///     .send_text()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestClient {
    config: RestConfig,
    http_client: Client,
    bearer_token: Option<Sensitive<String>>,
}

impl RestClient {
    /// Creates a new REST client.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the HTTP client cannot be created.
    pub fn new(config: RestConfig) -> Result<Self, NetworkError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            config
                .user_agent
                .parse()
                .map_err(|_| NetworkError::ConnectionFailed {
                    reason: "Invalid user agent".to_string(),
                })?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| NetworkError::ConnectionFailed {
                reason: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            config,
            http_client,
            bearer_token: None,
        })
    }

    /// Attaches a bearer token to every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(Sensitive::new(token.into()));
        self
    }

    /// Returns true if a bearer token is attached.
    #[must_use]
    pub fn has_bearer_token(&self) -> bool {
        self.bearer_token.is_some()
    }

    /// Creates a GET request builder.
    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::GET, path)
    }

    /// Creates a POST request builder.
    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::POST, path)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Builds the full URL for a path.
    #[must_use]
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }

    async fn execute_request(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&str>,
    ) -> Result<Response, NetworkError> {
        let mut request = self.http_client.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token.expose());
        }
        if let Some(b) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(b.to_string());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout {
                    timeout_ms: self.config.timeout_ms,
                }
            } else {
                NetworkError::ConnectionFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

/// Maps an error status and body to a `NetworkError`.
///
/// The chat server reports failures as `{"error": "..."}`; other bodies are
/// kept verbatim.
pub fn status_error(status: StatusCode, body: &str) -> NetworkError {
    let reason = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("error").and_then(|v| v.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.to_string()
            }
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => NetworkError::Unauthorized { reason },
        _ => NetworkError::Http {
            status_code: status.as_u16(),
            reason,
        },
    }
}

/// Request builder for REST API calls.
pub struct RequestBuilder<'a> {
    client: &'a RestClient,
    method: Method,
    path: String,
    query_params: Vec<(String, String)>,
    body: Option<String>,
}

impl<'a> RequestBuilder<'a> {
    fn new(client: &'a RestClient, method: Method, path: &str) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query_params.push((key.into(), value.to_string()));
        self
    }

    /// Sets the request body as JSON.
    #[must_use]
    pub fn json<T: serde::Serialize>(mut self, body: &T) -> Self {
        self.body = serde_json::to_string(body).ok();
        self
    }

    /// Sends the request and returns the raw response.
    ///
    /// Recoverable failures (connection errors, timeouts, 5xx and 429) of
    /// idempotent methods are retried with exponential backoff up to
    /// `max_retries` times. A POST is sent once.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the request fails.
    pub async fn send(self) -> Result<Response, NetworkError> {
        let url = self.client.build_url(&self.path);
        let span = request_span(self.method.as_str(), &self.path);

        async {
            if let Some(body) = &self.body {
                debug!(body = %mask(body), "Request body");
            }

            let mut attempt = 0u32;
            loop {
                let result = self
                    .client
                    .execute_request(
                        self.method.clone(),
                        &url,
                        &self.query_params,
                        self.body.as_deref(),
                    )
                    .await;

                match result {
                    Ok(response) => {
                        tracing::Span::current().record("status", response.status().as_u16());
                        debug!("Request succeeded");
                        return Ok(response);
                    }
                    Err(e)
                        if e.is_recoverable()
                            && self.method.is_idempotent()
                            && self.client.config.should_retry(attempt) =>
                    {
                        let delay = self.client.config.calculate_retry_delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis(),
                            error = %e,
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    Err(e) => {
                        if let NetworkError::Http { status_code, .. } = &e {
                            tracing::Span::current().record("status", *status_code);
                        }
                        debug!(error = %e, "Request failed");
                        return Err(e);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Sends the request and deserializes the response as JSON.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the request fails or response cannot be parsed.
    pub async fn send_json<T: DeserializeOwned>(self) -> Result<T, NetworkError> {
        let text = self.send_text().await?;
        serde_json::from_str(&text).map_err(|e| NetworkError::Decode {
            reason: format!("Failed to parse response: {e}"),
        })
    }

    /// Sends the request and returns the response as text.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the request fails.
    pub async fn send_text(self) -> Result<String, NetworkError> {
        let response = self.send().await?;
        response.text().await.map_err(|e| NetworkError::Decode {
            reason: format!("Failed to read response: {e}"),
        })
    }
}
