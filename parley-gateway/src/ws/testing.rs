//! Scripted in-memory connector for lifecycle tests.

use async_trait::async_trait;
use futures::channel::mpsc as frames;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use parley_core::error::ConnectionError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::message::WebSocketMessage;
use super::transport::{Connector, Transport};

/// What the next handshake does.
pub(crate) enum Outcome {
    /// Open a transport immediately.
    Accept,
    /// Open a transport after a delay.
    AcceptAfter(Duration),
    /// Fail the handshake.
    Fail(ConnectionError),
    /// Never complete.
    Hang,
}

/// The server side of an accepted transport. Dropping it closes the
/// connection from the server.
pub(crate) struct ServerEnd {
    pub url: String,
    to_client: frames::UnboundedSender<Result<WebSocketMessage, ConnectionError>>,
    from_client: frames::UnboundedReceiver<WebSocketMessage>,
}

impl ServerEnd {
    pub fn push(&self, message: WebSocketMessage) {
        self.to_client.unbounded_send(Ok(message)).unwrap();
    }

    pub fn push_text(&self, text: &str) {
        self.push(WebSocketMessage::text(text));
    }

    pub async fn next_frame(&mut self) -> Option<WebSocketMessage> {
        self.from_client.next().await
    }
}

pub(crate) struct MockConnector {
    script: Mutex<VecDeque<Outcome>>,
    attempts: Mutex<Vec<(String, Instant)>>,
    accepted: mpsc::UnboundedSender<ServerEnd>,
}

impl MockConnector {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (accepted, server_ends) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            attempts: Mutex::new(Vec::new()),
            accepted,
        });
        (connector, server_ends)
    }

    /// Queues outcomes; once the script runs out every handshake is accepted.
    pub fn script(&self, outcomes: impl IntoIterator<Item = Outcome>) {
        self.script.lock().extend(outcomes);
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().iter().map(|(_, at)| *at).collect()
    }

    pub fn last_url(&self) -> Option<String> {
        self.attempts.lock().last().map(|(url, _)| url.clone())
    }

    fn open(&self, url: &str) -> Transport {
        let (client_tx, from_client) = frames::unbounded();
        let (to_client, client_rx) = frames::unbounded();
        let _ = self.accepted.send(ServerEnd {
            url: url.to_string(),
            to_client,
            from_client,
        });
        Transport::new(
            client_tx.sink_map_err(|e| ConnectionError::transport(e.to_string())),
            client_rx,
        )
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> Result<Transport, ConnectionError> {
        self.attempts.lock().push((url.to_string(), Instant::now()));
        let outcome = self.script.lock().pop_front().unwrap_or(Outcome::Accept);
        match outcome {
            Outcome::Accept => Ok(self.open(url)),
            Outcome::AcceptAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.open(url))
            }
            Outcome::Fail(error) => Err(error),
            Outcome::Hang => futures::future::pending().await,
        }
    }
}
