//! Transport seam between the connection lifecycle and the WebSocket library.

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt, future};
use parley_core::error::ConnectionError;
use std::pin::Pin;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::protocol::Message as TungsteniteMessage;
use tracing::debug;

use super::message::WebSocketMessage;

/// Write half of an open transport.
pub type FrameSink = Pin<Box<dyn Sink<WebSocketMessage, Error = ConnectionError> + Send>>;

/// Read half of an open transport. The stream ends when the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<WebSocketMessage, ConnectionError>> + Send>>;

/// An open, full-duplex frame transport.
pub struct Transport {
    /// Outbound frames.
    pub sink: FrameSink,
    /// Inbound frames.
    pub stream: FrameStream,
}

impl Transport {
    /// Wraps a sink and a stream.
    pub fn new<S, R>(sink: S, stream: R) -> Self
    where
        S: Sink<WebSocketMessage, Error = ConnectionError> + Send + 'static,
        R: Stream<Item = Result<WebSocketMessage, ConnectionError>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

/// Opens transports.
///
/// The connection manager calls `connect` once per handshake, including
/// every automatic reconnection attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Performs the handshake against the fully built endpoint URL.
    async fn connect(&self, url: &str) -> Result<Transport, ConnectionError>;
}

/// `Connector` backed by tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    /// Creates a connector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Transport, ConnectionError> {
        let (ws_stream, response) = connect_async(url).await.map_err(handshake_error)?;
        debug!(status = %response.status(), "WebSocket handshake complete");

        let (sink, stream) = ws_stream.split();
        let sink = sink
            .sink_map_err(|e| ConnectionError::transport(e.to_string()))
            .with(|message: WebSocketMessage| {
                future::ready(Ok::<_, ConnectionError>(TungsteniteMessage::from(message)))
            });
        let stream = stream.filter_map(|result| {
            future::ready(match result {
                Ok(message) => WebSocketMessage::from_tungstenite(message).map(Ok),
                Err(e) => Some(Err(ConnectionError::unexpected_close(e.to_string()))),
            })
        });

        Ok(Transport::new(sink, stream))
    }
}

fn handshake_error(error: WsError) -> ConnectionError {
    match error {
        WsError::Http(response) if matches!(response.status().as_u16(), 401 | 403) => {
            ConnectionError::Auth {
                reason: format!("server rejected token ({})", response.status()),
            }
        }
        WsError::Http(response) => {
            ConnectionError::transport(format!("handshake rejected ({})", response.status()))
        }
        other => ConnectionError::transport(other.to_string()),
    }
}
