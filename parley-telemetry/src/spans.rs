//! Span definitions for the client's outbound activity.

use tracing::{Span, info_span};

/// Create a span covering one real-time channel session.
///
/// `endpoint` must already be masked.
///
/// # Example
///
/// ```
/// use parley_telemetry::spans::connection_span;
///
/// let span = connection_span("ws://localhost:8080/api/ws?token=abc***xyz", 0);
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn connection_span(endpoint: &str, attempt: u32) -> Span {
    info_span!(
        "ws.connection",
        endpoint = %endpoint,
        attempt = attempt,
        otel.kind = "client"
    )
}

/// Create a span for a REST request.
///
/// # Example
///
/// ```
/// use parley_telemetry::spans::request_span;
///
/// let span = request_span("GET", "/api/messages");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn request_span(method: &str, path: &str) -> Span {
    info_span!(
        "rest.request",
        method = %method,
        path = %path,
        status = tracing::field::Empty,
        otel.kind = "client"
    )
}

/// Create a span for a CLI command.
#[must_use]
pub fn command_span(command: &str) -> Span {
    info_span!("command", name = %command)
}
