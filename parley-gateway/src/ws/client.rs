//! Connection lifecycle: handshake, inbound dispatch, heartbeat and automatic
//! reconnection.

#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use parley_core::error::ConnectionError;
use parley_core::types::MessageEnvelope;
use parley_telemetry::masking::mask;
use parley_telemetry::spans::connection_span;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep, sleep_until, timeout};
use tracing::{Instrument, Span, debug, error, info, warn};

use super::config::WebSocketConfig;
use super::event::ConnectionEvent;
use super::message::{MessageCodec, WebSocketMessage};
use super::policy::ReconnectPolicy;
use super::registry::HandlerRegistry;
use super::state::{AuthContext, ConnectionState, InternalState, Session};
use super::transport::{Connector, Transport};

/// State shared between the client handle and its background tasks.
struct Shared {
    config: WebSocketConfig,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    registry: Arc<HandlerRegistry>,
    codec: MessageCodec,
    state: Mutex<InternalState>,
    state_tx: watch::Sender<ConnectionState>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl Shared {
    fn set_state(&self, inner: &mut InternalState, state: ConnectionState) {
        inner.state = state;
        self.state_tx.send_replace(state);
    }

    fn emit(&self, event: ConnectionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn deliver(&self, frame: &WebSocketMessage) {
        match self.codec.decode(frame) {
            Ok(envelope) => {
                let handled = self.registry.dispatch(&envelope);
                debug!(kind = %envelope.kind, handlers = handled, "Dispatched message");
            }
            Err(e) => {
                warn!(error = %e, "Skipping malformed frame");
                self.emit(ConnectionEvent::MalformedFrame {
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Caller-driven; failures are returned and never retried.
    Initial,
    /// Policy-driven; failures count toward the attempt ceiling.
    Reconnect,
}

/// WebSocket client with automatic reconnection and heartbeat.
///
/// Owns one logical connection at a time. `connect` resolves once the
/// channel is open; after that every close that was not requested through
/// `disconnect` is handed to the [`ReconnectPolicy`]. Inbound frames are
/// decoded into envelopes and dispatched to the shared [`HandlerRegistry`].
///
/// Dropping the client disconnects it.
pub struct WebSocketClient {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for WebSocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketClient")
            .field("url", &self.shared.config.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl WebSocketClient {
    /// Creates a new client. No network activity happens until `connect`.
    pub fn new(
        config: WebSocketConfig,
        connector: Arc<dyn Connector>,
        registry: Arc<HandlerRegistry>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let policy = config.reconnect_policy();
        Self {
            shared: Arc::new(Shared {
                config,
                policy,
                connector,
                registry,
                codec: MessageCodec::new(),
                state: Mutex::new(InternalState::default()),
                state_tx,
                events,
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &WebSocketConfig {
        &self.shared.config
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state.lock().state
    }

    /// Returns true if the channel is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_open()
    }

    /// Returns the number of reconnection attempts in the current episode.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.state.lock().attempts
    }

    /// Returns the username of the open session, if one was supplied.
    #[must_use]
    pub fn identity(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .auth
            .as_ref()
            .and_then(|auth| auth.identity().map(str::to_string))
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Subscribes to lifecycle events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.shared.events.subscribe()
    }

    /// Opens the channel.
    ///
    /// Resolves once the channel is open. Returns immediately when it
    /// already is; joins the pending handshake when one is in flight.
    ///
    /// # Errors
    ///
    /// - `Auth` when the token is empty (no network activity happens)
    /// - `InvalidEndpoint` when the configured URL is unusable
    /// - `Transport`/`Timeout`/`Auth` when the handshake fails; the failure
    ///   is not retried
    /// - `Cancelled` when `disconnect` is called before the handshake completes
    pub async fn connect(&self, auth: AuthContext) -> Result<(), ConnectionError> {
        if !auth.has_token() {
            warn!("Connect called without a token");
            return Err(ConnectionError::missing_token());
        }

        let session = {
            let mut inner = self.shared.state.lock();
            match inner.state {
                ConnectionState::Open => {
                    debug!("Already connected");
                    return Ok(());
                }
                ConnectionState::Connecting => None,
                ConnectionState::Idle | ConnectionState::Closed => {
                    let session = inner.begin_session();
                    self.shared.set_state(&mut inner, ConnectionState::Connecting);
                    Some(session)
                }
            }
        };

        match session {
            Some(session) => {
                establish(Arc::clone(&self.shared), session, auth, Mode::Initial).await
            }
            None => self.join_pending().await,
        }
    }

    async fn join_pending(&self) -> Result<(), ConnectionError> {
        debug!("Handshake already in flight, waiting for it");
        let mut state_rx = self.shared.state_tx.subscribe();
        let state = *state_rx
            .wait_for(|state| !state.is_transitioning())
            .await
            .map_err(|_| ConnectionError::Cancelled)?;

        match state {
            ConnectionState::Open => Ok(()),
            ConnectionState::Idle => Err(ConnectionError::Cancelled),
            ConnectionState::Connecting | ConnectionState::Closed => Err(
                ConnectionError::transport("the handshake this call joined failed"),
            ),
        }
    }

    /// Sends an envelope as one JSON text frame.
    ///
    /// Delivery is at-most-once: nothing is buffered while the channel is not
    /// open. A dropped envelope is logged and published as
    /// [`ConnectionEvent::MessageDropped`].
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` when the channel is not open, or `Transport`
    /// when the outbound queue is full.
    pub fn send(&self, envelope: &MessageEnvelope) -> Result<(), ConnectionError> {
        let result = {
            let inner = self.shared.state.lock();
            match (&inner.state, &inner.outbound) {
                (ConnectionState::Open, Some(outbound)) => self
                    .shared
                    .codec
                    .encode(envelope)
                    .and_then(|frame| {
                        outbound.try_send(frame).map_err(|e| match e {
                            TrySendError::Full(_) => {
                                ConnectionError::transport("outbound queue is full")
                            }
                            TrySendError::Closed(_) => ConnectionError::NotConnected,
                        })
                    }),
                _ => Err(ConnectionError::NotConnected),
            }
        };

        if let Err(error) = &result {
            warn!(error = %error, kind = %envelope.kind, "Message dropped");
            self.shared.emit(ConnectionEvent::MessageDropped {
                error: error.clone(),
            });
        }
        result
    }

    /// Closes the channel and forgets the session.
    ///
    /// Cancels any pending reconnection and any handshake in flight, clears
    /// the credentials and resets the attempt counter. Calling it when
    /// already idle does nothing.
    pub fn disconnect(&self) {
        let previous = {
            let mut inner = self.shared.state.lock();
            if inner.state == ConnectionState::Idle && inner.session.is_none() {
                return;
            }
            let previous = inner.state;
            inner.reset();
            self.shared.set_state(&mut inner, ConnectionState::Idle);
            previous
        };

        info!(previous = %previous, "Disconnected");
        self.shared.emit(ConnectionEvent::Disconnected {
            reason: "client disconnect".to_string(),
        });
    }
}

impl Drop for WebSocketClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Performs one handshake for `session` and moves the state machine on.
async fn establish(
    shared: Arc<Shared>,
    session: Session,
    auth: AuthContext,
    mode: Mode,
) -> Result<(), ConnectionError> {
    let url = match shared.config.endpoint_url(auth.token()) {
        Ok(url) => url,
        Err(e) => return fail(&shared, &session, mode, e),
    };
    let attempt = shared.state.lock().attempts;
    let span = connection_span(&mask(&url), attempt);

    async {
        info!(mode = ?mode, "Connecting");
        let result = tokio::select! {
            () = session.token.cancelled() => Err(ConnectionError::Cancelled),
            result = timeout(shared.config.connect_timeout(), shared.connector.connect(&url)) => {
                result.unwrap_or_else(|_| {
                    Err(ConnectionError::Timeout {
                        timeout_ms: shared.config.connect_timeout_ms,
                    })
                })
            }
        };

        match result {
            Ok(transport) => open(&shared, &session, auth, transport, Span::current()),
            Err(e) => fail(&shared, &session, mode, e),
        }
    }
    .instrument(span)
    .await
}

fn open(
    shared: &Arc<Shared>,
    session: &Session,
    auth: AuthContext,
    transport: Transport,
    span: Span,
) -> Result<(), ConnectionError> {
    let outbound_rx = {
        let mut inner = shared.state.lock();
        if !inner.is_current(session) {
            debug!("Handshake completed after disconnect, dropping transport");
            return Err(ConnectionError::Cancelled);
        }
        let (outbound_tx, outbound_rx) = mpsc::channel(shared.config.outbound_capacity.max(1));
        inner.mark_open(auth, outbound_tx);
        shared.set_state(&mut inner, ConnectionState::Open);
        outbound_rx
    };

    info!("Connected");
    shared.emit(ConnectionEvent::Connected);
    tokio::spawn(
        run_connection(Arc::clone(shared), session.clone(), transport, outbound_rx).instrument(span),
    );
    Ok(())
}

fn fail(
    shared: &Arc<Shared>,
    session: &Session,
    mode: Mode,
    error: ConnectionError,
) -> Result<(), ConnectionError> {
    let mut inner = shared.state.lock();
    if !inner.is_current(session) {
        return Err(ConnectionError::Cancelled);
    }
    shared.set_state(&mut inner, ConnectionState::Closed);

    match mode {
        Mode::Initial => {
            inner.end_session();
            drop(inner);
            warn!(error = %error, "Connect failed");
        }
        Mode::Reconnect => {
            drop(inner);
            warn!(error = %error, "Reconnect attempt failed");
            schedule_reconnect(shared, session);
        }
    }
    Err(error)
}

/// Consults the policy and either schedules the next attempt or gives up.
fn schedule_reconnect(shared: &Arc<Shared>, session: &Session) {
    let mut inner = shared.state.lock();
    if !inner.is_current(session) {
        return;
    }
    let Some(auth) = inner.auth.clone() else {
        debug!("Channel never opened in this session, not reconnecting");
        return;
    };

    let max_attempts = shared.policy.max_attempts();
    match shared.policy.next_delay(inner.attempts) {
        Some(delay) => {
            inner.attempts += 1;
            let attempt = inner.attempts;
            info!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis(),
                "Scheduling reconnect"
            );
            shared.emit(ConnectionEvent::Reconnecting {
                attempt,
                max_attempts,
                delay,
            });
            inner.reconnect_task = Some(tokio::spawn(reconnect_after(
                Arc::clone(shared),
                session.clone(),
                auth,
                delay,
            )));
        }
        None => {
            let attempts = inner.attempts;
            drop(inner);
            if max_attempts == 0 {
                info!("Automatic reconnection disabled");
            } else {
                error!(attempts, "Giving up after maximum reconnect attempts");
            }
            shared.emit(ConnectionEvent::GaveUp { attempts });
        }
    }
}

async fn reconnect_after(shared: Arc<Shared>, session: Session, auth: AuthContext, delay: Duration) {
    tokio::select! {
        () = session.token.cancelled() => return,
        () = sleep(delay) => {}
    }

    {
        let mut inner = shared.state.lock();
        if !inner.is_current(&session) || inner.state != ConnectionState::Closed {
            return;
        }
        shared.set_state(&mut inner, ConnectionState::Connecting);
    }

    if let Err(e) = establish(Arc::clone(&shared), session, auth, Mode::Reconnect).await {
        debug!(error = %e, "Reconnect attempt did not open");
    }
}

/// Drives one open transport until it closes.
async fn run_connection(
    shared: Arc<Shared>,
    session: Session,
    transport: Transport,
    mut outbound_rx: mpsc::Receiver<WebSocketMessage>,
) {
    let Transport {
        mut sink,
        mut stream,
    } = transport;

    let mut heartbeat = shared.config.auto_ping.then(|| {
        let every = shared.config.heartbeat_interval();
        let mut interval = interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    });
    let mut pong_deadline: Option<Instant> = None;

    let reason = loop {
        tokio::select! {
            biased;

            () = session.token.cancelled() => {
                debug!("Closing connection on request");
                let _ = sink
                    .send(WebSocketMessage::close(WebSocketMessage::NORMAL_CLOSE, "client disconnect"))
                    .await;
                let _ = sink.close().await;
                return;
            }

            Some(message) = outbound_rx.recv() => {
                if let Err(e) = sink.send(message).await {
                    break format!("write failed: {e}");
                }
            }

            frame = stream.next() => {
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => break e.to_string(),
                    None => break "connection closed by server".to_string(),
                };

                match message {
                    WebSocketMessage::Text(_) | WebSocketMessage::Binary(_) => shared.deliver(&message),
                    WebSocketMessage::Ping(data) => {
                        if let Err(e) = sink.send(WebSocketMessage::Pong(data)).await {
                            warn!(error = %e, "Failed to send pong");
                        }
                    }
                    WebSocketMessage::Pong(_) => {
                        pong_deadline = None;
                        debug!("Pong received");
                    }
                    WebSocketMessage::Close(reason) => {
                        info!("Server sent close frame");
                        break reason.map_or_else(
                            || "server closed connection".to_string(),
                            |r| r.to_string(),
                        );
                    }
                }
            }

            () = next_heartbeat(&mut heartbeat) => {
                if let Err(e) = sink.send(WebSocketMessage::ping(Vec::new())).await {
                    break format!("ping failed: {e}");
                }
                if pong_deadline.is_none() {
                    pong_deadline = Some(Instant::now() + shared.config.pong_timeout());
                }
                debug!("Ping sent");
            }

            () = sleep_until(pong_deadline.unwrap_or_else(Instant::now)), if pong_deadline.is_some() => {
                break format!("no pong within {}ms", shared.config.pong_timeout_ms);
            }
        }
    };

    on_unexpected_close(&shared, &session, reason);
}

/// Waits for the next heartbeat tick; never resolves when auto-ping is off.
async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn on_unexpected_close(shared: &Arc<Shared>, session: &Session, reason: String) {
    {
        let mut inner = shared.state.lock();
        if !inner.is_current(session) {
            return;
        }
        inner.mark_closed();
        shared.set_state(&mut inner, ConnectionState::Closed);
    }

    warn!(reason = %reason, "Connection closed unexpectedly");
    shared.emit(ConnectionEvent::Disconnected { reason });
    schedule_reconnect(shared, session);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::testing::{MockConnector, Outcome, ServerEnd};
    use chrono::{TimeZone, Utc};
    use parley_core::types::MessageKind;

    fn test_config() -> WebSocketConfig {
        WebSocketConfig::builder().auto_ping(false).build()
    }

    fn client(
        connector: &Arc<MockConnector>,
        config: WebSocketConfig,
    ) -> (WebSocketClient, Arc<HandlerRegistry>) {
        let registry = Arc::new(HandlerRegistry::new());
        let connector: Arc<dyn Connector> = connector.clone();
        let client = WebSocketClient::new(config, connector, Arc::clone(&registry));
        (client, registry)
    }

    fn collect_envelopes(registry: &HandlerRegistry) -> mpsc::UnboundedReceiver<MessageEnvelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.add(Arc::new(move |envelope: &MessageEnvelope| {
            let _ = tx.send(envelope.clone());
        }));
        rx
    }

    async fn accepted(server_ends: &mut mpsc::UnboundedReceiver<ServerEnd>) -> ServerEnd {
        server_ends.recv().await.unwrap()
    }

    async fn next_event(events: &mut broadcast::Receiver<ConnectionEvent>) -> ConnectionEvent {
        events.recv().await.unwrap()
    }

    async fn events_until(
        events: &mut broadcast::Receiver<ConnectionEvent>,
        done: impl Fn(&ConnectionEvent) -> bool,
    ) -> Vec<ConnectionEvent> {
        let mut seen = Vec::new();
        loop {
            let event = next_event(events).await;
            let finished = done(&event);
            seen.push(event);
            if finished {
                return seen;
            }
        }
    }

    #[tokio::test]
    async fn test_connect_without_token_makes_no_network_call() {
        let (mock, _server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());

        for token in ["", "   "] {
            let err = client.connect(AuthContext::new(token)).await.unwrap_err();
            assert!(err.is_auth());
        }
        assert_eq!(mock.attempt_count(), 0);
        assert_eq!(client.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_connect_opens_with_token_in_url() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());
        let mut state_rx = client.watch_state();

        client
            .connect(AuthContext::new("abc").with_identity("alice"))
            .await
            .unwrap();

        assert_eq!(client.state(), ConnectionState::Open);
        assert!(state_rx.has_changed().unwrap());
        assert_eq!(*state_rx.borrow_and_update(), ConnectionState::Open);
        assert_eq!(client.identity().as_deref(), Some("alice"));
        let server = accepted(&mut server_ends).await;
        assert_eq!(server.url, "ws://localhost:8080/api/ws?token=abc");

        // Already open: no second handshake.
        client.connect(AuthContext::new("abc")).await.unwrap();
        assert_eq!(mock.attempt_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_failure_is_returned_and_not_retried() {
        let (mock, _server_ends) = MockConnector::new();
        mock.script([Outcome::Fail(ConnectionError::transport("connection refused"))]);
        let (client, _) = client(&mock, test_config());

        let err = client.connect(AuthContext::new("abc")).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Transport { .. }));
        assert_eq!(client.state(), ConnectionState::Closed);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(mock.attempt_count(), 1);
        assert_eq!(client.reconnect_attempts(), 0);

        client.connect(AuthContext::new("abc")).await.unwrap();
        assert!(client.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout() {
        let (mock, _server_ends) = MockConnector::new();
        mock.script([Outcome::Hang]);
        let config = WebSocketConfig::builder()
            .auto_ping(false)
            .connect_timeout_ms(500)
            .build();
        let (client, _) = client(&mock, config);

        let err = client.connect(AuthContext::new("abc")).await.unwrap_err();
        assert_eq!(err, ConnectionError::Timeout { timeout_ms: 500 });
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_connects_share_one_handshake() {
        let (mock, _server_ends) = MockConnector::new();
        mock.script([Outcome::AcceptAfter(Duration::from_millis(200))]);
        let (client, _) = client(&mock, test_config());

        let (first, second) = tokio::join!(
            client.connect(AuthContext::new("abc")),
            client.connect(AuthContext::new("abc"))
        );
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(mock.attempt_count(), 1);
    }

    #[tokio::test]
    async fn test_send_writes_envelope_json() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());
        client.connect(AuthContext::new("abc")).await.unwrap();
        let mut server = accepted(&mut server_ends).await;

        let envelope = MessageEnvelope::new(MessageKind::Message, "alice", "hi")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        client.send(&envelope).unwrap();

        let frame = server.next_frame().await.unwrap();
        assert_eq!(frame, WebSocketMessage::Text(envelope.to_json().unwrap()));
    }

    #[tokio::test]
    async fn test_send_while_not_open_is_dropped() {
        let (mock, _server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());
        let mut events = client.events();

        let err = client.send(&MessageEnvelope::chat("alice", "hi")).unwrap_err();
        assert_eq!(err, ConnectionError::NotConnected);
        assert_eq!(
            next_event(&mut events).await,
            ConnectionEvent::MessageDropped {
                error: ConnectionError::NotConnected
            }
        );
        assert_eq!(mock.attempt_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_connecting_is_dropped() {
        let (mock, mut server_ends) = MockConnector::new();
        mock.script([Outcome::AcceptAfter(Duration::from_millis(200))]);
        let (client, _) = client(&mock, test_config());
        let mut events = client.events();

        let (connected, sent) = tokio::join!(client.connect(AuthContext::new("abc")), async {
            sleep(Duration::from_millis(10)).await;
            assert_eq!(client.state(), ConnectionState::Connecting);
            client.send(&MessageEnvelope::chat("alice", "early"))
        });
        connected.unwrap();
        assert_eq!(sent, Err(ConnectionError::NotConnected));

        let seen = events_until(&mut events, |e| matches!(e, ConnectionEvent::MessageDropped { .. })).await;
        assert_eq!(
            seen.last(),
            Some(&ConnectionEvent::MessageDropped {
                error: ConnectionError::NotConnected
            })
        );

        let mut server = accepted(&mut server_ends).await;
        assert!(timeout(Duration::from_millis(100), server.next_frame()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_during_backoff_is_dropped() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());

        client.connect(AuthContext::new("abc")).await.unwrap();
        let mut events = client.events();
        drop(accepted(&mut server_ends).await);

        events_until(&mut events, |e| matches!(e, ConnectionEvent::Reconnecting { .. })).await;
        assert_eq!(client.state(), ConnectionState::Closed);

        assert_eq!(
            client.send(&MessageEnvelope::chat("alice", "lost")),
            Err(ConnectionError::NotConnected)
        );
        assert_eq!(
            next_event(&mut events).await,
            ConnectionEvent::MessageDropped {
                error: ConnectionError::NotConnected
            }
        );

        let mut server = accepted(&mut server_ends).await;
        assert_eq!(next_event(&mut events).await, ConnectionEvent::Connected);
        assert!(timeout(Duration::from_millis(100), server.next_frame()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_heartbeat_without_auto_ping() {
        let configs = [
            WebSocketConfig::builder()
                .auto_ping(false)
                .heartbeat_interval_ms(0)
                .build(),
            WebSocketConfig {
                heartbeat_interval_ms: 0,
                pong_timeout_ms: 0,
                ..test_config()
            },
        ];

        for config in configs {
            let (mock, mut server_ends) = MockConnector::new();
            let (client, registry) = client(&mock, config);
            let mut received = collect_envelopes(&registry);
            let mut events = client.events();

            client.connect(AuthContext::new("abc")).await.unwrap();
            let server = accepted(&mut server_ends).await;
            server.push_text(r#"{"type":"message","username":"bob","content":"hello"}"#);
            assert_eq!(received.recv().await.unwrap().content, "hello");

            drop(server);
            let seen = events_until(&mut events, |e| matches!(e, ConnectionEvent::Reconnecting { .. })).await;
            assert!(seen.iter().any(|e| matches!(e, ConnectionEvent::Disconnected { .. })));
            assert_eq!(client.state(), ConnectionState::Closed);
        }
    }

    #[tokio::test]
    async fn test_echo_delivers_equal_envelope() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, registry) = client(&mock, test_config());
        let mut received = collect_envelopes(&registry);

        client.connect(AuthContext::new("abc")).await.unwrap();
        let mut server = accepted(&mut server_ends).await;
        assert!(server.url.ends_with("token=abc"));

        let envelope = MessageEnvelope::new(MessageKind::Message, "alice", "hi")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        client.send(&envelope).unwrap();

        let frame = server.next_frame().await.unwrap();
        server.push(frame);

        assert_eq!(received.recv().await.unwrap(), envelope);
        assert!(received.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_frame_is_skipped() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, registry) = client(&mock, test_config());
        let mut received = collect_envelopes(&registry);
        let mut events = client.events();

        client.connect(AuthContext::new("abc")).await.unwrap();
        let server = accepted(&mut server_ends).await;

        server.push_text("{not json");
        server.push_text(r#"{"type":"message","username":"bob","content":"still here"}"#);

        let envelope = received.recv().await.unwrap();
        assert_eq!(envelope.content, "still here");
        assert_eq!(client.state(), ConnectionState::Open);

        let seen = events_until(&mut events, |e| matches!(e, ConnectionEvent::MalformedFrame { .. })).await;
        assert!(matches!(seen.last(), Some(ConnectionEvent::MalformedFrame { .. })));
    }

    #[tokio::test]
    async fn test_binary_frames_are_decoded() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, registry) = client(&mock, test_config());
        let mut received = collect_envelopes(&registry);

        client.connect(AuthContext::new("abc")).await.unwrap();
        let server = accepted(&mut server_ends).await;
        server.push(WebSocketMessage::binary(
            br#"{"type":"user_left","username":"bob"}"#.to_vec(),
        ));

        assert_eq!(received.recv().await.unwrap().kind, MessageKind::UserLeft);
    }

    #[tokio::test]
    async fn test_ping_is_answered() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());
        client.connect(AuthContext::new("abc")).await.unwrap();
        let mut server = accepted(&mut server_ends).await;

        server.push(WebSocketMessage::ping(vec![7]));
        assert_eq!(server.next_frame().await, Some(WebSocketMessage::pong(vec![7])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_schedule_and_ceiling() {
        let (mock, mut server_ends) = MockConnector::new();
        mock.script(std::iter::once(Outcome::Accept).chain(
            (0..5).map(|_| Outcome::Fail(ConnectionError::transport("connection refused"))),
        ));
        let (client, _) = client(&mock, test_config());
        let mut events = client.events();

        client.connect(AuthContext::new("abc")).await.unwrap();
        let server = accepted(&mut server_ends).await;
        let closed_at = Instant::now();
        drop(server);

        let seen = events_until(&mut events, |e| matches!(e, ConnectionEvent::GaveUp { .. })).await;
        let scheduled: Vec<(u32, Duration)> = seen
            .iter()
            .filter_map(|e| match e {
                ConnectionEvent::Reconnecting { attempt, delay, .. } => Some((*attempt, *delay)),
                _ => None,
            })
            .collect();
        assert_eq!(
            scheduled,
            (1..=5).map(|n| (n, Duration::from_secs(u64::from(n)))).collect::<Vec<_>>()
        );
        assert_eq!(seen.last(), Some(&ConnectionEvent::GaveUp { attempts: 5 }));

        let times = mock.attempt_times();
        assert_eq!(times.len(), 6);
        let mut previous = closed_at;
        for (n, at) in times[1..].iter().enumerate() {
            let waited = *at - previous;
            let expected = Duration::from_secs(n as u64 + 1);
            assert!(waited >= expected, "attempt {} after {waited:?}", n + 1);
            assert!(waited < expected + Duration::from_millis(100));
            previous = *at;
        }

        sleep(Duration::from_secs(60)).await;
        assert_eq!(mock.attempt_count(), 6);
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_reconnect_resets_attempts() {
        let (mock, mut server_ends) = MockConnector::new();
        mock.script([
            Outcome::Accept,
            Outcome::Fail(ConnectionError::transport("connection refused")),
            Outcome::Accept,
        ]);
        let (client, _) = client(&mock, test_config());

        client.connect(AuthContext::new("abc")).await.unwrap();
        let mut events = client.events();
        drop(accepted(&mut server_ends).await);

        let seen = events_until(&mut events, |e| *e == ConnectionEvent::Connected).await;
        assert!(seen.contains(&ConnectionEvent::Reconnecting {
            attempt: 2,
            max_attempts: 5,
            delay: Duration::from_secs(2),
        }));
        assert_eq!(client.state(), ConnectionState::Open);
        assert_eq!(client.reconnect_attempts(), 0);
        let server = accepted(&mut server_ends).await;
        assert!(server.url.ends_with("token=abc"));

        // A new episode starts from the first delay again.
        drop(server);
        let seen = events_until(&mut events, |e| matches!(e, ConnectionEvent::Reconnecting { .. })).await;
        assert!(matches!(
            seen.last(),
            Some(ConnectionEvent::Reconnecting { attempt: 1, delay, .. }) if *delay == Duration::from_secs(1)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_close_frame_triggers_reconnect() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());
        let mut events = client.events();

        client.connect(AuthContext::new("abc")).await.unwrap();
        let server = accepted(&mut server_ends).await;
        server.push(WebSocketMessage::close(1001, "going away"));

        let seen = events_until(&mut events, |e| matches!(e, ConnectionEvent::Disconnected { .. })).await;
        assert!(matches!(
            seen.last(),
            Some(ConnectionEvent::Disconnected { reason }) if reason.contains("going away")
        ));
        assert_eq!(
            next_event(&mut events).await,
            ConnectionEvent::Reconnecting {
                attempt: 1,
                max_attempts: 5,
                delay: Duration::from_secs(1),
            }
        );
        assert_eq!(next_event(&mut events).await, ConnectionEvent::Connected);
        assert_eq!(mock.attempt_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_retry() {
        let (mock, mut server_ends) = MockConnector::new();
        mock.script([
            Outcome::Accept,
            Outcome::Fail(ConnectionError::transport("connection refused")),
        ]);
        let (client, _) = client(&mock, test_config());
        let mut events = client.events();

        client.connect(AuthContext::new("abc")).await.unwrap();
        drop(accepted(&mut server_ends).await);

        events_until(&mut events, |e| {
            matches!(e, ConnectionEvent::Reconnecting { attempt: 2, .. })
        })
        .await;
        assert_eq!(client.reconnect_attempts(), 2);

        client.disconnect();
        assert_eq!(client.state(), ConnectionState::Idle);
        assert_eq!(client.reconnect_attempts(), 0);
        assert_eq!(client.identity(), None);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(mock.attempt_count(), 2);
        assert_eq!(client.state(), ConnectionState::Idle);

        client.connect(AuthContext::new("abc")).await.unwrap();
        assert_eq!(mock.attempt_count(), 3);
        assert_eq!(client.reconnect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_abandons_pending_connect() {
        let (mock, _server_ends) = MockConnector::new();
        mock.script([Outcome::Hang]);
        let (client, _) = client(&mock, test_config());
        let client = Arc::new(client);

        let pending = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.connect(AuthContext::new("abc")).await })
        };
        client
            .watch_state()
            .wait_for(|state| *state == ConnectionState::Connecting)
            .await
            .unwrap();
        while mock.attempt_count() == 0 {
            tokio::task::yield_now().await;
        }

        client.disconnect();
        assert_eq!(pending.await.unwrap(), Err(ConnectionError::Cancelled));
        assert_eq!(client.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_disconnect_when_idle_is_noop() {
        let (mock, _server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());
        let mut events = client.events();

        client.disconnect();
        client.disconnect();
        assert_eq!(client.state(), ConnectionState::Idle);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_closes_transport() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());
        client.connect(AuthContext::new("abc")).await.unwrap();
        let mut server = accepted(&mut server_ends).await;

        client.disconnect();
        assert!(matches!(server.next_frame().await, Some(WebSocketMessage::Close(Some(_)))));
        assert_eq!(server.next_frame().await, None);
        assert_eq!(
            client.send(&MessageEnvelope::chat("alice", "late")),
            Err(ConnectionError::NotConnected)
        );
    }

    #[tokio::test]
    async fn test_disconnect_wins_over_queued_frames() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());
        client.connect(AuthContext::new("abc")).await.unwrap();
        let mut server = accepted(&mut server_ends).await;

        client.send(&MessageEnvelope::chat("alice", "queued")).unwrap();
        client.disconnect();

        assert!(matches!(server.next_frame().await, Some(WebSocketMessage::Close(Some(_)))));
        assert_eq!(server.next_frame().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_pong_closes_connection() {
        let (mock, mut server_ends) = MockConnector::new();
        let config = WebSocketConfig::builder()
            .heartbeat_interval_ms(1_000)
            .pong_timeout_ms(500)
            .reconnect_enabled(false)
            .build();
        let (client, _) = client(&mock, config);
        let mut events = client.events();

        client.connect(AuthContext::new("abc")).await.unwrap();
        let mut server = accepted(&mut server_ends).await;
        assert_eq!(server.next_frame().await, Some(WebSocketMessage::ping(Vec::new())));

        let seen = events_until(&mut events, |e| matches!(e, ConnectionEvent::GaveUp { .. })).await;
        assert!(seen.iter().any(|e| matches!(
            e,
            ConnectionEvent::Disconnected { reason } if reason.contains("no pong")
        )));
        assert_eq!(seen.last(), Some(&ConnectionEvent::GaveUp { attempts: 0 }));
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_keeps_connection_alive() {
        let (mock, mut server_ends) = MockConnector::new();
        let config = WebSocketConfig::builder()
            .heartbeat_interval_ms(1_000)
            .pong_timeout_ms(500)
            .build();
        let (client, _) = client(&mock, config);

        client.connect(AuthContext::new("abc")).await.unwrap();
        let mut server = accepted(&mut server_ends).await;
        for _ in 0..3 {
            assert_eq!(server.next_frame().await, Some(WebSocketMessage::ping(Vec::new())));
            server.push(WebSocketMessage::pong(Vec::new()));
        }
        assert!(client.is_connected());
        assert_eq!(mock.attempt_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_disconnects() {
        let (mock, mut server_ends) = MockConnector::new();
        let (client, _) = client(&mock, test_config());
        client.connect(AuthContext::new("abc")).await.unwrap();
        let mut server = accepted(&mut server_ends).await;

        drop(client);
        assert!(matches!(server.next_frame().await, Some(WebSocketMessage::Close(_))));
    }
}
