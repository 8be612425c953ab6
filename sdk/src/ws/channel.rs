//! A single push channel.
//!
//! Owns one socket at a time, tracks its [`ConnectionState`], feeds inbound
//! frames to the router and reconnects with bounded exponential backoff
//! after an unexpected close.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::bus::EventBus;
use super::config::WsConfig;
use super::endpoint::{ChannelEndpoint, ChannelRole};
use super::error::WsError;
use super::events::{ErrorEvent, ErrorKind, Event, EXHAUSTED_MESSAGE, TRANSPORT_ERROR_MESSAGE};
use super::messages::ClientCommand;
use super::metrics::ChannelMetrics;
use super::reconnect::ReconnectPolicy;
use super::router::MessageRouter;
use super::transport::{Connector, Transport};

/// Commands the trading channel sends as soon as it opens.
const TRADING_BOOTSTRAP: [ClientCommand; 2] =
    [ClientCommand::GetWalletData, ClientCommand::GetOpenTrades];

/// Socket state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Socket is being opened.
    Connecting,
    /// Socket is open.
    Open,
    /// Socket is closing after a disconnect.
    Closing,
    /// No socket.
    #[default]
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

struct ChannelInner {
    /// Role binding. `None` after `disconnect`, which suppresses reconnection.
    endpoint: Option<ChannelEndpoint>,
    state: ConnectionState,
    policy: ReconnectPolicy,
    outbound: Option<mpsc::UnboundedSender<String>>,
    /// Bumped for every new session; callbacks from older sessions are ignored.
    generation: u64,
    reconnect: Option<JoinHandle<()>>,
    exhausted: bool,
}

impl ChannelInner {
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn cancel_reconnect(&mut self) {
        if let Some(handle) = self.reconnect.take() {
            handle.abort();
        }
    }
}

struct Shared {
    role: ChannelRole,
    connector: Arc<dyn Connector>,
    bus: EventBus,
    router: MessageRouter,
    metrics: Arc<ChannelMetrics>,
    inner: Mutex<ChannelInner>,
}

/// One push channel (trading or price).
///
/// Cloning yields another handle to the same channel. All methods are
/// non-blocking; `connect` must be called from inside a Tokio runtime.
#[derive(Clone)]
pub struct Channel {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Channel")
            .field("role", &self.shared.role)
            .field("endpoint", &inner.endpoint)
            .field("state", &inner.state)
            .field("attempts", &inner.policy.attempts())
            .finish()
    }
}

impl Channel {
    /// Creates a closed channel.
    #[must_use]
    pub fn new(
        role: ChannelRole,
        config: &WsConfig,
        connector: Arc<dyn Connector>,
        bus: EventBus,
        metrics: Arc<ChannelMetrics>,
    ) -> Self {
        let router = MessageRouter::new(bus.clone(), Arc::clone(&metrics));

        Self {
            shared: Arc::new(Shared {
                role,
                connector,
                bus,
                router,
                metrics,
                inner: Mutex::new(ChannelInner {
                    endpoint: None,
                    state: ConnectionState::Closed,
                    policy: ReconnectPolicy::new(
                        config.max_reconnect_attempts,
                        config.reconnect_delay,
                    ),
                    outbound: None,
                    generation: 0,
                    reconnect: None,
                    exhausted: false,
                }),
            }),
        }
    }

    /// Returns the channel role.
    #[must_use]
    pub fn role(&self) -> ChannelRole {
        self.shared.role
    }

    /// Returns the current socket state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Returns true if the socket is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Returns the bound endpoint, if any.
    #[must_use]
    pub fn endpoint(&self) -> Option<ChannelEndpoint> {
        self.lock().endpoint.clone()
    }

    /// Returns the reconnect attempts made since the last successful open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.lock().policy.attempts()
    }

    /// Opens the channel to `endpoint`.
    ///
    /// Does nothing if the channel is already open or connecting to the same
    /// endpoint. Otherwise any pending reconnect is cancelled, the attempt
    /// count is reset and a new session replaces the current one.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint belongs to the other role.
    pub fn connect(&self, endpoint: ChannelEndpoint) -> Result<(), WsError> {
        let role = self.shared.role;
        if endpoint.role() != role {
            return Err(WsError::InvalidEndpoint(format!(
                "{} endpoint passed to the {} channel",
                endpoint.role(),
                role
            )));
        }

        let generation = {
            let mut inner = self.lock();
            if inner.endpoint.as_ref() == Some(&endpoint)
                && matches!(
                    inner.state,
                    ConnectionState::Open | ConnectionState::Connecting
                )
            {
                debug!(%role, state = %inner.state, "already connected");
                return Ok(());
            }

            inner.cancel_reconnect();
            inner.policy.reset();
            inner.exhausted = false;
            inner.outbound = None;
            inner.endpoint = Some(endpoint.clone());
            inner.state = ConnectionState::Connecting;
            inner.next_generation()
        };

        self.spawn_session(generation, endpoint);
        Ok(())
    }

    /// Sends a command on the open socket.
    ///
    /// Returns false, without queueing, if the channel is not open.
    pub fn send(&self, command: ClientCommand) -> bool {
        let role = self.shared.role;
        let inner = self.lock();

        let outbound = match inner.outbound.as_ref() {
            Some(tx) if inner.state == ConnectionState::Open => tx,
            _ => {
                warn!(%role, %command, state = %inner.state, "channel not open, dropping send");
                self.shared.metrics.record_send_dropped();
                return false;
            }
        };

        let text = match serde_json::to_string(&command) {
            Ok(text) => text,
            Err(e) => {
                warn!(%role, %command, error = %e, "failed to serialize command");
                self.shared.metrics.record_send_dropped();
                return false;
            }
        };

        if outbound.send(text).is_err() {
            warn!(%role, %command, "session ended, dropping send");
            self.shared.metrics.record_send_dropped();
            return false;
        }

        self.shared.metrics.record_message_sent();
        true
    }

    /// Closes the channel and suppresses reconnection.
    ///
    /// An open socket is closed gracefully (`Closing`, then `Closed`). Safe to
    /// call repeatedly and on a channel that never connected.
    pub fn disconnect(&self) {
        let role = self.shared.role;
        let mut inner = self.lock();

        inner.endpoint = None;
        inner.cancel_reconnect();
        inner.policy.reset();
        inner.exhausted = false;

        match inner.state {
            ConnectionState::Open => {
                inner.outbound = None;
                inner.state = ConnectionState::Closing;
                info!(%role, "closing channel");
            }
            ConnectionState::Connecting => {
                inner.next_generation();
                inner.state = ConnectionState::Closed;
                info!(%role, "connect aborted");
            }
            ConnectionState::Closing | ConnectionState::Closed => {
                debug!(%role, state = %inner.state, "already disconnected");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelInner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_session(&self, generation: u64, endpoint: ChannelEndpoint) {
        let channel = self.clone();
        tokio::spawn(async move {
            channel.run_session(generation, endpoint).await;
        });
    }

    async fn run_session(self, generation: u64, endpoint: ChannelEndpoint) {
        let role = self.shared.role;
        debug!(%role, url = %endpoint, generation, "connecting");

        let Transport {
            mut sink,
            mut stream,
        } = match self.shared.connector.connect(endpoint.url()).await {
            Ok(transport) => transport,
            Err(e) => {
                warn!(%role, error = %e, "connection failed");
                self.transport_error(generation);
                self.handle_close(generation);
                return;
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        if !self.handle_open(generation, tx) {
            debug!(%role, generation, "session superseded before open");
            return;
        }

        if role == ChannelRole::Trading {
            for command in TRADING_BOOTSTRAP {
                self.send(command);
            }
        }

        loop {
            tokio::select! {
                outbound = rx.recv() => match outbound {
                    Some(text) => {
                        if let Err(e) = sink.send(text).await {
                            warn!(%role, error = %e, "send failed");
                            self.transport_error(generation);
                            break;
                        }
                    }
                    None => {
                        if let Err(e) = sink.close().await {
                            debug!(%role, error = %e, "close handshake failed");
                        }
                        break;
                    }
                },
                inbound = stream.next() => match inbound {
                    Some(Ok(text)) => self.on_frame(generation, &text),
                    Some(Err(WsError::Closed)) | None => {
                        debug!(%role, "socket closed by peer");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(%role, error = %e, "socket error");
                        self.transport_error(generation);
                        break;
                    }
                },
            }
        }

        self.handle_close(generation);
    }

    fn handle_open(&self, generation: u64, outbound: mpsc::UnboundedSender<String>) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation || inner.endpoint.is_none() {
            return false;
        }

        inner.state = ConnectionState::Open;
        inner.policy.reset();
        inner.outbound = Some(outbound);
        self.shared.metrics.record_connection_opened();
        info!(role = %self.shared.role, "channel open");
        true
    }

    fn on_frame(&self, generation: u64, text: &str) {
        {
            let inner = self.lock();
            if inner.generation != generation
                || inner.endpoint.is_none()
                || inner.state != ConnectionState::Open
            {
                debug!(role = %self.shared.role, "dropping frame after teardown");
                return;
            }
        }
        self.shared.router.route(self.shared.role, text);
    }

    fn transport_error(&self, generation: u64) {
        {
            let inner = self.lock();
            if inner.generation != generation || inner.endpoint.is_none() {
                return;
            }
        }

        self.shared.metrics.record_error();
        self.shared.bus.emit(&Event::Error(ErrorEvent::new(
            ErrorKind::Transport,
            TRANSPORT_ERROR_MESSAGE,
            Some(self.shared.role),
        )));
    }

    fn handle_close(&self, generation: u64) {
        let role = self.shared.role;
        let mut inner = self.lock();
        if inner.generation != generation {
            return;
        }

        inner.state = ConnectionState::Closed;
        inner.outbound = None;
        self.shared.metrics.record_connection_closed();

        if inner.endpoint.is_none() {
            info!(%role, "channel closed");
            return;
        }

        if let Some(delay) = inner.policy.next_delay() {
            warn!(
                %role,
                attempt = inner.policy.attempts(),
                max_attempts = inner.policy.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                "connection lost, scheduling reconnect"
            );
            self.shared.metrics.record_reconnect_scheduled();

            let channel = self.clone();
            inner.reconnect = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                channel.reconnect(generation);
            }));
            return;
        }

        if inner.exhausted {
            return;
        }
        inner.exhausted = true;
        drop(inner);

        error!(%role, "reconnect attempts exhausted");
        self.shared.metrics.record_error();
        self.shared.bus.emit(&Event::Error(ErrorEvent::new(
            ErrorKind::Exhausted,
            EXHAUSTED_MESSAGE,
            Some(role),
        )));
    }

    fn reconnect(&self, generation: u64) {
        let (generation, endpoint) = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return;
            }
            let Some(endpoint) = inner.endpoint.clone() else {
                return;
            };

            inner.reconnect = None;
            inner.state = ConnectionState::Connecting;
            (inner.next_generation(), endpoint)
        };

        info!(role = %self.shared.role, attempt = self.reconnect_attempts(), "reconnecting");
        self.spawn_session(generation, endpoint);
    }
}
