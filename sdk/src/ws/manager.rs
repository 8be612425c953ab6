//! Owner of the trading and price channels.
//!
//! Builds the endpoints from [`WsConfig`], runs the heartbeat timer and
//! reports the combined connection status.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

use super::bus::EventBus;
use super::channel::{Channel, ConnectionState};
use super::config::WsConfig;
use super::endpoint::{ChannelEndpoint, ChannelRole};
use super::error::WsError;
use super::messages::ClientCommand;
use super::metrics::ChannelMetrics;
use super::transport::{Connector, TungsteniteConnector};

/// Combined connection status for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateStatus {
    /// Both channels are open.
    Connected,
    /// At least one channel is connecting.
    Connecting,
    /// Anything else.
    Disconnected,
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Instantaneous state of both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionStatus {
    /// Trading channel state.
    pub trading: ConnectionState,
    /// Price channel state.
    pub price: ConnectionState,
}

impl ConnectionStatus {
    /// Classifies the pair into a single status.
    #[must_use]
    pub fn aggregate(&self) -> AggregateStatus {
        match (self.trading, self.price) {
            (ConnectionState::Open, ConnectionState::Open) => AggregateStatus::Connected,
            (ConnectionState::Connecting, _) | (_, ConnectionState::Connecting) => {
                AggregateStatus::Connecting
            }
            _ => AggregateStatus::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (trading: {}, price: {})",
            self.aggregate(),
            self.trading,
            self.price
        )
    }
}

/// Manages the two push channels of one client session.
///
/// Construct one per application root and share it by reference; dropping
/// it disconnects both channels.
pub struct ChannelManager {
    config: WsConfig,
    bus: EventBus,
    metrics: Arc<ChannelMetrics>,
    trading: Channel,
    price: Channel,
    ping: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelManager")
            .field("config", &self.config)
            .field("trading", &self.trading)
            .field("price", &self.price)
            .finish_non_exhaustive()
    }
}

impl ChannelManager {
    /// Creates a manager that connects over `tokio-tungstenite`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: WsConfig, bus: EventBus) -> Result<Self, WsError> {
        Self::with_connector(config, bus, Arc::new(TungsteniteConnector))
    }

    /// Creates a manager with a custom connector.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_connector(
        config: WsConfig,
        bus: EventBus,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, WsError> {
        config.validate()?;

        let metrics = Arc::new(ChannelMetrics::new());
        let trading = Channel::new(
            ChannelRole::Trading,
            &config,
            Arc::clone(&connector),
            bus.clone(),
            Arc::clone(&metrics),
        );
        let price = Channel::new(
            ChannelRole::Price,
            &config,
            connector,
            bus.clone(),
            Arc::clone(&metrics),
        );

        Ok(Self {
            config,
            bus,
            metrics,
            trading,
            price,
            ping: Mutex::new(None),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Returns the event bus the channels publish on.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Returns the shared channel metrics.
    #[must_use]
    pub fn metrics(&self) -> &Arc<ChannelMetrics> {
        &self.metrics
    }

    /// Returns the trading channel.
    #[must_use]
    pub fn trading(&self) -> &Channel {
        &self.trading
    }

    /// Returns the price channel.
    #[must_use]
    pub fn price(&self) -> &Channel {
        &self.price
    }

    /// Opens the trading channel for `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity is empty.
    pub fn connect_trading(&self, identity: &str) -> Result<(), WsError> {
        let endpoint = ChannelEndpoint::trading(self.config.scheme, &self.config.host, identity)?;
        self.trading.connect(endpoint)
    }

    /// Opens the price channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel rejects the endpoint.
    pub fn connect_prices(&self) -> Result<(), WsError> {
        let endpoint = ChannelEndpoint::prices(self.config.scheme, &self.config.host);
        self.price.connect(endpoint)
    }

    /// Starts the heartbeat. Every interval a ping is sent on each open channel.
    ///
    /// Does nothing if the heartbeat is already running.
    pub fn start_ping(&self) {
        let mut ping = self.ping.lock().unwrap_or_else(PoisonError::into_inner);
        if ping.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("heartbeat already running");
            return;
        }

        let period = self.config.heartbeat_interval;
        let channels = [self.trading.clone(), self.price.clone()];

        *ping = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                for channel in &channels {
                    if channel.is_open() {
                        channel.send(ClientCommand::Ping);
                    }
                }
            }
        }));
        info!(period_secs = period.as_secs(), "heartbeat started");
    }

    /// Stops the heartbeat.
    pub fn stop_ping(&self) {
        let handle = self
            .ping
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            info!("heartbeat stopped");
        }
    }

    /// Returns true if the heartbeat is running.
    #[must_use]
    pub fn is_pinging(&self) -> bool {
        self.ping
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Asks the trading channel for fresh wallet and open-trade snapshots.
    ///
    /// Returns false if either request could not be sent.
    pub fn request_snapshots(&self) -> bool {
        let wallet = self.trading.send(ClientCommand::GetWalletData);
        let trades = self.trading.send(ClientCommand::GetOpenTrades);
        wallet && trades
    }

    /// Sends a command on the trading channel.
    pub fn send_trading(&self, command: ClientCommand) -> bool {
        self.trading.send(command)
    }

    /// Sends a command on the price channel.
    pub fn send_price(&self, command: ClientCommand) -> bool {
        self.price.send(command)
    }

    /// Stops the heartbeat and closes both channels.
    ///
    /// Safe to call repeatedly and before anything was connected.
    pub fn disconnect(&self) {
        self.stop_ping();
        self.trading.disconnect();
        self.price.disconnect();
    }

    /// Returns the state of both channels.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus {
            trading: self.trading.state(),
            price: self.price.state(),
        }
    }
}

impl Drop for ChannelManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::transport::mock::MockConnector;
    use std::time::Duration;
    use tokio::time::sleep;

    const PING: &str = r#"{"type":"ping"}"#;

    fn manager() -> (ChannelManager, MockConnector) {
        let connector = MockConnector::new();
        let manager = ChannelManager::with_connector(
            WsConfig::default(),
            EventBus::new(),
            Arc::new(connector.clone()),
        )
        .expect("manager");
        (manager, connector)
    }

    async fn settle() {
        sleep(Duration::from_millis(1)).await;
    }

    fn pings(sent: &[String]) -> usize {
        sent.iter().filter(|s| s.as_str() == PING).count()
    }

    /// Connects trading first so that session 0 is trading and 1 is price.
    async fn connect_both(manager: &ChannelManager) {
        manager.connect_trading("user@example.com").expect("trading");
        settle().await;
        manager.connect_prices().expect("prices");
        settle().await;
    }

    #[test]
    fn test_aggregate_status() {
        use ConnectionState::*;

        let status = |trading, price| ConnectionStatus { trading, price }.aggregate();
        assert_eq!(status(Open, Open), AggregateStatus::Connected);
        assert_eq!(status(Open, Connecting), AggregateStatus::Connecting);
        assert_eq!(status(Connecting, Closed), AggregateStatus::Connecting);
        assert_eq!(status(Open, Closed), AggregateStatus::Disconnected);
        assert_eq!(status(Closing, Open), AggregateStatus::Disconnected);
        assert_eq!(status(Closed, Closed), AggregateStatus::Disconnected);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = ChannelManager::new(WsConfig::new(""), EventBus::new()).expect_err("invalid");
        assert!(matches!(err, WsError::InvalidConfig(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_both_channels() {
        let (manager, connector) = manager();
        assert_eq!(
            manager.connection_status().aggregate(),
            AggregateStatus::Disconnected
        );

        connect_both(&manager).await;

        assert_eq!(
            connector.urls(),
            vec![
                "ws://localhost:8000/ws/trading/user%40example.com/",
                "ws://localhost:8000/ws/prices/",
            ]
        );
        assert_eq!(
            manager.connection_status().aggregate(),
            AggregateStatus::Connected
        );
        assert_eq!(manager.metrics().connections_opened(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_prices_twice_opens_one_socket() {
        let (manager, connector) = manager();
        manager.connect_prices().expect("prices");
        manager.connect_prices().expect("prices again");
        settle().await;
        manager.connect_prices().expect("prices once more");
        settle().await;

        assert_eq!(connector.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_trading_rejects_empty_identity() {
        let (manager, connector) = manager();
        assert!(manager.connect_trading("").is_err());
        assert_eq!(connector.connect_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_every_interval_on_open_channels() {
        let (manager, connector) = manager();
        connect_both(&manager).await;

        manager.start_ping();
        manager.start_ping();
        assert!(manager.is_pinging());

        sleep(Duration::from_secs(29)).await;
        assert_eq!(pings(&connector.sent(0)), 0);
        assert_eq!(pings(&connector.sent(1)), 0);

        sleep(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(pings(&connector.sent(0)), 1);
        assert_eq!(pings(&connector.sent(1)), 1);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(pings(&connector.sent(0)), 2);
        assert_eq!(pings(&connector.sent(1)), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_skips_channels_that_are_not_open() {
        let (manager, connector) = manager();
        manager.connect_trading("42").expect("trading");
        settle().await;

        manager.start_ping();
        sleep(Duration::from_secs(31)).await;

        assert_eq!(pings(&connector.sent(0)), 1);
        assert_eq!(connector.session_count(), 1);
        assert_eq!(manager.metrics().sends_dropped(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ping() {
        let (manager, connector) = manager();
        connect_both(&manager).await;

        manager.start_ping();
        manager.stop_ping();
        assert!(!manager.is_pinging());

        sleep(Duration::from_secs(90)).await;
        assert_eq!(pings(&connector.sent(0)), 0);
        assert_eq!(pings(&connector.sent(1)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_snapshots() {
        let (manager, connector) = manager();
        assert!(!manager.request_snapshots());

        manager.connect_trading("42").expect("trading");
        settle().await;
        assert!(manager.request_snapshots());
        settle().await;

        assert_eq!(
            connector.sent(0),
            vec![
                r#"{"type":"get_wallet_data"}"#.to_string(),
                r#"{"type":"get_open_trades"}"#.to_string(),
                r#"{"type":"get_wallet_data"}"#.to_string(),
                r#"{"type":"get_open_trades"}"#.to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_tears_down_everything() {
        let (manager, connector) = manager();
        connect_both(&manager).await;
        manager.start_ping();

        manager.disconnect();
        manager.disconnect();
        settle().await;

        let status = manager.connection_status();
        assert_eq!(status.trading, ConnectionState::Closed);
        assert_eq!(status.price, ConnectionState::Closed);
        assert!(!manager.is_pinging());

        sleep(Duration::from_secs(120)).await;
        assert_eq!(connector.connect_count(), 2);
        assert_eq!(pings(&connector.sent(0)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_when_never_connected() {
        let (manager, connector) = manager();
        manager.disconnect();
        manager.disconnect();
        assert_eq!(
            manager.connection_status().aggregate(),
            AggregateStatus::Disconnected
        );
        assert_eq!(connector.connect_count(), 0);
    }
}
