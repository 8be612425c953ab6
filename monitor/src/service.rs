//! Main monitor service.
//!
//! Seeds the view from the dashboard endpoint, keeps it in sync over both
//! push channels and logs notifications and connection status until stopped.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use smart_trading_sdk::ws::{Connector, Handler, TungsteniteConnector};
use smart_trading_sdk::{
    ChannelManager, ClientError, Event, EventBus, EventKind, NotificationLevel, TradingClient,
    ViewBinding, ViewState, WsError,
};
use tokio::sync::Notify;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

use super::config::{ConfigError, MonitorConfig};

/// Event kinds the service reacts to besides the view fold.
const OBSERVED_KINDS: [EventKind; 3] = [
    EventKind::Notification,
    EventKind::Error,
    EventKind::TradeUpdate,
];

/// Service errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Push channel error.
    #[error(transparent)]
    Ws(#[from] WsError),

    /// REST client error.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// The monitor service.
pub struct MonitorService {
    /// Configuration.
    config: MonitorConfig,

    /// Event bus shared by the channels, the view and the observer.
    bus: EventBus,

    /// Push channels.
    manager: Arc<ChannelManager>,

    /// View kept in sync with the channels.
    view: ViewBinding,

    /// Dashboard client, if a REST base URL is configured.
    client: Option<TradingClient>,

    /// Logs notifications and reacts to closed trades and terminal errors.
    observer: Handler,

    /// Whether the service is running.
    running: Arc<AtomicBool>,

    /// Wakes the run loop on stop.
    stopped: Arc<Notify>,
}

impl std::fmt::Debug for MonitorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorService")
            .field("config", &self.config)
            .field("manager", &self.manager)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl MonitorService {
    /// Creates a service that connects over `tokio-tungstenite`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: MonitorConfig) -> Result<Self, ServiceError> {
        Self::with_connector(config, Arc::new(TungsteniteConnector))
    }

    /// Creates a service with a custom connector.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_connector(
        config: MonitorConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ServiceError> {
        config.validate()?;

        let client = config
            .client_config()
            .map(TradingClient::new)
            .transpose()?;

        let bus = EventBus::new();
        let view = ViewBinding::attach(&bus);
        let manager = Arc::new(ChannelManager::with_connector(
            config.ws_config(),
            bus.clone(),
            connector,
        )?);

        let running = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(Notify::new());
        let observer = observer(
            Arc::downgrade(&manager),
            Arc::clone(&running),
            Arc::clone(&stopped),
        );
        for kind in OBSERVED_KINDS {
            bus.on(kind, &observer);
        }

        Ok(Self {
            config,
            bus,
            manager,
            view,
            client,
            observer,
            running,
            stopped,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Returns the event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Returns the channel manager.
    #[must_use]
    pub fn manager(&self) -> &ChannelManager {
        &self.manager
    }

    /// Returns a copy of the current view.
    #[must_use]
    pub fn view(&self) -> ViewState {
        self.view.snapshot()
    }

    /// Returns true if the service is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stops the service.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.stopped.notify_one();
        info!("Monitor stop requested");
    }

    /// Seeds the view from the dashboard endpoint.
    ///
    /// Failures are logged; the push channels will fill the view anyway.
    pub async fn bootstrap(&self) {
        let Some(client) = self.client.as_ref() else {
            debug!("No REST base URL configured, skipping dashboard bootstrap");
            return;
        };

        match client.get_dashboard().await {
            Ok(snapshot) => {
                info!(
                    open_positions = snapshot.open_positions.len(),
                    recent_trades = snapshot.recent_trades.len(),
                    "Dashboard snapshot loaded"
                );
                self.view.apply_dashboard(snapshot);
            }
            Err(e) => warn!(error = %e, "Dashboard bootstrap failed"),
        }
    }

    /// Runs the service until `shutdown` resolves, [`stop`](Self::stop) is
    /// called or a channel gives up reconnecting.
    ///
    /// # Errors
    ///
    /// Returns an error if the channels cannot be opened.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), ServiceError>
    where
        F: Future<Output = ()>,
    {
        self.running.store(true, Ordering::Relaxed);
        self.bootstrap().await;

        self.manager.connect_trading(&self.config.user_id)?;
        self.manager.connect_prices()?;
        self.manager.start_ping();
        info!(user_id = %self.config.user_id, "Monitor started");

        let period = self.config.status_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        tokio::pin!(shutdown);

        while self.is_running() {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                () = self.stopped.notified() => {}
                _ = ticker.tick() => self.log_status(),
            }
        }

        self.running.store(false, Ordering::Relaxed);
        self.manager.disconnect();
        self.log_status();
        info!("Monitor stopped");
        Ok(())
    }

    /// Logs the connection status and a summary of the view.
    pub fn log_status(&self) {
        let status = self.manager.connection_status();
        let metrics = self.manager.metrics().snapshot();

        self.view.with_state(|view| {
            info!(
                status = %status,
                balance = ?view.wallet.as_ref().map(|w| w.balance),
                open_trades = view.open_trades.len(),
                recent_trades = view.recent_trades.len(),
                prices = view.prices.len(),
                unrealized_pnl = %view.total_unrealized_pnl(),
                frames = metrics.frames_received,
                reconnects = metrics.reconnects_scheduled,
                "Status"
            );
        });
    }
}

impl Drop for MonitorService {
    fn drop(&mut self) {
        for kind in OBSERVED_KINDS {
            self.bus.off(kind, &self.observer);
        }
    }
}

fn observer(
    manager: Weak<ChannelManager>,
    running: Arc<AtomicBool>,
    stopped: Arc<Notify>,
) -> Handler {
    EventBus::handler(move |event| match event {
        Event::Notification(notification) => match notification.level {
            NotificationLevel::Info => info!("{}", notification.message),
            NotificationLevel::Error => warn!("{}", notification.message),
        },
        Event::Error(err) if err.is_terminal() => {
            error!(error = %err, "Giving up");
            running.store(false, Ordering::Relaxed);
            stopped.notify_one();
        }
        Event::TradeUpdate(trade) if trade.is_closed() => {
            if let Some(manager) = manager.upgrade() {
                debug!(trade_id = trade.id, "Trade closed, refreshing snapshots");
                manager.request_snapshots();
            }
        }
        _ => {}
    })
}
