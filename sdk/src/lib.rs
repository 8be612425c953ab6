//! Smart Trading SDK - real-time sync core for the Smart Trading platform.
//!
//! This crate keeps a client's view of a virtual trading account in sync
//! with the backend over two WebSocket push channels.
//!
//! # Modules
//!
//! - [`ws`]: Push channels, [`ChannelManager`], [`EventBus`] and
//!   [`MessageRouter`]
//! - [`view`]: [`ViewState`] fold rules and the [`ViewBinding`] that applies
//!   them to bus events
//! - [`types`]: Wallet, trade, price and dashboard payloads
//! - [`client`]: REST client for the dashboard snapshot
//!
//! # Example
//!
//! ```rust,ignore
//! use smart_trading_sdk::{ChannelManager, EventBus, ViewBinding, WsConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new();
//!     let view = ViewBinding::attach(&bus);
//!
//!     let manager = ChannelManager::new(WsConfig::new("localhost:8000"), bus)?;
//!     manager.connect_trading("42")?;
//!     manager.connect_prices()?;
//!     manager.start_ping();
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!     println!("{} open trades", view.snapshot().open_trades.len());
//!
//!     manager.disconnect();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod types;
pub mod view;
pub mod ws;

pub use client::{ClientConfig, ClientError, TradingClient};
pub use types::{
    DashboardSnapshot, PriceEntry, PriceTick, TradeRecord, TradeSide, TradeStatus, WalletSnapshot,
};
pub use view::{ViewBinding, ViewState, RECENT_TRADES_CAP};
pub use ws::{
    AggregateStatus, Channel, ChannelManager, ChannelRole, ClientCommand, ConnectionState,
    ConnectionStatus, ErrorEvent, ErrorKind, Event, EventBus, EventKind, MessageRouter,
    Notification, NotificationLevel, WsConfig, WsError,
};
