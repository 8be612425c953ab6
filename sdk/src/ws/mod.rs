//! Real-time push channels.
//!
//! Two independent WebSocket channels feed one [`EventBus`]:
//!
//! - the trading channel (`/ws/trading/{identity}/`) carries wallet
//!   snapshots, open-trade lists and trade deltas for one user;
//! - the price channel (`/ws/prices/`) carries price ticks and trade
//!   execution notices.
//!
//! [`ChannelManager`] owns both channels and the heartbeat. Inbound frames
//! are classified by [`MessageRouter`] and published as typed [`Event`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! use smart_trading_sdk::ws::{ChannelManager, EventBus, EventKind, WsConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new();
//!     bus.on(
//!         EventKind::WalletData,
//!         &EventBus::handler(|event| println!("{:?}", event)),
//!     );
//!
//!     let manager = ChannelManager::new(WsConfig::new("localhost:8000"), bus)?;
//!     manager.connect_trading("42")?;
//!     manager.connect_prices()?;
//!     manager.start_ping();
//!
//!     tokio::signal::ctrl_c().await?;
//!     manager.disconnect();
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod channel;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod manager;
pub mod messages;
pub mod metrics;
pub mod reconnect;
pub mod router;
pub mod transport;

pub use bus::{EventBus, Handler};
pub use channel::{Channel, ConnectionState};
pub use config::WsConfig;
pub use endpoint::{ChannelEndpoint, ChannelRole, Scheme};
pub use error::WsError;
pub use events::{ErrorEvent, ErrorKind, Event, EventKind, Notification, NotificationLevel};
pub use manager::{AggregateStatus, ChannelManager, ConnectionStatus};
pub use messages::{ClientCommand, Frame, InboundFrame, PriceFrame, ServerError, TradingFrame};
pub use metrics::{ChannelMetrics, MetricsSnapshot};
pub use reconnect::ReconnectPolicy;
pub use router::{MessageRouter, RouteError};
pub use transport::{Connector, FrameSink, FrameStream, Transport, TungsteniteConnector};
