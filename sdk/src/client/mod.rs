//! HTTP client for the trading dashboard REST API.
//!
//! The dashboard snapshot seeds the view state before the push channels
//! start delivering deltas, and can be re-fetched to reconcile it.
//!
//! # Example
//!
//! ```rust,ignore
//! use smart_trading_sdk::client::{ClientConfig, TradingClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("http://localhost:8000").with_session_id("abc123");
//!     let client = TradingClient::new(config)?;
//!
//!     let dashboard = client.get_dashboard().await?;
//!     println!("{} open positions", dashboard.open_positions.len());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::TradingClient;
