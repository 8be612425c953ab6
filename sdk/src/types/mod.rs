//! Core types for the Smart Trading SDK.
//!
//! Wire payloads shared by the push channels and the REST dashboard.

pub mod dashboard;
pub mod price;
pub mod trade;
pub mod wallet;

pub use dashboard::DashboardSnapshot;
pub use price::{PriceEntry, PriceTick};
pub use trade::{TradeRecord, TradeSide, TradeStatus};
pub use wallet::WalletSnapshot;
