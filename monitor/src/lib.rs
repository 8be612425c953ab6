//! Smart Trading Monitor - headless follower for a user's virtual trades.
//!
//! Keeps a [`ViewState`](smart_trading_sdk::ViewState) in sync over the
//! trading and price channels, logs trade notifications and periodically
//! reports connection status.
//!
//! # Components
//!
//! - [`config`]: Monitor configuration
//! - [`service`]: Main monitor service

pub mod config;
pub mod service;

pub use config::{ConfigError, MonitorConfig};
pub use service::{MonitorService, ServiceError};
