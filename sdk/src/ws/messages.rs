//! WebSocket message types.
//!
//! Every frame, in both directions, is a JSON object `{"type": ..., "data": ...}`.
//! Outbound commands carry no data.

use serde::{Deserialize, Serialize};

use crate::types::{PriceTick, TradeRecord, WalletSnapshot};

/// Client-to-server commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Request a wallet snapshot.
    GetWalletData,
    /// Request the full open-trade list.
    GetOpenTrades,
    /// Heartbeat.
    Ping,
}

impl ClientCommand {
    /// Returns the wire `type` of the command.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GetWalletData => "get_wallet_data",
            Self::GetOpenTrades => "get_open_trades",
            Self::Ping => "ping",
        }
    }
}

impl std::fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First-stage view of an inbound frame.
///
/// Only the discriminator is interpreted; `data` is decoded per type by the
/// router.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundFrame {
    /// Frame discriminator.
    #[serde(rename = "type")]
    pub kind: String,

    /// Frame payload.
    #[serde(default)]
    pub data: serde_json::Value,

    /// Top-level message, used by server error frames that skip `data`.
    #[serde(default)]
    pub message: Option<String>,
}

/// Application error sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Human-readable message.
    pub message: String,
}

/// Frames received on the trading channel.
#[derive(Debug, Clone, PartialEq)]
pub enum TradingFrame {
    /// Wallet snapshot.
    WalletData(WalletSnapshot),
    /// Full open-trade list.
    OpenTrades(Vec<TradeRecord>),
    /// Single trade delta.
    TradeUpdate(TradeRecord),
    /// Heartbeat reply.
    Pong,
    /// Application error.
    Error(ServerError),
    /// A frame type this client does not know.
    Unrecognized(String),
}

/// Frames received on the price channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceFrame {
    /// Price tick.
    PriceUpdate(PriceTick),
    /// Trade execution notice.
    TradeExecuted(TradeRecord),
    /// Heartbeat reply.
    Pong,
    /// Application error.
    Error(ServerError),
    /// A frame type this client does not know.
    Unrecognized(String),
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Trading channel frame.
    Trading(TradingFrame),
    /// Price channel frame.
    Price(PriceFrame),
}
