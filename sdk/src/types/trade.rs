//! Trade types for the Smart Trading SDK.
//!
//! Provides the virtual trade record pushed over the trading and price
//! channels and returned by the dashboard endpoint.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a virtual trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSide {
    /// Long position.
    Buy,
    /// Short position.
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle status of a virtual trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    /// Planned but not activated.
    Planned,
    /// Waiting for entry.
    Pending,
    /// Open position.
    #[default]
    Open,
    /// Entry executed, position open.
    Executed,
    /// Position closed.
    Closed,
    /// Cancelled before entry.
    Cancelled,
    /// Any status this client does not know about.
    #[serde(other)]
    Other,
}

impl TradeStatus {
    /// Returns true if the trade is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// A virtual trade record.
///
/// Only `id` is required. The push channels send partial records (a
/// trade-closed delta carries little more than id, status and pnl), so every
/// other field is optional. Fields this client does not model are kept in
/// `extra` and written back unchanged on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Trade ID. Trade-closed deltas from the price monitor call it `trade_id`.
    #[serde(alias = "trade_id")]
    pub id: u64,

    /// Instrument key, e.g. `NSE_EQ|INE002A01018`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_key: Option<String>,

    /// Trading symbol, e.g. `TCS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tradingsymbol: Option<String>,

    /// Trade direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<TradeSide>,

    /// Quantity in shares.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,

    /// Entry price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<Decimal>,

    /// Target price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<Decimal>,

    /// Stop loss price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,

    /// Exit price once closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<Decimal>,

    /// Realized pnl once closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Decimal>,

    /// Realized pnl in percent once closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl_percentage: Option<Decimal>,

    /// Why the trade was closed (target, stop loss, manual...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<String>,

    /// Trade status. Open-trade lists omit it.
    #[serde(default)]
    pub status: TradeStatus,

    /// Entry time as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<String>,

    /// Event timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Server fields not modelled above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TradeRecord {
    /// Creates a record with only an id and a status.
    #[must_use]
    pub fn new(id: u64, status: TradeStatus) -> Self {
        Self {
            id,
            instrument_key: None,
            tradingsymbol: None,
            trade_type: None,
            quantity: None,
            entry_price: None,
            target_price: None,
            stop_loss: None,
            exit_price: None,
            pnl: None,
            pnl_percentage: None,
            exit_reason: None,
            status,
            entry_time: None,
            timestamp: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Returns true if the trade is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    /// Overlays the fields present in `delta` onto this record.
    ///
    /// Used for partial deltas such as a trade-closed notice, which carries
    /// the exit fields but not the entry details.
    pub fn merge(&mut self, delta: &TradeRecord) {
        fn overlay<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }

        overlay(&mut self.instrument_key, &delta.instrument_key);
        overlay(&mut self.tradingsymbol, &delta.tradingsymbol);
        overlay(&mut self.trade_type, &delta.trade_type);
        overlay(&mut self.quantity, &delta.quantity);
        overlay(&mut self.entry_price, &delta.entry_price);
        overlay(&mut self.target_price, &delta.target_price);
        overlay(&mut self.stop_loss, &delta.stop_loss);
        overlay(&mut self.exit_price, &delta.exit_price);
        overlay(&mut self.pnl, &delta.pnl);
        overlay(&mut self.pnl_percentage, &delta.pnl_percentage);
        overlay(&mut self.exit_reason, &delta.exit_reason);
        overlay(&mut self.entry_time, &delta.entry_time);
        overlay(&mut self.timestamp, &delta.timestamp);
        self.status = delta.status;
        self.extra
            .extend(delta.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Returns the symbol, falling back to the instrument key.
    #[must_use]
    pub fn symbol(&self) -> &str {
        self.tradingsymbol
            .as_deref()
            .or(self.instrument_key.as_deref())
            .unwrap_or("unknown")
    }

    /// Returns the unrealized pnl at `price`, if side, entry and quantity are known.
    #[must_use]
    pub fn unrealized_pnl(&self, price: Decimal) -> Option<Decimal> {
        let entry = self.entry_price?;
        let quantity = Decimal::from(self.quantity?);
        match self.trade_type? {
            TradeSide::Buy => Some((price - entry) * quantity),
            TradeSide::Sell => Some((entry - price) * quantity),
        }
    }
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trade #{} {} ({:?})", self.id, self.symbol(), self.status)
    }
}
