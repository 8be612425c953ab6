//! Dashboard snapshot returned by the REST API.
//!
//! The push channels fold onto this same shape, so a view built from
//! deltas can be compared with (or reseeded from) a REST snapshot.

use serde::{Deserialize, Serialize};

use super::trade::TradeRecord;
use super::wallet::WalletSnapshot;

/// Virtual trading dashboard snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Wallet, absent for users without a virtual wallet.
    #[serde(default)]
    pub wallet: Option<WalletSnapshot>,

    /// Open positions.
    #[serde(default)]
    pub open_positions: Vec<TradeRecord>,

    /// Most recently closed trades, newest first.
    #[serde(default)]
    pub recent_trades: Vec<TradeRecord>,

    /// Free-form statistics block.
    #[serde(default)]
    pub statistics: Option<serde_json::Value>,
}
