//! Wallet types for the Smart Trading SDK.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Virtual wallet snapshot.
///
/// Every snapshot is complete; a newer one replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    /// Cash balance.
    pub balance: Decimal,

    /// Realized pnl across all closed trades.
    pub total_pnl: Decimal,

    /// Balance plus the value of open positions.
    pub total_value: Decimal,

    /// Percentage of winning trades, `0..=100`, as sent by the server.
    pub win_rate: Decimal,

    /// Number of closed trades.
    #[serde(default)]
    pub total_trades: u64,
}

impl WalletSnapshot {
    /// Returns true if total pnl is not negative.
    #[must_use]
    pub fn is_profitable(&self) -> bool {
        !self.total_pnl.is_sign_negative()
    }
}

impl fmt::Display for WalletSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wallet(balance: {:.2}, pnl: {:.2}, value: {:.2}, win rate: {:.1}%)",
            self.balance,
            self.total_pnl,
            self.total_value,
            self.win_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_deserialize() {
        let json = r#"{"balance":100000.0,"total_pnl":-250.5,"total_trades":4,"win_rate":25.0,"total_value":99749.5}"#;
        let wallet: WalletSnapshot = serde_json::from_str(json).expect("deserialize");
        assert_eq!(wallet.balance, Decimal::new(100_000, 0));
        assert_eq!(wallet.total_trades, 4);
        assert_eq!(wallet.win_rate, Decimal::new(25, 0));
        assert!(!wallet.is_profitable());
    }

    #[test]
    fn test_wallet_display() {
        let wallet = WalletSnapshot {
            balance: Decimal::new(1000, 0),
            total_pnl: Decimal::new(125, 1),
            total_value: Decimal::new(10125, 1),
            win_rate: Decimal::new(667, 1),
            total_trades: 3,
        };
        assert_eq!(
            wallet.to_string(),
            "Wallet(balance: 1000.00, pnl: 12.50, value: 1012.50, win rate: 66.7%)"
        );
    }
}
