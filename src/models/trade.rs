//! Trade model representing fills recorded by the mock exchange.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single executed trade in the ledger's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Unique trade identifier
    pub id: Uuid,

    /// Trade direction
    pub side: TradeSide,

    /// Instrument symbol
    pub symbol: String,

    /// Execution price per unit
    pub price: Decimal,

    /// Units traded
    pub quantity: Decimal,

    /// Wall-clock execution time
    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    pub fn new(side: TradeSide, symbol: &str, price: Decimal, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            side,
            symbol: symbol.to_string(),
            price,
            quantity,
            timestamp: Utc::now(),
        }
    }

    /// Cash value of the fill.
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_notional() {
        let trade = TradeRecord::new(TradeSide::Buy, "XRP", dec!(701.25), dec!(4));
        assert_eq!(trade.notional(), dec!(2805.00));
        assert_eq!(trade.side.as_str(), "BUY");
    }

    #[test]
    fn test_side_serializes_uppercase() {
        let json = serde_json::to_string(&TradeSide::Sell).unwrap();
        assert_eq!(json, "\"SELL\"");
    }
}
