//! Instrument model: the static universe of simulated coins.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A tradeable simulated asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Short symbol used as the ledger key (e.g., "BTC")
    pub symbol: String,

    /// Human-readable name for display
    pub name: String,

    /// External market ticker (e.g., "KRW-BTC")
    pub ticker: String,

    /// Reference price the simulated feed is seeded from
    pub base_price: Decimal,
}

impl Instrument {
    pub fn new(symbol: &str, name: &str, ticker: &str, base_price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            ticker: ticker.to_string(),
            base_price,
        }
    }

    /// The five KRW-quoted coins the simulator trades by default.
    pub fn default_universe() -> Vec<Instrument> {
        vec![
            Instrument::new("BTC", "Bitcoin", "KRW-BTC", dec!(70_000_000)),
            Instrument::new("ETH", "Ethereum", "KRW-ETH", dec!(4_000_000)),
            Instrument::new("XRP", "Ripple", "KRW-XRP", dec!(700)),
            Instrument::new("ADA", "Cardano", "KRW-ADA", dec!(500)),
            Instrument::new("DOGE", "Dogecoin", "KRW-DOGE", dec!(100)),
        ]
    }
}
