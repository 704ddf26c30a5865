//! Trading configuration.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::Instrument;

/// Largest accepted seed cash (one quadrillion).
pub const MAX_SEED_CASH: Decimal = dec!(1_000_000_000_000_000);

/// Largest accepted instrument base price.
pub const MAX_BASE_PRICE: Decimal = dec!(1_000_000_000_000);

/// Configuration for the mock exchange and the auto-trading loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Starting cash balance in KRW
    pub seed_cash: Decimal,

    /// Seconds between exit evaluations
    pub poll_interval_secs: u64,

    /// Take-profit threshold in percent (3 = sell at +3%)
    pub take_profit_pct: Decimal,

    /// Stop-loss threshold in percent, as a positive number (2 = sell at -2%)
    pub stop_loss_pct: Decimal,

    /// Seed for the simulated price feed; `None` draws from OS entropy
    pub price_seed: Option<u64>,

    /// Instruments traded, with their reference prices
    pub instruments: Vec<Instrument>,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            seed_cash: dec!(10_000_000),  // 10M KRW
            poll_interval_secs: 10,
            take_profit_pct: dec!(3),     // +3%
            stop_loss_pct: dec!(2),       // -2%
            price_seed: None,
            instruments: Instrument::default_universe(),
        }
    }
}

impl TradingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Reject configurations the exchange or the loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.seed_cash < Decimal::ZERO {
            bail!("Seed cash must not be negative: {}", self.seed_cash);
        }
        if self.seed_cash > MAX_SEED_CASH {
            bail!("Seed cash {} exceeds the maximum of {}", self.seed_cash, MAX_SEED_CASH);
        }
        if self.poll_interval_secs == 0 {
            bail!("Poll interval must be at least 1 second");
        }
        if self.take_profit_pct <= Decimal::ZERO {
            bail!("Take-profit threshold must be positive: {}", self.take_profit_pct);
        }
        if self.stop_loss_pct <= Decimal::ZERO {
            bail!("Stop-loss threshold must be positive: {}", self.stop_loss_pct);
        }
        if self.instruments.is_empty() {
            bail!("At least one instrument must be configured");
        }

        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            if !seen.insert(instrument.symbol.as_str()) {
                bail!("Duplicate instrument: {}", instrument.symbol);
            }
            if instrument.base_price <= Decimal::ZERO {
                bail!(
                    "Instrument {} has no positive base price: {}",
                    instrument.symbol,
                    instrument.base_price
                );
            }
            if instrument.base_price > MAX_BASE_PRICE {
                bail!(
                    "Instrument {} base price {} exceeds the maximum of {}",
                    instrument.symbol,
                    instrument.base_price,
                    MAX_BASE_PRICE
                );
            }
        }

        Ok(())
    }
}
