//! Simulated price feed.
//!
//! Prices follow a multiplicative random walk with no mean reversion:
//! each quote nudges the stored price by a uniform factor in [0.98, 1.02]
//! and returns it rounded to 2 decimals.

use std::collections::HashMap;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::trace;

use crate::models::Instrument;

/// Source of current prices consumed by the exchange.
pub trait PriceFeed: Send + Sync {
    /// Quote the current price of `symbol`. Quoting may advance the feed.
    fn current_price(&mut self, symbol: &str) -> Result<Decimal>;
}

const SEED_SPREAD: (f64, f64) = (0.95, 1.05);
const STEP_SPREAD: (f64, f64) = (0.98, 1.02);

/// Random-walk oracle seeded from each instrument's base price.
pub struct RandomWalkOracle {
    prices: HashMap<String, Decimal>,
    rng: StdRng,
}

impl RandomWalkOracle {
    /// Create an oracle seeded from OS entropy.
    pub fn new(instruments: &[Instrument]) -> Self {
        Self::with_rng(instruments, StdRng::from_entropy())
    }

    /// Create a reproducible oracle.
    pub fn seeded(instruments: &[Instrument], seed: u64) -> Self {
        Self::with_rng(instruments, StdRng::seed_from_u64(seed))
    }

    fn with_rng(instruments: &[Instrument], mut rng: StdRng) -> Self {
        let prices = instruments
            .iter()
            .map(|i| {
                let factor = random_factor(&mut rng, SEED_SPREAD);
                (i.symbol.clone(), i.base_price * factor)
            })
            .collect();

        Self { prices, rng }
    }

    /// Last stored (unrounded) price without advancing the walk.
    #[cfg(test)]
    pub fn last_price(&self, symbol: &str) -> Option<Decimal> {
        self.prices.get(symbol).copied()
    }
}

impl PriceFeed for RandomWalkOracle {
    fn current_price(&mut self, symbol: &str) -> Result<Decimal> {
        let factor = random_factor(&mut self.rng, STEP_SPREAD);
        let Some(price) = self.prices.get_mut(symbol) else {
            bail!("Unknown instrument: {}", symbol);
        };

        // Bound the scale so repeated multiplication never exhausts precision
        *price = (*price * factor).round_dp(12);
        trace!(symbol = %symbol, price = %price, "Price stepped");

        Ok(price.round_dp(2))
    }
}

fn random_factor(rng: &mut StdRng, (low, high): (f64, f64)) -> Decimal {
    Decimal::try_from(rng.gen_range(low..=high)).unwrap_or(Decimal::ONE)
}

#[cfg(test)]
pub(crate) use fixed::FixedFeed;

#[cfg(test)]
mod fixed {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use rust_decimal::Decimal;

    use super::PriceFeed;

    /// Deterministic feed for tests. Clones share the same price table,
    /// so a test can keep a handle and move prices while the exchange owns the feed.
    #[derive(Clone, Default)]
    pub struct FixedFeed {
        prices: Arc<Mutex<HashMap<String, Decimal>>>,
    }

    impl FixedFeed {
        pub fn with_prices(prices: &[(&str, Decimal)]) -> Self {
            let feed = Self::default();
            for (symbol, price) in prices {
                feed.set(symbol, *price);
            }
            feed
        }

        pub fn set(&self, symbol: &str, price: Decimal) {
            self.prices.lock().unwrap().insert(symbol.to_string(), price);
        }
    }

    impl PriceFeed for FixedFeed {
        fn current_price(&mut self, symbol: &str) -> Result<Decimal> {
            self.prices
                .lock()
                .unwrap()
                .get(symbol)
                .copied()
                .ok_or_else(|| anyhow!("Unknown instrument: {}", symbol))
        }
    }
}
