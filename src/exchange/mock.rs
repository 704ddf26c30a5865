//! Mock exchange: a price feed plus the ledger it settles against.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{HoldingLine, Instrument, PortfolioSnapshot, PortfolioSummary};

use super::{Ledger, OrderOutcome, PriceFeed};

/// Exchange shared between the trading task and request handlers.
/// Mutations take the write lock; snapshots only need the read lock.
pub type SharedExchange = Arc<RwLock<MockExchange>>;

/// Simulated spot exchange.
pub struct MockExchange {
    instruments: Vec<Instrument>,
    seed_cash: Decimal,
    feed: Box<dyn PriceFeed>,
    ledger: Ledger,
}

impl MockExchange {
    pub fn new(instruments: Vec<Instrument>, seed_cash: Decimal, feed: Box<dyn PriceFeed>) -> Self {
        let ledger = Ledger::new(seed_cash, &instruments);
        Self {
            instruments,
            seed_cash,
            feed,
            ledger,
        }
    }

    pub fn into_shared(self) -> SharedExchange {
        Arc::new(RwLock::new(self))
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn cash(&self) -> Decimal {
        self.ledger.cash()
    }

    pub fn holding(&self, symbol: &str) -> Decimal {
        self.ledger.holding(symbol)
    }

    pub fn buy_price(&self, symbol: &str) -> Option<Decimal> {
        self.ledger.buy_price(symbol)
    }

    /// Current price of `symbol`. Advances the simulated feed.
    pub fn quote(&mut self, symbol: &str) -> Result<Decimal> {
        self.ensure_known(symbol)?;
        self.feed
            .current_price(symbol)
            .with_context(|| format!("Failed to quote {}", symbol))
    }

    /// Market buy at the current price. Rejections are outcomes, not errors.
    pub fn buy(&mut self, symbol: &str, quantity: Decimal) -> Result<OrderOutcome> {
        let price = self.quote(symbol)?;
        let outcome = self.ledger.apply_buy(symbol, price, quantity);
        log_outcome(symbol, &outcome);
        Ok(outcome)
    }

    /// Market sell at the current price. The price is only quoted once the
    /// holdings check has passed.
    pub fn sell(&mut self, symbol: &str, quantity: Decimal) -> Result<OrderOutcome> {
        self.ensure_known(symbol)?;
        if let Some(rejection) = self.ledger.check_sell(symbol, quantity) {
            log_outcome(symbol, &rejection);
            return Ok(rejection);
        }

        let price = self.quote(symbol)?;
        let outcome = self.ledger.apply_sell(symbol, price, quantity);
        log_outcome(symbol, &outcome);
        Ok(outcome)
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        self.ledger.snapshot()
    }

    /// Mark every holding to the current price.
    pub fn summary(&mut self, recent_trades: usize) -> Result<PortfolioSummary> {
        let symbols: Vec<Instrument> = self.instruments.clone();
        let mut lines = Vec::with_capacity(symbols.len());

        for instrument in symbols {
            let current_price = self.quote(&instrument.symbol)?;
            let quantity = self.ledger.holding(&instrument.symbol);
            lines.push(HoldingLine {
                average_buy_price: self.ledger.buy_price(&instrument.symbol),
                symbol: instrument.symbol,
                name: instrument.name,
                ticker: instrument.ticker,
                quantity,
                current_price,
                value: current_price * quantity,
            });
        }

        let trades = self.ledger.trades();
        let recent = trades.iter().rev().take(recent_trades).cloned().collect();

        Ok(PortfolioSummary::new(
            self.seed_cash,
            self.ledger.cash(),
            lines,
            trades.len(),
            recent,
        ))
    }

    fn ensure_known(&self, symbol: &str) -> Result<()> {
        if !self.ledger.knows(symbol) {
            bail!("Unknown instrument: {}", symbol);
        }
        Ok(())
    }
}

fn log_outcome(symbol: &str, outcome: &OrderOutcome) {
    match outcome {
        OrderOutcome::Filled(trade) => info!(
            symbol = %symbol,
            side = %trade.side,
            price = %trade.price,
            quantity = %trade.quantity,
            notional = %trade.notional(),
            "Order filled"
        ),
        OrderOutcome::InsufficientFunds { required, available } => debug!(
            symbol = %symbol,
            required = %required,
            available = %available,
            "Buy rejected: insufficient funds"
        ),
        OrderOutcome::InsufficientHoldings { requested, held } => debug!(
            symbol = %symbol,
            requested = %requested,
            held = %held,
            "Sell rejected: insufficient holdings"
        ),
        OrderOutcome::InvalidQuantity(quantity) => debug!(
            symbol = %symbol,
            quantity = %quantity,
            "Order rejected: invalid quantity"
        ),
    }
}
