//! Auto-trading loop: equal-weight entry, then take-profit/stop-loss exits.
//!
//! On start the loop:
//! - Splits cash evenly across every instrument and buys whole units
//! - Re-evaluates open positions every poll interval
//! - Sells the full holding once a bracket threshold is crossed
//!
//! There is no re-entry: an exited instrument stays flat until the loop is
//! restarted.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use anyhow::Result;
use futures::FutureExt;
use rust_decimal::Decimal;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::exchange::SharedExchange;
use crate::models::TradeRecord;

use super::{ExitReason, Strategy, TradingConfig};

/// A position closed by the exit rules.
#[derive(Debug, Clone)]
pub struct ExitFill {
    pub symbol: String,
    pub reason: ExitReason,
    pub change_pct: Decimal,
    pub trade: TradeRecord,
}

/// Background trading loop bound to one exchange.
pub struct AutoTrader {
    exchange: SharedExchange,
    strategy: Strategy,
    poll_interval: Duration,
}

impl AutoTrader {
    pub fn new(exchange: SharedExchange, config: &TradingConfig) -> Self {
        Self {
            exchange,
            strategy: Strategy::new(config),
            poll_interval: config.poll_interval(),
        }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Cancellation is observed between iterations only, so an exchange
    /// operation in progress always completes. Faults in the allocation or in
    /// a tick, including panics, are logged and the loop carries on.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            poll_interval = ?self.poll_interval,
            take_profit = %self.strategy.take_profit_pct(),
            stop_loss = %self.strategy.stop_loss_pct(),
            "Starting auto-trading loop"
        );

        match AssertUnwindSafe(self.allocate()).catch_unwind().await {
            Ok(Ok(filled)) => debug!(filled, "Allocation finished"),
            Ok(Err(e)) => error!(error = %e, "Initial allocation failed"),
            Err(panic) => error!(panic = %panic_message(&*panic), "Initial allocation panicked"),
        }

        let mut poll_interval = interval(self.poll_interval);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = poll_interval.tick() => {}
            }

            match AssertUnwindSafe(self.tick()).catch_unwind().await {
                Ok(Ok(exits)) => {
                    for exit in &exits {
                        info!(
                            symbol = %exit.symbol,
                            reason = ?exit.reason,
                            change_pct = %exit.change_pct.round_dp(2),
                            quantity = %exit.trade.quantity,
                            price = %exit.trade.price,
                            "Position exited"
                        );
                    }
                }
                Ok(Err(e)) => error!(error = %e, "Error in trading tick"),
                Err(panic) => error!(panic = %panic_message(&*panic), "Trading tick panicked"),
            }
        }

        info!("Auto-trading loop stopped");
    }

    /// Equal-weight initial allocation across all instruments.
    ///
    /// Returns the number of instruments bought.
    pub async fn allocate(&self) -> Result<usize> {
        let mut exchange = self.exchange.write().await;
        let instruments = exchange.instruments().to_vec();
        if instruments.is_empty() {
            return Ok(0);
        }

        let per_instrument = exchange.cash() / Decimal::from(instruments.len());
        let mut filled = 0;

        for instrument in &instruments {
            let price = exchange.quote(&instrument.symbol)?;
            if price <= Decimal::ZERO {
                debug!(symbol = %instrument.symbol, price = %price, "Skipping non-positive price");
                continue;
            }

            let quantity = (per_instrument / price).floor();
            if quantity <= Decimal::ZERO {
                debug!(
                    symbol = %instrument.symbol,
                    price = %price,
                    budget = %per_instrument,
                    "Budget below one unit, skipping"
                );
                continue;
            }

            if exchange.buy(&instrument.symbol, quantity)?.is_filled() {
                filled += 1;
            }
        }

        info!(
            filled,
            per_instrument = %per_instrument.round_dp(2),
            cash_left = %exchange.cash().round_dp(2),
            "Initial allocation complete"
        );

        Ok(filled)
    }

    /// Single evaluation pass over every instrument.
    pub async fn tick(&self) -> Result<Vec<ExitFill>> {
        debug!("Trading tick");

        let symbols: Vec<String> = {
            let exchange = self.exchange.read().await;
            exchange.instruments().iter().map(|i| i.symbol.clone()).collect()
        };

        let mut exits = Vec::new();
        for symbol in &symbols {
            if let Some(exit) = self.evaluate(symbol).await? {
                exits.push(exit);
            }
        }

        Ok(exits)
    }

    /// Quote one open position and close it if a threshold is crossed.
    /// The write lock is held for the whole step.
    async fn evaluate(&self, symbol: &str) -> Result<Option<ExitFill>> {
        let mut exchange = self.exchange.write().await;

        let quantity = exchange.holding(symbol);
        let Some(buy_price) = exchange.buy_price(symbol) else {
            return Ok(None);
        };
        if quantity <= Decimal::ZERO || buy_price <= Decimal::ZERO {
            return Ok(None);
        }

        let current_price = exchange.quote(symbol)?;
        let signal = self.strategy.check_exit(symbol, buy_price, current_price);
        if !signal.should_exit {
            return Ok(None);
        }

        let outcome = exchange.sell(symbol, quantity)?;
        Ok(outcome.fill().cloned().map(|trade| ExitFill {
            symbol: symbol.to_string(),
            reason: signal.reason,
            change_pct: signal.change_pct,
            trade,
        }))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
