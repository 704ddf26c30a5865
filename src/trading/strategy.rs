//! Bracket exit rules: full take-profit and stop-loss exits.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::TradingConfig;

/// Reason for exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    None,
}

/// Exit signal for one position.
#[derive(Debug, Clone)]
pub struct ExitSignal {
    pub should_exit: bool,
    pub reason: ExitReason,
    /// Move from the buy price, in percent
    pub change_pct: Decimal,
}

/// Threshold strategy evaluated against the last buy price.
#[derive(Debug, Clone)]
pub struct Strategy {
    take_profit_pct: Decimal,
    stop_loss_pct: Decimal,
}

impl Strategy {
    pub fn new(config: &TradingConfig) -> Self {
        Self {
            take_profit_pct: config.take_profit_pct,
            stop_loss_pct: config.stop_loss_pct,
        }
    }

    pub fn take_profit_pct(&self) -> Decimal {
        self.take_profit_pct
    }

    pub fn stop_loss_pct(&self) -> Decimal {
        self.stop_loss_pct
    }

    /// Percentage change from `buy_price` to `current_price`.
    pub fn change_pct(buy_price: Decimal, current_price: Decimal) -> Decimal {
        if buy_price.is_zero() {
            return Decimal::ZERO;
        }
        (current_price - buy_price) / buy_price * dec!(100)
    }

    /// Check whether a position bought at `buy_price` should be closed.
    /// Take-profit is checked first; both bounds are inclusive.
    pub fn check_exit(&self, symbol: &str, buy_price: Decimal, current_price: Decimal) -> ExitSignal {
        let change_pct = Self::change_pct(buy_price, current_price);

        if change_pct >= self.take_profit_pct {
            debug!(
                symbol = %symbol,
                change_pct = %change_pct.round_dp(2),
                target = %self.take_profit_pct,
                "Take profit triggered"
            );
            return ExitSignal {
                should_exit: true,
                reason: ExitReason::TakeProfit,
                change_pct,
            };
        }

        if change_pct <= -self.stop_loss_pct {
            warn!(
                symbol = %symbol,
                change_pct = %change_pct.round_dp(2),
                stop = %self.stop_loss_pct,
                "Stop loss triggered"
            );
            return ExitSignal {
                should_exit: true,
                reason: ExitReason::StopLoss,
                change_pct,
            };
        }

        ExitSignal {
            should_exit: false,
            reason: ExitReason::None,
            change_pct,
        }
    }
}
