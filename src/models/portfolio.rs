//! Portfolio views handed out to readers of the ledger.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::TradeRecord;

/// Owned copy of the ledger. Mutating it never touches the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: Decimal,
    pub holdings: HashMap<String, Decimal>,
    pub average_buy_price: HashMap<String, Option<Decimal>>,
    pub trade_history: Vec<TradeRecord>,
}

#[cfg(test)]
impl PortfolioSnapshot {
    pub fn holding(&self, symbol: &str) -> Decimal {
        self.holdings.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn buy_price(&self, symbol: &str) -> Option<Decimal> {
        self.average_buy_price.get(symbol).copied().flatten()
    }
}

/// One instrument row of the portfolio summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingLine {
    pub symbol: String,
    pub name: String,
    pub ticker: String,
    pub quantity: Decimal,
    pub average_buy_price: Option<Decimal>,
    pub current_price: Decimal,
    pub value: Decimal,
}

/// Marked-to-market portfolio figures, as rendered on the index page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub seed_cash: Decimal,
    pub cash: Decimal,
    pub holdings: Vec<HoldingLine>,
    pub total_asset: Decimal,
    pub profit: Decimal,
    pub profit_pct: Decimal,
    pub trade_count: usize,
    pub recent_trades: Vec<TradeRecord>,
}

impl PortfolioSummary {
    /// Build from per-instrument lines; all money figures are rounded to 2 decimals.
    pub fn new(
        seed_cash: Decimal,
        cash: Decimal,
        holdings: Vec<HoldingLine>,
        trade_count: usize,
        recent_trades: Vec<TradeRecord>,
    ) -> Self {
        let total_asset = cash + holdings.iter().map(|h| h.value).sum::<Decimal>();
        let profit = total_asset - seed_cash;
        let profit_pct = if seed_cash.is_zero() {
            Decimal::ZERO
        } else {
            profit / seed_cash * dec!(100)
        };

        Self {
            seed_cash,
            cash,
            holdings,
            total_asset: total_asset.round_dp(2),
            profit: profit.round_dp(2),
            profit_pct: profit_pct.round_dp(2),
            trade_count,
            recent_trades,
        }
    }
}

impl std::fmt::Display for PortfolioSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n{:=^60}", " PORTFOLIO ")?;
        writeln!(f, "Seed Cash:    {:.2}", self.seed_cash)?;
        writeln!(f, "Cash:         {:.2}", self.cash)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<6} {:>14} {:>16} {:>16} {:>18}",
            "COIN", "QTY", "BUY PRICE", "PRICE", "VALUE"
        )?;
        for line in &self.holdings {
            let buy_price = line
                .average_buy_price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{:<6} {:>14} {:>16} {:>16.2} {:>18.2}",
                line.symbol, line.quantity, buy_price, line.current_price, line.value
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Total Asset:  {:.2}", self.total_asset)?;
        writeln!(f, "Profit:       {:.2} ({:.2}%)", self.profit, self.profit_pct)?;
        writeln!(f, "Trades:       {}", self.trade_count)?;
        writeln!(f, "{:=^60}", "")?;
        Ok(())
    }
}
