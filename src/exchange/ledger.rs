//! Cash/holdings ledger with solvency and holdings checks.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{Instrument, PortfolioSnapshot, TradeRecord, TradeSide};

/// Result of submitting an order to the exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    /// Executed in full
    Filled(TradeRecord),
    /// Buy rejected: not enough cash
    InsufficientFunds { required: Decimal, available: Decimal },
    /// Sell rejected: not enough units held
    InsufficientHoldings { requested: Decimal, held: Decimal },
    /// Zero or negative quantity
    InvalidQuantity(Decimal),
}

impl OrderOutcome {
    pub fn is_filled(&self) -> bool {
        matches!(self, OrderOutcome::Filled(_))
    }

    pub fn fill(&self) -> Option<&TradeRecord> {
        match self {
            OrderOutcome::Filled(trade) => Some(trade),
            _ => None,
        }
    }
}

/// Authoritative record of cash, holdings, last buy prices, and trades.
///
/// `average_buy_price` holds the price of the most recent buy, not a
/// weighted average, and is cleared by any sell.
#[derive(Debug, Clone)]
pub struct Ledger {
    cash: Decimal,
    holdings: HashMap<String, Decimal>,
    average_buy_price: HashMap<String, Option<Decimal>>,
    trade_history: Vec<TradeRecord>,
}

impl Ledger {
    pub fn new(seed_cash: Decimal, instruments: &[Instrument]) -> Self {
        Self {
            cash: seed_cash,
            holdings: instruments
                .iter()
                .map(|i| (i.symbol.clone(), Decimal::ZERO))
                .collect(),
            average_buy_price: instruments
                .iter()
                .map(|i| (i.symbol.clone(), None))
                .collect(),
            trade_history: Vec::new(),
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn knows(&self, symbol: &str) -> bool {
        self.holdings.contains_key(symbol)
    }

    pub fn holding(&self, symbol: &str) -> Decimal {
        self.holdings.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn buy_price(&self, symbol: &str) -> Option<Decimal> {
        self.average_buy_price.get(symbol).copied().flatten()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trade_history
    }

    /// Debit `price * quantity` and credit the position if cash covers it.
    pub fn apply_buy(&mut self, symbol: &str, price: Decimal, quantity: Decimal) -> OrderOutcome {
        if quantity <= Decimal::ZERO {
            return OrderOutcome::InvalidQuantity(quantity);
        }

        let total = price * quantity;
        if self.cash < total {
            return OrderOutcome::InsufficientFunds {
                required: total,
                available: self.cash,
            };
        }

        self.cash -= total;
        *self.holdings.entry(symbol.to_string()).or_insert(Decimal::ZERO) += quantity;
        self.average_buy_price.insert(symbol.to_string(), Some(price));

        let trade = TradeRecord::new(TradeSide::Buy, symbol, price, quantity);
        self.trade_history.push(trade.clone());
        OrderOutcome::Filled(trade)
    }

    /// Credit `price * quantity` and reduce the position if enough is held.
    pub fn apply_sell(&mut self, symbol: &str, price: Decimal, quantity: Decimal) -> OrderOutcome {
        if let Some(rejection) = self.check_sell(symbol, quantity) {
            return rejection;
        }

        self.cash += price * quantity;
        *self.holdings.entry(symbol.to_string()).or_insert(Decimal::ZERO) -= quantity;
        // Cleared even on a partial sell
        self.average_buy_price.insert(symbol.to_string(), None);

        let trade = TradeRecord::new(TradeSide::Sell, symbol, price, quantity);
        self.trade_history.push(trade.clone());
        OrderOutcome::Filled(trade)
    }

    /// Rejection a sell of `quantity` would hit, if any.
    pub fn check_sell(&self, symbol: &str, quantity: Decimal) -> Option<OrderOutcome> {
        if quantity <= Decimal::ZERO {
            return Some(OrderOutcome::InvalidQuantity(quantity));
        }

        let held = self.holding(symbol);
        if held < quantity {
            return Some(OrderOutcome::InsufficientHoldings {
                requested: quantity,
                held,
            });
        }

        None
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            cash: self.cash,
            holdings: self.holdings.clone(),
            average_buy_price: self.average_buy_price.clone(),
            trade_history: self.trade_history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn ledger(cash: Decimal) -> Ledger {
        Ledger::new(cash, &Instrument::default_universe())
    }

    #[test]
    fn test_buy_debits_cash() {
        let mut ledger = ledger(dec!(1000));

        let outcome = ledger.apply_buy("XRP", dec!(100), dec!(3));
        assert!(outcome.is_filled());
        assert_eq!(ledger.cash(), dec!(700));
        assert_eq!(ledger.holding("XRP"), dec!(3));
        assert_eq!(ledger.buy_price("XRP"), Some(dec!(100)));
        assert_eq!(ledger.trades().len(), 1);
    }

    #[test]
    fn test_buy_rejected_leaves_state_unchanged() {
        let mut ledger = ledger(dec!(250));
        let before = ledger.snapshot();

        let outcome = ledger.apply_buy("XRP", dec!(100), dec!(3));
        assert_eq!(
            outcome,
            OrderOutcome::InsufficientFunds {
                required: dec!(300),
                available: dec!(250)
            }
        );
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_buy_exact_cash_allowed() {
        let mut ledger = ledger(dec!(300));
        assert!(ledger.apply_buy("XRP", dec!(100), dec!(3)).is_filled());
        assert_eq!(ledger.cash(), Decimal::ZERO);
    }

    #[test]
    fn test_rebuy_overwrites_buy_price() {
        let mut ledger = ledger(dec!(1000));
        ledger.apply_buy("ADA", dec!(100), dec!(2));
        ledger.apply_buy("ADA", dec!(120), dec!(1));

        assert_eq!(ledger.holding("ADA"), dec!(3));
        // Latest price, not the weighted 106.67
        assert_eq!(ledger.buy_price("ADA"), Some(dec!(120)));
    }

    #[test]
    fn test_sell_credits_cash() {
        let mut ledger = ledger(dec!(1000));
        ledger.apply_buy("DOGE", dec!(100), dec!(5));

        let outcome = ledger.apply_sell("DOGE", dec!(110), dec!(5));
        assert!(outcome.is_filled());
        assert_eq!(ledger.cash(), dec!(1050));
        assert_eq!(ledger.holding("DOGE"), Decimal::ZERO);
        assert_eq!(ledger.buy_price("DOGE"), None);
    }

    #[test]
    fn test_partial_sell_clears_buy_price() {
        let mut ledger = ledger(dec!(1000));
        ledger.apply_buy("DOGE", dec!(100), dec!(5));

        assert!(ledger.apply_sell("DOGE", dec!(100), dec!(2)).is_filled());
        assert_eq!(ledger.holding("DOGE"), dec!(3));
        assert_eq!(ledger.buy_price("DOGE"), None);
    }

    #[test]
    fn test_sell_more_than_held_rejected() {
        let mut ledger = ledger(dec!(1000));
        ledger.apply_buy("ETH", dec!(100), dec!(1));
        let before = ledger.snapshot();

        let outcome = ledger.apply_sell("ETH", dec!(100), dec!(2));
        assert_eq!(
            outcome,
            OrderOutcome::InsufficientHoldings {
                requested: dec!(2),
                held: dec!(1)
            }
        );
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut ledger = ledger(dec!(1000));
        assert_eq!(
            ledger.apply_buy("BTC", dec!(1), Decimal::ZERO),
            OrderOutcome::InvalidQuantity(Decimal::ZERO)
        );
        assert_eq!(
            ledger.apply_sell("BTC", dec!(1), dec!(-1)),
            OrderOutcome::InvalidQuantity(dec!(-1))
        );
        assert!(ledger.trades().is_empty());
    }

    prop_compose! {
        fn random_order()(
            is_buy in any::<bool>(),
            symbol in prop::sample::select(vec!["BTC", "ETH", "XRP", "DOGE"]),
            cents in 1i64..100_000_000,
            quantity in -2i64..50,
        ) -> (bool, &'static str, Decimal, Decimal) {
            (is_buy, symbol, Decimal::new(cents, 2), Decimal::from(quantity))
        }
    }

    proptest! {
        #[test]
        fn test_random_orders_keep_ledger_consistent(
            seed_cash in 0i64..10_000_000,
            orders in prop::collection::vec(random_order(), 1..200),
        ) {
            let mut ledger = ledger(Decimal::from(seed_cash));

            for (is_buy, symbol, price, quantity) in orders {
                let before = ledger.snapshot();
                let outcome = if is_buy {
                    ledger.apply_buy(symbol, price, quantity)
                } else {
                    ledger.apply_sell(symbol, price, quantity)
                };

                match &outcome {
                    OrderOutcome::Filled(trade) => {
                        prop_assert!(quantity > Decimal::ZERO);
                        prop_assert_eq!(trade.price, price);
                        prop_assert_eq!(trade.quantity, quantity);

                        let notional = price * quantity;
                        if is_buy {
                            prop_assert_eq!(ledger.cash(), before.cash - notional);
                            prop_assert_eq!(ledger.holding(symbol), before.holding(symbol) + quantity);
                            prop_assert_eq!(ledger.buy_price(symbol), Some(price));
                        } else {
                            prop_assert_eq!(ledger.cash(), before.cash + notional);
                            prop_assert_eq!(ledger.holding(symbol), before.holding(symbol) - quantity);
                            prop_assert_eq!(ledger.buy_price(symbol), None);
                        }
                        prop_assert_eq!(ledger.trades().len(), before.trade_history.len() + 1);
                    }
                    OrderOutcome::InvalidQuantity(_) => {
                        prop_assert!(quantity <= Decimal::ZERO);
                        prop_assert_eq!(&ledger.snapshot(), &before);
                    }
                    _ => {
                        prop_assert_eq!(&ledger.snapshot(), &before);
                    }
                }

                prop_assert!(ledger.cash() >= Decimal::ZERO);
                prop_assert!(ledger.holding(symbol) >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut ledger = ledger(dec!(1000));
        ledger.apply_buy("XRP", dec!(10), dec!(1));

        let mut snapshot = ledger.snapshot();
        snapshot.cash = Decimal::ZERO;
        snapshot.holdings.insert("XRP".to_string(), dec!(999));
        snapshot.trade_history.clear();

        assert_eq!(ledger.cash(), dec!(990));
        assert_eq!(ledger.holding("XRP"), dec!(1));
        assert_eq!(ledger.trades().len(), 1);
    }
}
