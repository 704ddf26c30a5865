//! Trading logic: configuration, exit rules, the auto-trading loop, and its controller.

mod auto_trader;
mod config;
mod controller;
mod strategy;

pub use auto_trader::AutoTrader;
pub use config::TradingConfig;
pub use controller::Controller;
pub use strategy::{ExitReason, Strategy};
