//! Data models for instruments, trades, and portfolio views.

mod instrument;
mod portfolio;
mod trade;

pub use instrument::Instrument;
pub use portfolio::{HoldingLine, PortfolioSnapshot, PortfolioSummary};
pub use trade::{TradeRecord, TradeSide};
