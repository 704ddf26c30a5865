//! Simulated exchange: random-walk price feed, ledger, and order handling.

mod feed;
mod ledger;
mod mock;

pub use feed::{PriceFeed, RandomWalkOracle};
pub use ledger::{Ledger, OrderOutcome};
pub use mock::{MockExchange, SharedExchange};

#[cfg(test)]
pub(crate) use feed::FixedFeed;
