//! Start/stop lifecycle for the auto-trading task.

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::exchange::SharedExchange;

use super::{AutoTrader, TradingConfig};

struct RunningTask {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// Idempotent control surface over one exchange + loop pair.
///
/// Start and stop are serialised by the controller's lock. `stop` joins the
/// task before releasing it, so `is_running` never reports `false` while the
/// loop could still touch the ledger.
pub struct Controller {
    exchange: SharedExchange,
    config: TradingConfig,
    task: Mutex<Option<RunningTask>>,
}

impl Controller {
    pub fn new(exchange: SharedExchange, config: TradingConfig) -> Self {
        Self {
            exchange,
            config,
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TradingConfig {
        &self.config
    }

    /// Spawn the trading loop. Returns `false` if it was already running.
    pub async fn start(&self) -> bool {
        let mut task = self.task.lock().await;

        if let Some(running) = task.as_ref() {
            if !running.handle.is_finished() {
                debug!("Auto-trader already running");
                return false;
            }
        }

        // Reap a task that ended on its own before starting a fresh one
        if let Some(stale) = task.take() {
            warn!("Previous auto-trader task had exited; restarting");
            if let Err(e) = stale.handle.await {
                error!(error = %e, "Previous auto-trader task failed");
            }
        }

        let shutdown = CancellationToken::new();
        let trader = AutoTrader::new(self.exchange.clone(), &self.config);
        let handle = tokio::spawn(trader.run(shutdown.clone()));
        *task = Some(RunningTask { shutdown, handle });

        info!("Auto-trader started");
        true
    }

    /// Cancel the loop and wait for it to finish. Returns `false` if it was
    /// not running.
    pub async fn stop(&self) -> bool {
        let mut task = self.task.lock().await;
        let Some(running) = task.take() else {
            debug!("Auto-trader not running");
            return false;
        };

        running.shutdown.cancel();
        if let Err(e) = running.handle.await {
            error!(error = %e, "Auto-trader task failed");
        }

        info!("Auto-trader stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::exchange::{FixedFeed, MockExchange};
    use crate::models::{Instrument, TradeSide};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn setup() -> (Controller, SharedExchange, FixedFeed) {
        let feed = FixedFeed::with_prices(&[
            ("BTC", dec!(100)),
            ("ETH", dec!(50)),
            ("XRP", dec!(10)),
            ("ADA", dec!(5)),
            ("DOGE", dec!(1)),
        ]);
        let config = TradingConfig {
            seed_cash: dec!(10_000),
            ..TradingConfig::default()
        };
        let exchange = MockExchange::new(
            Instrument::default_universe(),
            config.seed_cash,
            Box::new(feed.clone()),
        )
        .into_shared();
        (Controller::new(exchange.clone(), config), exchange, feed)
    }

    async fn buy_count(exchange: &SharedExchange) -> usize {
        exchange
            .read()
            .await
            .snapshot()
            .trade_history
            .iter()
            .filter(|t| t.side == TradeSide::Buy)
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_runs_once() {
        let (controller, exchange, _feed) = setup();

        assert!(controller.start().await);
        assert!(!controller.start().await);
        assert!(controller.is_running().await);

        tokio::time::sleep(Duration::from_millis(1)).await;
        // One allocation: five buys, not ten
        assert_eq!(buy_count(&exchange).await, 5);

        assert!(controller.stop().await);
        assert!(!controller.is_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_twice_is_noop() {
        let (controller, _exchange, _feed) = setup();

        assert!(!controller.stop().await);
        controller.start().await;
        assert!(controller.stop().await);
        assert!(!controller.stop().await);
        assert!(!controller.is_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_wait() {
        let (controller, _exchange, _feed) = setup();
        controller.start().await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let before = tokio::time::Instant::now();
        controller.stop().await;
        // Cancelled mid-interval rather than sleeping out the remaining 10s
        assert!(before.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_exits_on_threshold() {
        let (controller, exchange, feed) = setup();
        controller.start().await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let held = exchange.read().await.holding("XRP");
        assert!(held > Decimal::ZERO);

        feed.set("XRP", dec!(9.7));
        tokio::time::sleep(Duration::from_secs(11)).await;

        let exchange_view = exchange.read().await.snapshot();
        assert_eq!(exchange_view.holding("XRP"), Decimal::ZERO);
        assert_eq!(exchange_view.buy_price("XRP"), None);
        let last = exchange_view.trade_history.last().unwrap();
        assert_eq!(last.side, TradeSide::Sell);
        assert_eq!(last.quantity, held);

        controller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_reallocates() {
        let (controller, exchange, _feed) = setup();

        controller.start().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        controller.stop().await;
        let after_first = buy_count(&exchange).await;

        controller.start().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        controller.stop().await;

        // Second allocation splits whatever cash was left
        assert!(buy_count(&exchange).await >= after_first);
        assert!(exchange.read().await.cash() >= Decimal::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_controller_across_tasks() {
        let (controller, _exchange, _feed) = setup();
        let controller = Arc::new(controller);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let controller = controller.clone();
                tokio::spawn(async move { controller.start().await })
            })
            .collect();

        let mut started = 0;
        for handle in handles {
            if handle.await.unwrap() {
                started += 1;
            }
        }
        assert_eq!(started, 1);
        assert!(controller.stop().await);
    }
}
