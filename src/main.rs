//! Mock Auto-Trader
//!
//! Simulated crypto exchange with an equal-weight allocation loop that exits
//! positions on take-profit or stop-loss, controlled from a small web page.

mod exchange;
mod models;
mod server;
mod trading;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::exchange::{MockExchange, PriceFeed, RandomWalkOracle, SharedExchange};
use crate::server::{AppState, RECENT_TRADES};
use crate::trading::{Controller, TradingConfig};

/// Mock exchange auto-trader CLI.
#[derive(Parser)]
#[command(name = "autotrader")]
#[command(about = "Simulated exchange with a take-profit / stop-loss auto-trader", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "AUTOTRADER_LOG_LEVEL", global = true)]
    log_level: String,

    /// Starting cash balance
    #[arg(long, default_value = "10000000", env = "AUTOTRADER_SEED_CASH", global = true)]
    seed_cash: Decimal,

    /// Seconds between exit evaluations
    #[arg(short, long, default_value = "10", env = "AUTOTRADER_INTERVAL", global = true)]
    interval: u64,

    /// Take-profit threshold in percent
    #[arg(long, default_value = "3", env = "AUTOTRADER_TAKE_PROFIT", global = true)]
    take_profit: Decimal,

    /// Stop-loss threshold in percent (positive)
    #[arg(long, default_value = "2", env = "AUTOTRADER_STOP_LOSS", global = true)]
    stop_loss: Decimal,

    /// Seed for the simulated price feed
    #[arg(long, env = "AUTOTRADER_SEED", global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web control panel
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:5000", env = "AUTOTRADER_BIND")]
        bind: SocketAddr,

        /// Start trading immediately
        #[arg(long)]
        autostart: bool,
    },

    /// Run the trading loop headless and print the result
    Simulate {
        /// How long to run, in seconds
        #[arg(short, long, default_value = "60")]
        duration: u64,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = TradingConfig {
        seed_cash: cli.seed_cash,
        poll_interval_secs: cli.interval,
        take_profit_pct: cli.take_profit,
        stop_loss_pct: cli.stop_loss,
        price_seed: cli.seed,
        ..TradingConfig::default()
    };
    config.validate()?;

    match cli.command {
        Commands::Serve { bind, autostart } => {
            let exchange = build_exchange(&config);
            let controller = Arc::new(Controller::new(exchange.clone(), config));

            if autostart {
                controller.start().await;
            }

            println!("\n=== Mock Auto-Trader ===");
            println!("Control panel: http://{}/", bind);
            println!("\nPress Ctrl+C to stop.\n");

            let shutdown = CancellationToken::new();
            tokio::spawn(shutdown_signal(shutdown.clone()));

            let state = AppState::new(exchange.clone(), controller.clone());
            let served = server::serve(bind, state, shutdown).await;

            // Join the loop before exiting, whether or not the server failed
            controller.stop().await;
            served?;

            let summary = exchange.write().await.summary(RECENT_TRADES)?;
            println!("\n{}", summary);
        }

        Commands::Simulate { duration } => {
            let interval = config.poll_interval();
            let exchange = build_exchange(&config);
            let controller = Controller::new(exchange.clone(), config);

            info!(duration_secs = duration, "Starting headless simulation");
            controller.start().await;

            let deadline = tokio::time::Instant::now() + Duration::from_secs(duration);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        warn!("Received Ctrl+C, ending simulation early");
                        break;
                    }
                    _ = tokio::time::sleep_until(deadline) => break,
                    _ = tokio::time::sleep(interval) => {
                        let running = controller.is_running().await;
                        let snapshot = exchange.read().await.snapshot();
                        println!(
                            "[{}] running={} cash={:.2} trades={}",
                            chrono::Utc::now().format("%H:%M:%S"),
                            running,
                            snapshot.cash,
                            snapshot.trade_history.len()
                        );
                    }
                }
            }

            controller.stop().await;

            let summary = exchange.write().await.summary(RECENT_TRADES)?;
            println!("\n{}", summary);
        }

        Commands::Config => {
            println!("\n=== Trading Configuration ===\n");
            println!("  Seed Cash:            {}", config.seed_cash);
            println!("  Poll Interval:        {}s", config.poll_interval_secs);
            println!("  Take Profit:          +{}%", config.take_profit_pct);
            println!("  Stop Loss:            -{}%", config.stop_loss_pct);
            println!(
                "  Price Seed:           {}",
                config
                    .price_seed
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "random".to_string())
            );

            println!("\n=== Instruments ===\n");
            println!("{:<6} {:<10} {:<10} {:>15}", "SYMBOL", "NAME", "TICKER", "BASE PRICE");
            println!("{}", "-".repeat(44));
            for instrument in &config.instruments {
                println!(
                    "{:<6} {:<10} {:<10} {:>15}",
                    instrument.symbol, instrument.name, instrument.ticker, instrument.base_price
                );
            }
        }
    }

    Ok(())
}

fn build_exchange(config: &TradingConfig) -> SharedExchange {
    let feed: Box<dyn PriceFeed> = match config.price_seed {
        Some(seed) => Box::new(RandomWalkOracle::seeded(&config.instruments, seed)),
        None => Box::new(RandomWalkOracle::new(&config.instruments)),
    };
    MockExchange::new(config.instruments.clone(), config.seed_cash, feed).into_shared()
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown.cancel();
}
