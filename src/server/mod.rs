//! Web control panel for the auto-trader.
//!
//! # Routes
//!
//! - `GET /` - portfolio page
//! - `GET /start` - start trading, redirect to `/`
//! - `GET /stop` - stop trading, redirect to `/`
//! - `GET /api/summary` - marked-to-market portfolio figures
//! - `GET /api/portfolio` - raw ledger snapshot
//! - `GET /api/status` - loop status and configuration
//! - `GET /health` - liveness check

mod handlers;
mod page;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::exchange::SharedExchange;
use crate::trading::Controller;

/// Number of most recent trades shown on the portfolio page.
pub const RECENT_TRADES: usize = 20;

/// State shared by every handler, built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub exchange: SharedExchange,
    pub controller: Arc<Controller>,
}

impl AppState {
    pub fn new(exchange: SharedExchange, controller: Arc<Controller>) -> Self {
        Self {
            exchange,
            controller,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/start", get(handlers::start))
        .route("/stop", get(handlers::stop))
        .route("/api/summary", get(handlers::summary))
        .route("/api/portfolio", get(handlers::portfolio))
        .route("/api/status", get(handlers::status))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve until `shutdown` is cancelled.
pub async fn serve(addr: SocketAddr, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}
