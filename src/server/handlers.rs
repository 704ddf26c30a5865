//! Request handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::models::{Instrument, PortfolioSnapshot, PortfolioSummary};

use super::{page, AppState, RECENT_TRADES};

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = %e, "Request failed");
        Self::new("INTERNAL", format!("{:#}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// Loop status and effective configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    pub poll_interval_secs: u64,
    pub take_profit_pct: Decimal,
    pub stop_loss_pct: Decimal,
    pub instruments: Vec<Instrument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub running: bool,
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    // Read the flag before locking the exchange: `stop` holds the controller
    // lock while the loop may be waiting on the exchange.
    let running = state.controller.is_running().await;
    let summary = state.exchange.write().await.summary(RECENT_TRADES)?;
    Ok(Html(page::render(&summary, running)))
}

/// GET /start
pub async fn start(State(state): State<AppState>) -> Redirect {
    state.controller.start().await;
    Redirect::to("/")
}

/// GET /stop
pub async fn stop(State(state): State<AppState>) -> Redirect {
    state.controller.stop().await;
    Redirect::to("/")
}

/// GET /api/summary
pub async fn summary(State(state): State<AppState>) -> Result<Json<PortfolioSummary>, ApiError> {
    let summary = state.exchange.write().await.summary(RECENT_TRADES)?;
    Ok(Json(summary))
}

/// GET /api/portfolio
pub async fn portfolio(State(state): State<AppState>) -> Json<PortfolioSnapshot> {
    Json(state.exchange.read().await.snapshot())
}

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let config = state.controller.config();
    Json(StatusResponse {
        running: state.controller.is_running().await,
        poll_interval_secs: config.poll_interval_secs,
        take_profit_pct: config.take_profit_pct,
        stop_loss_pct: config.stop_loss_pct,
        instruments: config.instruments.clone(),
    })
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        running: state.controller.is_running().await,
    })
}
