//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to the mode controller and the
//! order execution service.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};

use crate::application::services::TradingModeController;
use crate::application::use_cases::OrderExecutionService;
use crate::domain::shared::{ExchangeOrderId, Market};
use crate::error::ExecutionError;

use super::request::{JournalQuery, OpenOrdersQuery, PlaceOrderRequest, SetModeRequest};
use super::response::{HealthResponse, ModeStatusResponse, ValidateLiveResponse};

/// Application state shared across handlers.
pub struct AppState {
    /// Owner of the process-wide trading mode.
    pub modes: Arc<TradingModeController>,
    /// Order execution use case.
    pub orders: Arc<OrderExecutionService>,
    /// Application version.
    pub version: String,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            modes: Arc::clone(&self.modes),
            orders: Arc::clone(&self.orders),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/trading-mode/status", get(mode_status))
        .route("/api/v1/trading-mode/set", post(set_mode))
        .route("/api/v1/trading-mode/enable-dry-run", post(enable_dry_run))
        .route("/api/v1/trading-mode/validate-live", get(validate_live))
        .route("/api/v1/trading/order", post(place_order))
        .route(
            "/api/v1/trading/order/{market}/{order_id}",
            delete(cancel_order),
        )
        .route("/api/v1/trading/balance", get(balance))
        .route("/api/v1/trading/open-orders", get(open_orders))
        .route("/api/v1/trading/orders", get(order_journal))
        .with_state(state)
}

fn error_response(err: &ExecutionError) -> Response {
    let status = StatusCode::from_u16(err.code().http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err.to_http_response())).into_response()
}

fn respond<T: serde::Serialize>(result: Result<T, ExecutionError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        trading_mode: state.modes.status().current_mode,
    })
}

async fn mode_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(ModeStatusResponse::new(
        state.modes.status(),
        state.modes.live_readiness(),
    ))
}

async fn set_mode(
    State(state): State<AppState>,
    Json(request): Json<SetModeRequest>,
) -> Response {
    let target = match request.target() {
        Ok(target) => target,
        Err(err) => return error_response(&err),
    };

    let switched = state
        .modes
        .set_mode(target, request.force_dry_run)
        .await
        .map_err(ExecutionError::from)
        .map(|snapshot| {
            ModeStatusResponse::new(snapshot, state.modes.live_readiness()).with_message(format!(
                "Trading mode switched to {}",
                target.as_str().to_uppercase()
            ))
        });
    respond(switched)
}

/// Emergency kill switch. Never blocks on in-flight work.
async fn enable_dry_run(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.modes.enable_emergency_dry_run();
    Json(
        ModeStatusResponse::new(snapshot, state.modes.live_readiness())
            .with_message("Emergency dry-run mode enabled for safety"),
    )
}

async fn validate_live(State(state): State<AppState>) -> impl IntoResponse {
    Json(ValidateLiveResponse::new(
        state.modes.status().current_mode,
        state.modes.live_readiness(),
    ))
}

async fn place_order(
    State(state): State<AppState>,
    Json(body): Json<PlaceOrderRequest>,
) -> Response {
    let (request, client_order_id) = match body.into_domain() {
        Ok(parsed) => parsed,
        Err(err) => return error_response(&err),
    };
    respond(state.orders.execute_with_key(request, client_order_id).await)
}

async fn cancel_order(
    State(state): State<AppState>,
    Path((market, order_id)): Path<(String, String)>,
) -> Response {
    let market: Market = match market.parse() {
        Ok(market) => market,
        Err(e) => return error_response(&ExecutionError::invalid_order(format!("{e}"))),
    };
    let order_id = ExchangeOrderId::new(order_id);
    respond(state.orders.cancel_order(&market, &order_id).await)
}

async fn balance(State(state): State<AppState>) -> Response {
    respond(state.orders.balance().await)
}

async fn open_orders(
    State(state): State<AppState>,
    Query(query): Query<OpenOrdersQuery>,
) -> Response {
    let market = match query.market() {
        Ok(market) => market,
        Err(err) => return error_response(&err),
    };
    respond(state.orders.open_orders(market.as_ref()).await)
}

async fn order_journal(
    State(state): State<AppState>,
    Query(query): Query<JournalQuery>,
) -> Response {
    respond(state.orders.journal(query.limit()).await)
}
