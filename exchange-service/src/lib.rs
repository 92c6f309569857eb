//! HFT Exchange Service - REST API and WebSocket server for trading operations.
//!
//! Provides HTTP endpoints for order management and WebSocket streams for real-time
//! market data. Built with Axum for high-performance async request handling.

use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use orderbook::{MatchingEngine, OrderId};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

pub mod types;
mod websocket;

use types::*;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The engine owns per-symbol serialization internally; the service
    /// adds no locking of its own on top (see the concurrency model).
    engine: Arc<MatchingEngine>,
    /// Broadcast channel fed by the engine's `on_trade` callback, fanned
    /// out to every connected trade-stream WebSocket.
    trade_broadcaster: broadcast::Sender<orderbook::Trade>,
}

/// Builds the full router over a shared engine, wiring the engine's trade
/// callback into a broadcast channel for WebSocket subscribers.
pub fn app(engine: Arc<MatchingEngine>) -> Router {
    let (trade_tx, _) = broadcast::channel(1024);
    {
        let trade_tx = trade_tx.clone();
        engine.on_trade(move |trade| {
            let _ = trade_tx.send(trade.clone());
        });
    }

    Router::new()
        .route("/health", get(health_check))
        .route("/symbols", get(list_symbols))
        .route("/symbols/:symbol/orders", post(submit_order))
        .route("/symbols/:symbol/orders/:order_id", delete(cancel_order))
        .route("/symbols/:symbol/bbo", get(get_bbo))
        .route("/symbols/:symbol/depth", get(get_depth))
        .route("/symbols/:symbol/trades/stream", get(trade_stream))
        .route("/symbols/:symbol/depth/stream", get(depth_stream))
        .layer(CorsLayer::permissive())
        .with_state(AppState { engine, trade_broadcaster: trade_tx })
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "hft-exchange",
        "version": "0.1.0",
    }))
}

async fn list_symbols(State(state): State<AppState>) -> impl IntoResponse {
    Json(SymbolsResponse { symbols: state.engine.symbols() })
}

async fn get_bbo(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let bbo = state.engine.bbo(&symbol).ok_or(AppError::SymbolNotFound)?;
    Ok(Json(bbo))
}

async fn get_depth(
    Path(symbol): Path<String>,
    Query(params): Query<DepthQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let depth = state
        .engine
        .depth(&symbol, params.levels.unwrap_or(10))
        .ok_or(AppError::SymbolNotFound)?;
    Ok(Json(depth))
}

/// Submits a new order to the exchange. Construction errors never reach
/// this handler as an `Err` — they come back as `status = Rejected` on
/// the returned order, per the engine's contract.
async fn submit_order(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SubmitOrderRequest>,
) -> impl IntoResponse {
    let (order, trades) = state.engine.submit_order(
        &symbol,
        request.order_type,
        request.side,
        request.quantity,
        request.price,
    );

    let status = if order.status == orderbook::OrderStatus::Rejected {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::CREATED
    };

    (status, Json(SubmitOrderResponse { order, trades }))
}

/// Cancels an existing order by ID.
async fn cancel_order(
    Path((symbol, order_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = order_id.parse::<uuid::Uuid>().map_err(|_| AppError::InvalidOrderId)?;
    let cancelled = state
        .engine
        .cancel_order(&symbol, OrderId(order_id))
        .ok_or(AppError::OrderNotFound)?;

    Ok(Json(CancelResponse { order: cancelled }))
}

/// WebSocket handler for real-time trade streaming.
async fn trade_stream(
    Path(symbol): Path<String>,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| websocket::handle_trade_stream(socket, symbol, state))
}

/// WebSocket handler for real-time BBO/depth streaming.
async fn depth_stream(
    Path(symbol): Path<String>,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| websocket::handle_depth_stream(socket, symbol, state))
}

/// Application error types for HTTP responses.
#[derive(Debug)]
enum AppError {
    SymbolNotFound,
    OrderNotFound,
    InvalidOrderId,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::SymbolNotFound => (StatusCode::NOT_FOUND, "Symbol not found"),
            AppError::OrderNotFound => (StatusCode::NOT_FOUND, "Order not found"),
            AppError::InvalidOrderId => (StatusCode::BAD_REQUEST, "Invalid order ID"),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}
