//! API types for REST and WebSocket interfaces.

use orderbook::{Bbo, DepthSnapshot, Order, OrderType, Side, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request to submit a new order of any of the four supported types.
/// `price` is required for everything except `Market` — see
/// `orderbook::Order::new` for the exact construction-time validation.
#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub order_type: OrderType,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
}

/// Response after submitting an order: its final state plus any trades
/// that executed immediately.
#[derive(Debug, Serialize)]
pub struct SubmitOrderResponse {
    pub order: Order,
    pub trades: Vec<Trade>,
}

/// Query parameters for market depth requests.
#[derive(Debug, Deserialize)]
pub struct DepthQuery {
    pub levels: Option<usize>,
}

/// List of available trading symbols.
#[derive(Debug, Serialize)]
pub struct SymbolsResponse {
    pub symbols: Vec<String>,
}

/// Response after cancelling an order.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub order: Order,
}

/// WebSocket message types for the trade and depth streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    #[serde(rename = "trade")]
    Trade(Trade),
    #[serde(rename = "bbo")]
    Bbo(Bbo),
    #[serde(rename = "depth")]
    Depth(DepthSnapshot),
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "ping")]
    Ping { timestamp_ms: i64 },
    #[serde(rename = "pong")]
    Pong { timestamp_ms: i64 },
}
