//! WebSocket handlers for real-time market data streaming.
//!
//! Provides live trade execution and BBO/depth updates via WebSocket
//! connections. Uses tokio::select! for concurrent handling of messages,
//! broadcasts, and heartbeats.

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures::{sink::SinkExt, stream::StreamExt};
use orderbook::Bbo;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::{types::*, AppState};

/// Handles real-time trade streaming for a symbol.
///
/// Streams trade executions immediately as they occur. Includes ping/pong
/// heartbeat for connection health monitoring.
pub async fn handle_trade_stream(socket: WebSocket, symbol: String, state: AppState) {
    info!("new trade stream connection for {}", symbol);

    let (mut sender, mut receiver) = socket.split();
    let mut trade_rx = state.trade_broadcaster.subscribe();
    let mut ping_interval = interval(Duration::from_secs(30));

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(WebSocketMessage::Ping { timestamp_ms }) = serde_json::from_str(&text) {
                            let pong = WebSocketMessage::Pong { timestamp_ms };
                            if let Ok(json) = serde_json::to_string(&pong) {
                                let _ = sender.send(Message::Text(json)).await;
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!("trade stream connection closed for {}", symbol);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("websocket error in trade stream: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            trade_result = trade_rx.recv() => {
                match trade_result {
                    Ok(trade) if trade.symbol == symbol => {
                        let ws_msg = WebSocketMessage::Trade(trade);
                        if let Ok(json) = serde_json::to_string(&ws_msg) {
                            if sender.send(Message::Text(json)).await.is_err() {
                                warn!("failed to send trade update for {}", symbol);
                                break;
                            }
                        }
                    }
                    Ok(_) => {} // a trade on a different symbol
                    Err(_) => break, // channel closed or lagged
                }
            }

            _ = ping_interval.tick() => {
                let ping = WebSocketMessage::Ping { timestamp_ms: Utc::now().timestamp_millis() };
                if let Ok(json) = serde_json::to_string(&ping) {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    info!("trade stream handler ended for {}", symbol);
}

/// Handles real-time BBO/depth streaming for a symbol.
///
/// Sends an initial snapshot on connection, then a fresh snapshot at 10 Hz
/// whenever the BBO has changed since the last one sent.
pub async fn handle_depth_stream(socket: WebSocket, symbol: String, state: AppState) {
    info!("new depth stream connection for {}", symbol);

    let (mut sender, mut receiver) = socket.split();
    let mut update_interval = interval(Duration::from_millis(100));
    let mut ping_interval = interval(Duration::from_secs(30));

    if let Some(initial) = state.engine.depth(&symbol, 10) {
        if let Ok(json) = serde_json::to_string(&WebSocketMessage::Depth(initial)) {
            let _ = sender.send(Message::Text(json)).await;
        }
    }

    let mut last_bbo: Option<Bbo> = state.engine.bbo(&symbol);

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(WebSocketMessage::Ping { timestamp_ms }) = serde_json::from_str(&text) {
                            let pong = WebSocketMessage::Pong { timestamp_ms };
                            if let Ok(json) = serde_json::to_string(&pong) {
                                let _ = sender.send(Message::Text(json)).await;
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!("depth stream connection closed for {}", symbol);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("websocket error in depth stream: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            _ = update_interval.tick() => {
                if let Some(bbo) = state.engine.bbo(&symbol) {
                    let changed = match &last_bbo {
                        Some(prev) => {
                            bbo.best_bid != prev.best_bid
                                || bbo.best_offer != prev.best_offer
                                || bbo.bid_quantity != prev.bid_quantity
                                || bbo.offer_quantity != prev.offer_quantity
                        }
                        None => true,
                    };
                    if changed {
                        let ws_msg = WebSocketMessage::Bbo(bbo.clone());
                        if let Ok(json) = serde_json::to_string(&ws_msg) {
                            if sender.send(Message::Text(json)).await.is_err() {
                                warn!("failed to send bbo update for {}", symbol);
                                break;
                            }
                        }
                        last_bbo = Some(bbo);
                    }
                }
            }

            _ = ping_interval.tick() => {
                let ping = WebSocketMessage::Ping { timestamp_ms: Utc::now().timestamp_millis() };
                if let Ok(json) = serde_json::to_string(&ping) {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    info!("depth stream handler ended for {}", symbol);
}
