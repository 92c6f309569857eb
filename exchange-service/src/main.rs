//! Binary entry point for the HFT exchange service: builds the router
//! from `exchange_service::app` and serves it over HTTP.

use orderbook::MatchingEngine;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let engine = Arc::new(MatchingEngine::new());
    let app = exchange_service::app(engine);

    let bind_addr = std::env::var("HFTX_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();

    info!("HFT Exchange Service starting on http://{}", bind_addr);
    info!("Available endpoints:");
    info!("  GET  /health - Health check");
    info!("  GET  /symbols - List known symbols");
    info!("  POST /symbols/:symbol/orders - Submit order");
    info!("  DEL  /symbols/:symbol/orders/:id - Cancel order");
    info!("  GET  /symbols/:symbol/bbo - Best bid/offer");
    info!("  GET  /symbols/:symbol/depth - Market depth");
    info!("  WS   /symbols/:symbol/trades/stream - Trade stream");
    info!("  WS   /symbols/:symbol/depth/stream - BBO/depth stream");

    axum::serve(listener, app).await.unwrap();
}
