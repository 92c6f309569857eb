//! High-frequency trading order book with price-time priority matching.
//!
//! Core features:
//! - Price-time priority matching (best price first, then FIFO)
//! - MARKET, LIMIT, IOC, and FOK order types
//! - Decimal-exact prices and quantities, no float on the matching path
//! - Eager removal: a filled or cancelled order leaves every view before
//!   any further event is dispatched
//! - Synchronous trade/BBO/depth event dispatch with listener fault isolation

pub mod book;
pub mod engine;
pub mod error;
pub mod price_level;
pub mod types;

pub use book::OrderBook;
pub use engine::MatchingEngine;
pub use error::OrderError;
pub use price_level::PriceLevel;
pub use types::{Bbo, DepthLevel, DepthSnapshot, Order, OrderId, OrderStatus, OrderType, Side, Trade, TradeId};
