//! Core value types: orders, trades, BBO, and the enumerations that tag them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique order identifier, assigned by the collaborator before submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    /// Mints a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique trade identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(pub Uuid);

impl TradeId {
    /// Mints a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the book an order sits on, or a trade's aggressor came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The opposite side of the book — where a crossing counterparty rests.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type, fixed at admission; determines the state machine `MatchingEngine` runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
    /// Immediate-or-Cancel: match what's available now, cancel the rest.
    Ioc,
    /// Fill-or-Kill: match the full quantity now, or do nothing at all.
    Fok,
}

/// Lifecycle state of an order. Never demoted once advanced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

/// A trading order: either a submission request or the resting record the
/// book owns once admitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub symbol: String,
    pub order_type: OrderType,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub remaining_quantity: Decimal,
}

impl Order {
    /// Validates and constructs a fresh order ready for submission.
    ///
    /// Enforces the construction-time taxonomy: a price is required for
    /// every type except `Market`, `Market` must not carry one, and both
    /// quantity and (when present) price must be strictly positive. A
    /// caller that gets `Err` here never reaches the book — the engine
    /// folds the error into a `Rejected` order instead of propagating it.
    pub fn new(
        symbol: impl Into<String>,
        order_type: OrderType,
        side: Side,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Result<Self, crate::error::OrderError> {
        use crate::error::OrderError;

        if quantity <= Decimal::ZERO {
            return Err(OrderError::NonPositiveQuantity(quantity));
        }
        match (order_type, price) {
            (OrderType::Market, Some(_)) => return Err(OrderError::MarketOrderWithPrice),
            (OrderType::Market, None) => {}
            (_, None) => return Err(OrderError::MissingPrice(order_type)),
            (_, Some(p)) if p <= Decimal::ZERO => return Err(OrderError::NonPositivePrice(p)),
            (_, Some(_)) => {}
        }
        Ok(Self {
            order_id: OrderId::new(),
            symbol: symbol.into(),
            order_type,
            side,
            quantity,
            price,
            timestamp: Utc::now(),
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            remaining_quantity: quantity,
        })
    }

    /// Applies a partial (or full) fill, advancing `status` accordingly.
    ///
    /// # Panics
    /// Panics if `quantity` exceeds `remaining_quantity` — that would be an
    /// internal invariant violation on the matching path, never something a
    /// caller can trigger directly.
    pub fn apply_fill(&mut self, quantity: Decimal) {
        assert!(
            quantity <= self.remaining_quantity,
            "fill quantity exceeds remaining quantity"
        );
        self.filled_quantity += quantity;
        self.remaining_quantity -= quantity;
        self.status = if self.remaining_quantity.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }
}

/// An immutable, append-only record of a match between a maker and a taker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp: DateTime<Utc>,
    pub aggressor_side: Side,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
}

/// Best bid and offer for a symbol, derived from the book rather than stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bbo {
    pub symbol: String,
    pub best_bid: Option<Decimal>,
    pub best_offer: Option<Decimal>,
    pub bid_quantity: Option<Decimal>,
    pub offer_quantity: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// One price level's aggregate size, as reported in a depth snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// Top-K levels of both sides of a symbol's book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub symbol: String,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    pub timestamp: DateTime<Utc>,
}
