//! Construction-time error taxonomy (see spec §7 — these are rejections
//! that occur before an order is admitted, never mid-match).

use crate::types::OrderId;
use thiserror::Error;

/// Reasons a submitted order is refused admission. A submission refused for
/// any of these reasons never reaches the book: the caller sees
/// `status = Rejected`, zero trades, and no events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("price is required for {0:?} orders")]
    MissingPrice(crate::types::OrderType),

    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(rust_decimal::Decimal),

    #[error("price must be positive, got {0}")]
    NonPositivePrice(rust_decimal::Decimal),

    #[error("market orders must not carry a price")]
    MarketOrderWithPrice,

    #[error("order id {0} already exists in this book")]
    DuplicateOrderId(OrderId),
}
