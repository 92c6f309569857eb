//! A single price level: an ordered FIFO queue of resting orders with a
//! cached aggregate remaining quantity.

use crate::types::{Order, OrderId};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// FIFO queue of orders resting at one exact price.
///
/// `total_remaining` is kept in lockstep with the sum of members'
/// `remaining_quantity` by every mutating method below; nothing outside
/// this module is allowed to touch `orders` directly.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Decimal,
    orders: VecDeque<Order>,
    total_remaining: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            total_remaining: Decimal::ZERO,
        }
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Appends to the tail — admission order is FIFO order.
    pub fn add(&mut self, order: Order) {
        self.total_remaining += order.remaining_quantity;
        self.orders.push_back(order);
    }

    /// Unlinks the order with the given id, wherever it sits in the queue.
    /// Returns the removed order, or `None` if it wasn't present.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let pos = self.orders.iter().position(|o| o.order_id == order_id)?;
        let order = self.orders.remove(pos)?;
        self.total_remaining -= order.remaining_quantity;
        Some(order)
    }

    /// Applies a fill to the resting order with the given id, in place so
    /// its FIFO position is undisturbed. If the fill exhausts the order,
    /// it is unlinked from the queue. Returns the post-fill order (owned,
    /// since it may no longer live in the queue) or `None` if it wasn't
    /// resting here.
    pub fn fill(&mut self, order_id: OrderId, quantity: Decimal) -> Option<Order> {
        let order = self.orders.iter_mut().find(|o| o.order_id == order_id)?;
        order.apply_fill(quantity);
        self.total_remaining -= quantity;
        if order.remaining_quantity.is_zero() {
            self.remove(order_id)
        } else {
            Some(order.clone())
        }
    }

    /// Read-only projection: the prefix of orders (by id) whose cumulative
    /// remaining quantity covers up to `max_qty`, paired with the quantity
    /// each would contribute. The last entry may be a partial fill of its
    /// order. Does not mutate the level. The returned quantities sum to at
    /// most `max_qty`.
    pub fn peek_fillable(&self, max_qty: Decimal) -> Vec<(OrderId, Decimal)> {
        let mut out = Vec::new();
        let mut covered = Decimal::ZERO;
        for order in &self.orders {
            if covered >= max_qty {
                break;
            }
            let take = order.remaining_quantity.min(max_qty - covered);
            if take <= Decimal::ZERO {
                break;
            }
            out.push((order.order_id, take));
            covered += take;
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn total_remaining(&self) -> Decimal {
        self.total_remaining
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}
