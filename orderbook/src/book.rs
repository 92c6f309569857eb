//! Per-symbol order book: sorted price levels on each side, FIFO within a
//! level, plus a by-id index for O(1)-average lookup and eager removal.

use crate::error::OrderError;
use crate::price_level::PriceLevel;
use crate::types::{Bbo, DepthLevel, DepthSnapshot, Order, OrderId, OrderType, Side};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// A symbol's resting orders, indexed two ways: by price (for priority
/// traversal) and by id (for cancellation). The book is the sole owner of
/// every resting `Order` it holds.
pub struct OrderBook {
    symbol: String,
    bids: BTreeMap<Decimal, PriceLevel>,
    asks: BTreeMap<Decimal, PriceLevel>,
    index: HashMap<OrderId, (Side, Decimal)>,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    fn side_map(&self, side: Side) -> &BTreeMap<Decimal, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Inserts a resting order into its side, creating the price level if
    /// needed. Fails if `order_id` is already known to this book.
    pub fn add_order(&mut self, order: Order) -> Result<(), OrderError> {
        if self.index.contains_key(&order.order_id) {
            return Err(OrderError::DuplicateOrderId(order.order_id));
        }
        let price = order.price.expect("resting orders always carry a price");
        let side = order.side;
        let order_id = order.order_id;

        self.side_map_mut(side)
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .add(order);
        self.index.insert(order_id, (side, price));
        Ok(())
    }

    /// Removes and returns the order with the given id, if it is resting
    /// here. Drops the price level (and its place in the sorted view) the
    /// instant it becomes empty.
    pub fn remove_order(&mut self, order_id: OrderId) -> Option<Order> {
        let (side, price) = self.index.remove(&order_id)?;
        let levels = self.side_map_mut(side);
        let level = levels.get_mut(&price)?;
        let removed = level.remove(order_id);
        if level.is_empty() {
            levels.remove(&price);
        }
        removed
    }

    /// Applies a fill to a resting order in place. Removes the order from
    /// the index (and an emptied level from the sorted view) the instant
    /// it becomes fully filled.
    fn fill_resting(&mut self, order_id: OrderId, quantity: Decimal) -> Order {
        let (side, price) = *self
            .index
            .get(&order_id)
            .expect("fill target must be resting");
        let levels = self.side_map_mut(side);
        let level = levels
            .get_mut(&price)
            .expect("level must exist for indexed order");
        let updated = level
            .fill(order_id, quantity)
            .expect("order must exist in its level");
        let level_now_empty = level.is_empty();
        if level_now_empty {
            levels.remove(&price);
        }
        if updated.remaining_quantity.is_zero() {
            self.index.remove(&order_id);
        }
        updated
    }

    /// Best bid/offer with aggregate size at that price, or absence
    /// indicators when a side is empty.
    pub fn bbo(&self) -> Bbo {
        let (best_bid, bid_quantity) = self
            .bids
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_remaining()))
            .unzip();
        let (best_offer, offer_quantity) = self
            .asks
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_remaining()))
            .unzip();
        Bbo {
            symbol: self.symbol.clone(),
            best_bid,
            best_offer,
            bid_quantity,
            offer_quantity,
            timestamp: Utc::now(),
        }
    }

    /// Top `k` levels of each side, bids descending, asks ascending.
    pub fn depth(&self, k: usize) -> DepthSnapshot {
        let bids = self
            .bids
            .iter()
            .rev()
            .take(k)
            .map(|(price, level)| DepthLevel {
                price: *price,
                quantity: level.total_remaining(),
            })
            .collect();
        let asks = self
            .asks
            .iter()
            .take(k)
            .map(|(price, level)| DepthLevel {
                price: *price,
                quantity: level.total_remaining(),
            })
            .collect();
        DepthSnapshot {
            symbol: self.symbol.clone(),
            bids,
            asks,
            timestamp: Utc::now(),
        }
    }

    /// Pure, read-only projection of what `incoming` would match against:
    /// a priority-ordered sequence of (maker order id, fill quantity)
    /// covering at most `incoming.remaining_quantity`. Never mutates the
    /// book.
    pub fn match_candidates(&self, incoming: &Order) -> Vec<(OrderId, Decimal)> {
        let opposite_side = incoming.side.opposite();
        let mut remaining = incoming.remaining_quantity;
        let mut plan = Vec::new();

        let prices: Vec<Decimal> = match opposite_side {
            Side::Sell => self.asks.keys().copied().collect(),
            Side::Buy => self.bids.keys().copied().rev().collect(),
        };

        for price in prices {
            if remaining <= Decimal::ZERO {
                break;
            }
            if !crosses(incoming, price) {
                break;
            }
            let level = self
                .side_map(opposite_side)
                .get(&price)
                .expect("price came from this side's key set");
            for (maker_id, qty) in level.peek_fillable(remaining) {
                plan.push((maker_id, qty));
                remaining -= qty;
                if remaining <= Decimal::ZERO {
                    break;
                }
            }
        }
        plan
    }

    /// Executes a previously computed match plan: fills each maker in
    /// place and returns, per fill, the maker's post-fill state (its
    /// `price` is immutable and equals the trade price) alongside the fill
    /// quantity. Makers that reach zero remaining are removed from the
    /// book before this returns.
    pub fn execute(&mut self, plan: &[(OrderId, Decimal)]) -> Vec<(Order, Decimal)> {
        plan.iter()
            .map(|&(maker_id, qty)| (self.fill_resting(maker_id, qty), qty))
            .collect()
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Whether `incoming` is willing to cross a resting order at `level_price`
/// on the opposite side — §4.2.
fn crosses(incoming: &Order, level_price: Decimal) -> bool {
    if incoming.order_type == OrderType::Market {
        return true;
    }
    let incoming_price = incoming
        .price
        .expect("non-market orders always carry a price");
    match incoming.side {
        Side::Buy => incoming_price >= level_price,
        Side::Sell => incoming_price <= level_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderStatus;
    use rust_decimal_macros::dec;

    fn limit(side: Side, qty: Decimal, price: Decimal) -> Order {
        Order {
            order_id: OrderId::new(),
            symbol: "BTC-USD".into(),
            order_type: OrderType::Limit,
            side,
            quantity: qty,
            price: Some(price),
            timestamp: Utc::now(),
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            remaining_quantity: qty,
        }
    }

    fn market(side: Side, qty: Decimal) -> Order {
        Order {
            order_id: OrderId::new(),
            symbol: "BTC-USD".into(),
            order_type: OrderType::Market,
            side,
            quantity: qty,
            price: None,
            timestamp: Utc::now(),
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            remaining_quantity: qty,
        }
    }

    #[test]
    fn add_then_remove_restores_prior_state() {
        let mut book = OrderBook::new("BTC-USD");
        let before = book.depth(10);
        let o = limit(Side::Buy, dec!(1), dec!(100));
        let id = o.order_id;
        book.add_order(o).unwrap();
        assert!(book.contains(id));
        book.remove_order(id).unwrap();
        let after = book.depth(10);
        assert_eq!(before, after);
        assert!(book.is_empty());
    }

    #[test]
    fn duplicate_order_id_rejected() {
        let mut book = OrderBook::new("BTC-USD");
        let o = limit(Side::Buy, dec!(1), dec!(100));
        let dup = o.clone();
        book.add_order(o).unwrap();
        let err = book.add_order(dup).unwrap_err();
        assert!(matches!(err, OrderError::DuplicateOrderId(_)));
    }

    #[test]
    fn bbo_reports_best_on_each_side() {
        let mut book = OrderBook::new("BTC-USD");
        book.add_order(limit(Side::Buy, dec!(1), dec!(99))).unwrap();
        book.add_order(limit(Side::Buy, dec!(2), dec!(101))).unwrap();
        book.add_order(limit(Side::Sell, dec!(3), dec!(105))).unwrap();
        book.add_order(limit(Side::Sell, dec!(4), dec!(103))).unwrap();

        let bbo = book.bbo();
        assert_eq!(bbo.best_bid, Some(dec!(101)));
        assert_eq!(bbo.bid_quantity, Some(dec!(2)));
        assert_eq!(bbo.best_offer, Some(dec!(103)));
        assert_eq!(bbo.offer_quantity, Some(dec!(4)));
    }

    #[test]
    fn bbo_absent_on_empty_side() {
        let book = OrderBook::new("BTC-USD");
        let bbo = book.bbo();
        assert_eq!(bbo.best_bid, None);
        assert_eq!(bbo.best_offer, None);
    }

    #[test]
    fn depth_orders_bids_desc_asks_asc() {
        let mut book = OrderBook::new("BTC-USD");
        for p in [99, 101, 100] {
            book.add_order(limit(Side::Buy, dec!(1), Decimal::from(p))).unwrap();
        }
        for p in [105, 103, 104] {
            book.add_order(limit(Side::Sell, dec!(1), Decimal::from(p))).unwrap();
        }
        let depth = book.depth(10);
        let bid_prices: Vec<Decimal> = depth.bids.iter().map(|l| l.price).collect();
        let ask_prices: Vec<Decimal> = depth.asks.iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![dec!(101), dec!(100), dec!(99)]);
        assert_eq!(ask_prices, vec![dec!(103), dec!(104), dec!(105)]);
    }

    #[test]
    fn match_candidates_limit_respects_fifo_within_level() {
        let mut book = OrderBook::new("BTC-USD");
        let s1 = limit(Side::Sell, dec!(1), dec!(100));
        let s2 = limit(Side::Sell, dec!(1), dec!(100));
        let id1 = s1.order_id;
        let id2 = s2.order_id;
        book.add_order(s1).unwrap();
        book.add_order(s2).unwrap();

        let taker = limit(Side::Buy, dec!(1.5), dec!(100));
        let plan = book.match_candidates(&taker);
        assert_eq!(plan, vec![(id1, dec!(1)), (id2, dec!(0.5))]);
    }

    #[test]
    fn match_candidates_walks_best_price_first_across_levels() {
        let mut book = OrderBook::new("BTC-USD");
        let cheap = limit(Side::Sell, dec!(1), dec!(100));
        let pricey = limit(Side::Sell, dec!(1), dec!(101));
        let id_cheap = cheap.order_id;
        book.add_order(pricey).unwrap();
        book.add_order(cheap).unwrap();

        let taker = limit(Side::Buy, dec!(0.5), dec!(101));
        let plan = book.match_candidates(&taker);
        assert_eq!(plan, vec![(id_cheap, dec!(0.5))]);
    }

    #[test]
    fn match_candidates_stops_at_non_crossing_price() {
        let mut book = OrderBook::new("BTC-USD");
        book.add_order(limit(Side::Sell, dec!(1), dec!(105))).unwrap();
        let taker = limit(Side::Buy, dec!(1), dec!(100));
        assert!(book.match_candidates(&taker).is_empty());
    }

    #[test]
    fn match_candidates_market_crosses_regardless_of_price() {
        let mut book = OrderBook::new("BTC-USD");
        let resting = limit(Side::Sell, dec!(1), dec!(999_999));
        let id = resting.order_id;
        book.add_order(resting).unwrap();
        let taker = market(Side::Buy, dec!(1));
        let plan = book.match_candidates(&taker);
        assert_eq!(plan, vec![(id, dec!(1))]);
    }

    #[test]
    fn execute_removes_fully_filled_maker_and_leaves_level_empty() {
        let mut book = OrderBook::new("BTC-USD");
        let maker = limit(Side::Sell, dec!(1), dec!(100));
        let maker_id = maker.order_id;
        book.add_order(maker).unwrap();

        let taker = limit(Side::Buy, dec!(1), dec!(100));
        let plan = book.match_candidates(&taker);
        let fills = book.execute(&plan);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].1, dec!(1));
        assert!(!book.contains(maker_id));
        assert!(book.depth(10).asks.is_empty());
    }

    #[test]
    fn execute_leaves_partial_maker_resting_with_reduced_total() {
        let mut book = OrderBook::new("BTC-USD");
        let maker = limit(Side::Sell, dec!(2), dec!(100));
        let maker_id = maker.order_id;
        book.add_order(maker).unwrap();

        let taker = limit(Side::Buy, dec!(0.5), dec!(100));
        let plan = book.match_candidates(&taker);
        book.execute(&plan);
        assert!(book.contains(maker_id));
        let bbo = book.bbo();
        assert_eq!(bbo.offer_quantity, Some(dec!(1.5)));
    }
}
