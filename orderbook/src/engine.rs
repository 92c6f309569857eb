//! The matching engine: one `OrderBook` per symbol, the four order-type
//! state machines that drive it, and synchronous event dispatch to
//! registered listeners.

use crate::book::OrderBook;
use crate::types::{Bbo, DepthSnapshot, Order, OrderId, OrderStatus, OrderType, Side, Trade, TradeId};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

type TradeListener = Box<dyn Fn(&Trade) + Send + Sync>;
type BboListener = Box<dyn Fn(&Bbo) + Send + Sync>;
type DepthListener = Box<dyn Fn(&str, &DepthSnapshot) + Send + Sync>;

/// How many levels per side are included in the depth snapshot handed to
/// depth listeners after a book-changing event. Callers that want more
/// can still call `depth` directly with any `k`.
const DISPATCH_DEPTH: usize = 10;

/// Owns one `OrderBook` per symbol (created lazily, on first reference, and
/// kept for the life of the process) behind a per-symbol `Mutex`, so two
/// symbols match concurrently but a symbol never reenters its own book.
/// Also owns the trade log and the three listener registries.
pub struct MatchingEngine {
    books: DashMap<String, Mutex<OrderBook>>,
    trades: Mutex<Vec<Trade>>,
    trade_listeners: Mutex<Vec<TradeListener>>,
    bbo_listeners: Mutex<Vec<BboListener>>,
    depth_listeners: Mutex<Vec<DepthListener>>,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
            trades: Mutex::new(Vec::new()),
            trade_listeners: Mutex::new(Vec::new()),
            bbo_listeners: Mutex::new(Vec::new()),
            depth_listeners: Mutex::new(Vec::new()),
        }
    }

    /// Submits a new order for matching. Never returns `Err`: a
    /// construction failure (§7) comes back as `status = Rejected` with an
    /// empty trade vector rather than propagating out of the call.
    pub fn submit_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: Side,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> (Order, Vec<Trade>) {
        let mut order = match Order::new(symbol, order_type, side, quantity, price) {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(%err, symbol, "order rejected at construction");
                return (Self::rejected_order(symbol, order_type, side, quantity, price), Vec::new());
            }
        };

        let (trades, book_changed) = match order_type {
            OrderType::Market => self.handle_market(&mut order, symbol),
            OrderType::Limit => self.handle_limit(&mut order, symbol),
            OrderType::Ioc => self.handle_ioc(&mut order, symbol),
            OrderType::Fok => self.handle_fok(&mut order, symbol),
        };

        if !trades.is_empty() {
            self.trades.lock().unwrap().extend(trades.iter().cloned());
            for trade in &trades {
                self.dispatch_trade(trade);
            }
        }
        if book_changed {
            self.dispatch_book_updates(symbol);
        }
        (order, trades)
    }

    /// Cancels a resting order. Returns `None` if the symbol or order id is
    /// unknown. Removal is eager: the order leaves both the keyed and
    /// sorted views before BBO/depth listeners are notified.
    pub fn cancel_order(&self, symbol: &str, order_id: OrderId) -> Option<Order> {
        let book_entry = self.books.get(symbol)?;
        let removed = book_entry.lock().unwrap().remove_order(order_id);
        drop(book_entry);
        let mut order = removed?;
        order.status = OrderStatus::Cancelled;
        self.dispatch_book_updates(symbol);
        Some(order)
    }

    /// Current best bid/offer for `symbol`, or `None` if no book exists for
    /// it yet. A read-only query never creates a book — only `submit_order`
    /// and `cancel_order` do that.
    pub fn bbo(&self, symbol: &str) -> Option<Bbo> {
        Some(self.books.get(symbol)?.lock().unwrap().bbo())
    }

    /// Top `levels` price levels of each side for `symbol`, or `None` if no
    /// book exists for it yet.
    pub fn depth(&self, symbol: &str, levels: usize) -> Option<DepthSnapshot> {
        Some(self.books.get(symbol)?.lock().unwrap().depth(levels))
    }

    /// Every symbol this engine has ever created a book for.
    pub fn symbols(&self) -> Vec<String> {
        self.books.iter().map(|entry| entry.key().clone()).collect()
    }

    /// The full append-only trade log, oldest first.
    pub fn trade_log(&self) -> Vec<Trade> {
        self.trades.lock().unwrap().clone()
    }

    /// Registers a listener invoked, in registration order, once per trade.
    /// A panicking listener is isolated and does not affect later
    /// listeners or the caller of `submit_order`.
    pub fn on_trade(&self, listener: impl Fn(&Trade) + Send + Sync + 'static) {
        self.trade_listeners.lock().unwrap().push(Box::new(listener));
    }

    /// Registers a listener invoked with the new BBO whenever a submission
    /// or cancellation changes it.
    pub fn on_bbo(&self, listener: impl Fn(&Bbo) + Send + Sync + 'static) {
        self.bbo_listeners.lock().unwrap().push(Box::new(listener));
    }

    /// Registers a listener invoked with a fresh depth snapshot whenever a
    /// submission or cancellation changes the book.
    pub fn on_depth(&self, listener: impl Fn(&str, &DepthSnapshot) + Send + Sync + 'static) {
        self.depth_listeners.lock().unwrap().push(Box::new(listener));
    }

    /// Looks up or lazily creates the book for `symbol`. Only ever called
    /// from the mutating paths (`submit_order`'s handlers, `cancel_order`'s
    /// lookup is a plain `self.books.get` and creates nothing on a miss) —
    /// read-only queries must not bring a book into existence.
    fn book_entry(&self, symbol: &str) -> dashmap::mapref::one::Ref<'_, String, Mutex<OrderBook>> {
        if !self.books.contains_key(symbol) {
            self.books
                .entry(symbol.to_string())
                .or_insert_with(|| Mutex::new(OrderBook::new(symbol)));
        }
        self.books.get(symbol).expect("just inserted")
    }

    /// MARKET: match whatever is available regardless of price. A market
    /// order never rests — any unmatched remainder is cancelled rather
    /// than left Pending, since it has no price to wait at.
    fn handle_market(&self, order: &mut Order, symbol: &str) -> (Vec<Trade>, bool) {
        let trades = self.match_and_build_trades(symbol, order);
        if order.remaining_quantity > Decimal::ZERO {
            order.status = OrderStatus::Cancelled;
        }
        let changed = !trades.is_empty();
        (trades, changed)
    }

    /// LIMIT: match what crosses now, then rest any remainder at its own
    /// price, preserving the order's position in time priority. Matching
    /// and resting happen under one held guard, so a concurrent submission
    /// for this symbol cannot interleave between the two phases.
    fn handle_limit(&self, order: &mut Order, symbol: &str) -> (Vec<Trade>, bool) {
        let book_entry = self.book_entry(symbol);
        let mut book = book_entry.lock().unwrap();

        let plan = book.match_candidates(order);
        let trades = if plan.is_empty() {
            Vec::new()
        } else {
            let fills = book.execute(&plan);
            Self::trades_from_fills(order, symbol, fills)
        };

        let rests = order.remaining_quantity > Decimal::ZERO;
        if rests {
            book.add_order(order.clone()).expect("freshly minted order id cannot collide");
        }
        drop(book);

        let changed = !trades.is_empty() || rests;
        (trades, changed)
    }

    /// IOC: match what crosses now; whatever is left over is cancelled
    /// outright rather than resting.
    fn handle_ioc(&self, order: &mut Order, symbol: &str) -> (Vec<Trade>, bool) {
        let trades = self.match_and_build_trades(symbol, order);
        if order.remaining_quantity > Decimal::ZERO {
            order.status = OrderStatus::Cancelled;
        }
        let changed = !trades.is_empty();
        (trades, changed)
    }

    /// FOK: the whole quantity fills now or nothing happens. Checking the
    /// plan before executing keeps the decision atomic; on a kill, no
    /// trade is recorded and no listener is notified.
    fn handle_fok(&self, order: &mut Order, symbol: &str) -> (Vec<Trade>, bool) {
        let book_entry = self.book_entry(symbol);
        let mut book = book_entry.lock().unwrap();
        let plan = book.match_candidates(order);
        let plan_quantity: Decimal = plan.iter().map(|&(_, qty)| qty).sum();
        if plan_quantity < order.remaining_quantity {
            order.status = OrderStatus::Cancelled;
            return (Vec::new(), false);
        }
        let fills = book.execute(&plan);
        drop(book);
        let trades = Self::trades_from_fills(order, symbol, fills);
        (trades, true)
    }

    /// Shared by MARKET/IOC (neither ever rests, so a single match-and-
    /// execute pass under one guard is the whole operation): compute the
    /// crossing plan against the live book and execute it immediately,
    /// whatever it covers.
    fn match_and_build_trades(&self, symbol: &str, order: &mut Order) -> Vec<Trade> {
        let book_entry = self.book_entry(symbol);
        let mut book = book_entry.lock().unwrap();
        let plan = book.match_candidates(order);
        if plan.is_empty() {
            return Vec::new();
        }
        let fills = book.execute(&plan);
        drop(book);
        Self::trades_from_fills(order, symbol, fills)
    }

    /// Applies each fill to `order` in FIFO plan order and turns it into a
    /// trade record at the maker's (resting) price.
    fn trades_from_fills(order: &mut Order, symbol: &str, fills: Vec<(Order, Decimal)>) -> Vec<Trade> {
        fills
            .into_iter()
            .map(|(maker, qty)| {
                order.apply_fill(qty);
                Trade {
                    trade_id: TradeId::new(),
                    symbol: symbol.to_string(),
                    price: maker.price.expect("resting orders always carry a price"),
                    quantity: qty,
                    timestamp: Utc::now(),
                    aggressor_side: order.side,
                    maker_order_id: maker.order_id,
                    taker_order_id: order.order_id,
                }
            })
            .collect()
    }

    fn dispatch_trade(&self, trade: &Trade) {
        for listener in self.trade_listeners.lock().unwrap().iter() {
            if catch_unwind(AssertUnwindSafe(|| listener(trade))).is_err() {
                tracing::warn!("trade listener panicked; isolated from other listeners");
            }
        }
    }

    fn dispatch_bbo(&self, bbo: &Bbo) {
        for listener in self.bbo_listeners.lock().unwrap().iter() {
            if catch_unwind(AssertUnwindSafe(|| listener(bbo))).is_err() {
                tracing::warn!("bbo listener panicked; isolated from other listeners");
            }
        }
    }

    fn dispatch_depth(&self, symbol: &str, snapshot: &DepthSnapshot) {
        for listener in self.depth_listeners.lock().unwrap().iter() {
            if catch_unwind(AssertUnwindSafe(|| listener(symbol, snapshot))).is_err() {
                tracing::warn!("depth listener panicked; isolated from other listeners");
            }
        }
    }

    fn dispatch_book_updates(&self, symbol: &str) {
        if let Some(bbo) = self.bbo(symbol) {
            self.dispatch_bbo(&bbo);
        }
        if let Some(depth) = self.depth(symbol, DISPATCH_DEPTH) {
            self.dispatch_depth(symbol, &depth);
        }
    }

    fn rejected_order(
        symbol: &str,
        order_type: OrderType,
        side: Side,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Order {
        Order {
            order_id: OrderId::new(),
            symbol: symbol.to_string(),
            order_type,
            side,
            quantity,
            price,
            timestamp: Utc::now(),
            status: OrderStatus::Rejected,
            filled_quantity: Decimal::ZERO,
            remaining_quantity: Decimal::ZERO,
        }
    }
}
