//! HFT Ledger Performance Test Suite
//!
//! Runs performance tests followed by a basic trading demo showing
//! order placement, matching, and trade execution across MARKET, LIMIT,
//! IOC, and FOK order types.

use orderbook::{MatchingEngine, OrderType, Side};
use rust_decimal_macros::dec;

mod latency_test;

/// Main entry point - runs performance tests and demo.
fn main() {
    println!("=== HFT Ledger Performance Lab ===");

    latency_test::run_latency_tests();
    latency_test::run_throughput_test();

    println!("\n=== 1-Minute Sustained Throughput Test ===");
    latency_test::run_throughput_test_1min();

    println!("\n=== Basic Demo ===");
    run_basic_demo();
}

/// Demonstrates order submission, price-time matching, and the four order
/// types against a single symbol.
fn run_basic_demo() {
    let engine = MatchingEngine::new();
    engine.on_trade(|trade| {
        println!("  trade: {} @ {} (maker {}, taker {})", trade.quantity, trade.price, trade.maker_order_id, trade.taker_order_id);
    });

    println!("HFT Ledger - Order Book Demo");

    let (ask, _) = engine.submit_order("AAPL", OrderType::Limit, Side::Sell, dec!(100), Some(dec!(150.00)));
    println!("Submitted ask: {} @ {}", ask.quantity, ask.price.unwrap());

    let (bid, _) = engine.submit_order("AAPL", OrderType::Limit, Side::Buy, dec!(50), Some(dec!(149.50)));
    println!("Submitted bid: {} @ {}", bid.quantity, bid.price.unwrap());

    let bbo = engine.bbo("AAPL").unwrap();
    println!("Best bid: {:?}", bbo.best_bid);
    println!("Best offer: {:?}", bbo.best_offer);

    println!("Submitting crossing bid: 75 @ 150.00 (partial fill of resting ask)");
    let (crossing, trades) = engine.submit_order("AAPL", OrderType::Limit, Side::Buy, dec!(75), Some(dec!(150.00)));
    println!("Crossing bid status: {:?}, trades executed: {}", crossing.status, trades.len());

    println!("Submitting IOC order: 1000 @ 150.00 (takes what's there, cancels the rest)");
    let (ioc, ioc_trades) = engine.submit_order("AAPL", OrderType::Ioc, Side::Buy, dec!(1000), Some(dec!(150.00)));
    println!("IOC status: {:?}, filled: {}", ioc.status, ioc.filled_quantity);
    let _ = ioc_trades;

    println!("Submitting FOK order: 1000 @ 150.00 (kills instantly, insufficient liquidity)");
    let (fok, fok_trades) = engine.submit_order("AAPL", OrderType::Fok, Side::Buy, dec!(1000), Some(dec!(150.00)));
    println!("FOK status: {:?}, trades: {}", fok.status, fok_trades.len());

    let bbo = engine.bbo("AAPL").unwrap();
    println!("Final best bid: {:?}", bbo.best_bid);
    println!("Final best offer: {:?}", bbo.best_offer);
}
