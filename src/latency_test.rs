//! Performance testing suite for the order book.
//!
//! Measures latency and throughput under various scenarios:
//! - Market data access, order submission, matching, cancellation
//! - Sustained throughput testing with mixed workloads
//! - Statistical analysis with multiple iterations

use orderbook::{MatchingEngine, OrderType, Side};
use rust_decimal::Decimal;
use std::time::Instant;

fn px(i: i64) -> Decimal {
    Decimal::from(i)
}

/// Runs complete latency test suite.
pub fn run_latency_tests() {
    println!("HFT Ledger - Real-time Latency Tests\n");

    test_market_data_latency();
    test_order_submission_latency();
    test_order_matching_latency();
    test_cancellation_latency();
}

/// Tests BBO lookup performance.
fn test_market_data_latency() {
    println!("Market Data Latency Test");

    let engine = MatchingEngine::new();
    for i in 0..100 {
        engine.submit_order("AAPL", OrderType::Limit, Side::Sell, Decimal::ONE_HUNDRED, Some(px(10000 + i)));
        engine.submit_order("AAPL", OrderType::Limit, Side::Buy, Decimal::ONE_HUNDRED, Some(px(9999 - i)));
    }

    let iterations = 1_000_000;

    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(engine.bbo("AAPL"));
    }
    let bbo_duration = start.elapsed();

    println!(
        "  BBO lookup: {:.2} ns/call\n",
        bbo_duration.as_nanos() as f64 / iterations as f64
    );
}

/// Tests order submission latency for non-crossing limit orders.
fn test_order_submission_latency() {
    println!("Order Submission Latency Test");

    let iterations = 10_000;
    let mut total_time = 0u128;

    for i in 0..iterations {
        let engine = MatchingEngine::new();
        let start = Instant::now();
        engine.submit_order("AAPL", OrderType::Limit, Side::Buy, Decimal::ONE_HUNDRED, Some(px(10000 - i)));
        total_time += start.elapsed().as_nanos();
    }

    let avg_latency = total_time as f64 / iterations as f64;
    println!("  Average order submission: {:.2} ns", avg_latency);
    println!("  Throughput: {:.0} orders/second\n", 1_000_000_000.0 / avg_latency);
}

/// Tests order matching latency for crossing orders spanning several levels.
fn test_order_matching_latency() {
    println!("Order Matching Latency Test");

    let iterations = 1_000;
    let mut total_setup_time = 0u128;
    let mut total_match_time = 0u128;

    for i in 0..iterations {
        let setup_start = Instant::now();
        let engine = MatchingEngine::new();
        for j in 0..10 {
            engine.submit_order("AAPL", OrderType::Limit, Side::Sell, Decimal::ONE_HUNDRED, Some(px(10000 + j)));
        }
        total_setup_time += setup_start.elapsed().as_nanos();

        let match_start = Instant::now();
        let (_, trades) = engine.submit_order("AAPL", OrderType::Limit, Side::Buy, Decimal::from(500), Some(px(10005)));
        total_match_time += match_start.elapsed().as_nanos();

        std::hint::black_box(&trades);
        std::hint::black_box(i);
    }

    println!("  Setup (10 resting orders): {:.2} ns", total_setup_time as f64 / iterations as f64);
    println!("  Crossing order execution: {:.2} ns", total_match_time as f64 / iterations as f64);
    println!(
        "  Total order-to-trade: {:.2} ns\n",
        (total_setup_time + total_match_time) as f64 / iterations as f64
    );
}

/// Tests eager cancellation latency: every resting order is removed the
/// instant it's cancelled, so there is no lazy-cancellation path left to
/// compare against.
fn test_cancellation_latency() {
    println!("Cancellation Latency Test");

    let iterations = 1_000;
    let orders_per_test = 100;
    let mut total_time = 0u128;

    for i in 0..iterations {
        let engine = MatchingEngine::new();
        let mut order_ids = Vec::with_capacity(orders_per_test);

        for _ in 0..orders_per_test {
            let (order, _) = engine.submit_order("AAPL", OrderType::Limit, Side::Buy, Decimal::ONE_HUNDRED, Some(px(10000)));
            order_ids.push(order.order_id);
        }

        let start = Instant::now();
        for (idx, order_id) in order_ids.into_iter().enumerate() {
            if idx % 2 == 0 {
                engine.cancel_order("AAPL", order_id);
            }
        }
        total_time += start.elapsed().as_nanos();
        std::hint::black_box(i);
    }

    println!(
        "  Eager removal: {:.2} ns per order\n",
        total_time as f64 / (iterations * orders_per_test / 2) as f64
    );
}

/// Runs sustained throughput test with mixed workload.
pub fn run_throughput_test() {
    run_throughput_test_for(std::time::Duration::from_secs(10), "10 seconds");
}

/// Runs 1-minute sustained throughput test with mixed workload.
pub fn run_throughput_test_1min() {
    run_throughput_test_for(std::time::Duration::from_secs(60), "60 seconds");
}

fn run_throughput_test_for(duration: std::time::Duration, label: &str) {
    println!("Sustained Throughput Test ({})", label);

    let engine = MatchingEngine::new();
    let mut order_id: u64 = 1;
    let mut orders_processed = 0u64;
    let mut trades_executed = 0u64;

    let start_time = Instant::now();

    while start_time.elapsed() < duration {
        match order_id % 4 {
            0 => {
                engine.submit_order(
                    "AAPL",
                    OrderType::Limit,
                    Side::Buy,
                    Decimal::ONE_HUNDRED,
                    Some(px(9999 - (order_id % 100) as i64)),
                );
            }
            1 => {
                engine.submit_order(
                    "AAPL",
                    OrderType::Limit,
                    Side::Sell,
                    Decimal::ONE_HUNDRED,
                    Some(px(10001 + (order_id % 100) as i64)),
                );
            }
            2 => {
                let (_, trades) =
                    engine.submit_order("AAPL", OrderType::Limit, Side::Buy, Decimal::from(50), Some(px(10001)));
                trades_executed += trades.len() as u64;
            }
            3 => {
                let (_, trades) =
                    engine.submit_order("AAPL", OrderType::Limit, Side::Sell, Decimal::from(50), Some(px(9999)));
                trades_executed += trades.len() as u64;
            }
            _ => unreachable!(),
        }

        order_id += 1;
        orders_processed += 1;

        if order_id % 100 == 0 {
            std::hint::black_box(engine.bbo("AAPL"));
        }
    }

    let elapsed = start_time.elapsed();
    let orders_per_sec = orders_processed as f64 / elapsed.as_secs_f64();
    let trades_per_sec = trades_executed as f64 / elapsed.as_secs_f64();

    println!("  Duration: {:.1} seconds", elapsed.as_secs_f64());
    println!("  Orders processed: {}", orders_processed);
    println!("  Trades executed: {}", trades_executed);
    println!("  Order throughput: {:.0} orders/second", orders_per_sec);
    println!("  Trade throughput: {:.0} trades/second", trades_per_sec);
    let bbo = engine.bbo("AAPL").unwrap();
    println!("  Final book state: bid={:?}, ask={:?}", bbo.best_bid, bbo.best_offer);
}
