use clap::{Parser, Subcommand};
use orderbook::{Bbo, DepthSnapshot, Order, OrderType, Side, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "hftx-cli")]
#[command(about = "HFT Ledger CLI - Command line client for the exchange")]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    server: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an order of any supported type.
    Submit {
        #[arg(short = 's', long)]
        symbol: String,
        #[arg(short = 't', long, value_parser = parse_order_type, default_value = "limit")]
        order_type: OrderType,
        #[arg(long, value_parser = parse_side)]
        side: Side,
        #[arg(short = 'q', long)]
        quantity: Decimal,
        /// Required for every order type except market.
        #[arg(short = 'p', long)]
        price: Option<Decimal>,
    },
    /// Show BBO for one symbol, or every known symbol.
    Status {
        #[arg(short, long)]
        symbol: Option<String>,
    },
    Health,
    Symbols,
    Depth {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long, default_value = "10")]
        levels: usize,
    },
    Cancel {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        order_id: String,
    },
}

#[derive(Serialize)]
struct SubmitOrderRequest {
    order_type: OrderType,
    side: Side,
    quantity: Decimal,
    price: Option<Decimal>,
}

#[derive(Deserialize)]
struct SubmitOrderResponse {
    order: Order,
    trades: Vec<Trade>,
}

#[derive(Deserialize)]
struct CancelResponse {
    order: Order,
}

#[derive(Deserialize)]
struct SymbolsResponse {
    symbols: Vec<String>,
}

fn parse_side(s: &str) -> Result<Side, String> {
    match s.to_lowercase().as_str() {
        "buy" | "bid" => Ok(Side::Buy),
        "sell" | "ask" => Ok(Side::Sell),
        _ => Err(format!("invalid side: {}. use 'buy' or 'sell'", s)),
    }
}

fn parse_order_type(s: &str) -> Result<OrderType, String> {
    match s.to_lowercase().as_str() {
        "market" => Ok(OrderType::Market),
        "limit" => Ok(OrderType::Limit),
        "ioc" => Ok(OrderType::Ioc),
        "fok" => Ok(OrderType::Fok),
        _ => Err(format!("invalid order type: {}. use market/limit/ioc/fok", s)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Submit { symbol, order_type, side, quantity, price } => {
            let request = SubmitOrderRequest { order_type, side, quantity, price };

            let response = client
                .post(format!("{}/symbols/{}/orders", cli.server, symbol))
                .json(&request)
                .send()
                .await?;

            if response.status().is_success() || response.status().as_u16() == 422 {
                let result: SubmitOrderResponse = response.json().await?;
                println!("Order ID: {}", result.order.order_id);
                println!("Status: {:?}", result.order.status);
                println!("Filled: {} / {}", result.order.filled_quantity, result.order.quantity);

                if !result.trades.is_empty() {
                    println!("Trades executed: {}", result.trades.len());
                    for trade in result.trades {
                        println!("  {} @ {}", trade.quantity, trade.price);
                    }
                }
            } else {
                println!("Error: {}", response.status());
                println!("{}", response.text().await?);
            }
        }

        Commands::Status { symbol } => match symbol {
            Some(symbol) => print_bbo(&client, &cli.server, &symbol).await?,
            None => {
                let response = client.get(format!("{}/symbols", cli.server)).send().await?;
                if response.status().is_success() {
                    let symbols: SymbolsResponse = response.json().await?;
                    for symbol in symbols.symbols {
                        print_bbo(&client, &cli.server, &symbol).await?;
                    }
                } else {
                    println!("Error: {}", response.status());
                }
            }
        },

        Commands::Health => {
            let response = client.get(format!("{}/health", cli.server)).send().await?;
            if response.status().is_success() {
                let health: serde_json::Value = response.json().await?;
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                println!("Error: {}", response.status());
            }
        }

        Commands::Symbols => {
            let response = client.get(format!("{}/symbols", cli.server)).send().await?;
            if response.status().is_success() {
                let symbols: SymbolsResponse = response.json().await?;
                for symbol in symbols.symbols {
                    println!("{}", symbol);
                }
            } else {
                println!("Error: {}", response.status());
            }
        }

        Commands::Depth { symbol, levels } => {
            let response = client
                .get(format!("{}/symbols/{}/depth?levels={}", cli.server, symbol, levels))
                .send()
                .await?;

            if response.status().is_success() {
                let depth: DepthSnapshot = response.json().await?;
                println!("Market Depth for {}", depth.symbol);
                println!("\nAsks:");
                for (i, level) in depth.asks.iter().enumerate() {
                    println!("  {}: {} @ {}", i + 1, level.quantity, level.price);
                }
                println!("\nBids:");
                for (i, level) in depth.bids.iter().enumerate() {
                    println!("  {}: {} @ {}", i + 1, level.quantity, level.price);
                }
            } else {
                println!("Error: {}", response.status());
            }
        }

        Commands::Cancel { symbol, order_id } => {
            let response = client
                .delete(format!("{}/symbols/{}/orders/{}", cli.server, symbol, order_id))
                .send()
                .await?;

            if response.status().is_success() {
                let result: CancelResponse = response.json().await?;
                println!("Cancelled order {} (status {:?})", result.order.order_id, result.order.status);
            } else {
                println!("Error: {}", response.status());
                println!("{}", response.text().await?);
            }
        }
    }

    Ok(())
}

async fn print_bbo(client: &reqwest::Client, server: &str, symbol: &str) -> Result<(), Box<dyn std::error::Error>> {
    let response = client.get(format!("{}/symbols/{}/bbo", server, symbol)).send().await?;
    if response.status().is_success() {
        let bbo: Bbo = response.json().await?;
        println!(
            "{}: bid={:?} ({:?}) offer={:?} ({:?})",
            bbo.symbol, bbo.best_bid, bbo.bid_quantity, bbo.best_offer, bbo.offer_quantity
        );
    } else {
        println!("Error fetching {}: {}", symbol, response.status());
    }
    Ok(())
}
