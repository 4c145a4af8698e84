//! OrderLink Terminal Daemon
//!
//! Runs one terminal's sync agent: connects to the relay hub, keeps the
//! local order ledger in step with the other terminals, and offers a small
//! line-oriented operator console (the register/kitchen UI proper is a
//! separate concern and talks to the agent through the library API).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ol_core::config::{self, TerminalConfig};
use ol_core::store::FileStore;
use ol_protocol::{Order, OrderId, OrderLineItem, OrderStatus, SyncEvent};
use ol_terminal::{
    ConnectionMonitor, EventBus, EventSink, HubConnector, Ledger, LinkStatus, RetryPolicy,
    SyncAgent,
};

#[derive(Parser)]
#[command(name = "ol-terminal")]
#[command(about = "OrderLink terminal - syncs a local order ledger through the relay hub")]
#[command(version)]
struct Args {
    /// Hub address to connect to (host:port)
    #[arg(long)]
    hub: Option<String>,

    /// Terminal name (defaults to hostname)
    #[arg(long)]
    name: Option<String>,

    /// Directory for the local order ledger
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config::default_config_dir().join("terminal.toml"));

    let mut terminal_config = if config_path.exists() {
        config::load_config(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {:?}: {}", config_path, e);
            TerminalConfig::default()
        })
    } else {
        TerminalConfig::default()
    };

    // Apply command-line overrides
    if let Some(hub) = args.hub {
        terminal_config.hub_address = hub;
    }
    if let Some(name) = args.name {
        terminal_config.terminal_name = Some(name);
    }
    if let Some(data_dir) = args.data_dir {
        terminal_config.data_dir = data_dir;
    }

    tracing::info!(
        "Terminal '{}' starting (ledger at {:?})",
        terminal_config.terminal_name(),
        terminal_config.data_dir
    );

    // Local ledger over the on-disk store
    let store = FileStore::open(&terminal_config.data_dir)
        .with_context(|| format!("Failed to open data dir {:?}", terminal_config.data_dir))?;
    let ledger = Ledger::new(Box::new(store));

    let cancel = CancellationToken::new();
    let status = Arc::new(LinkStatus::new());
    let bus = Arc::new(EventBus::new());

    // Connect to the hub with a bounded retry budget; when that runs out
    // the terminal keeps working offline against its own ledger.
    let connector = HubConnector::new(terminal_config.clone(), Arc::clone(&status));
    let link = match connector
        .connect_with_retry(RetryPolicy::from_config(&terminal_config.retry))
        .await
    {
        Ok(link) => Some(link),
        Err(e) => {
            tracing::warn!("Starting in offline mode: {}", e);
            None
        }
    };

    let sink: Box<dyn EventSink> = match &link {
        Some(link) => Box::new(link.sender()),
        None => {
            // No transport: emissions become logged no-ops
            let (tx, _rx) = mpsc::channel::<SyncEvent>(1);
            Box::new(tx)
        }
    };

    let agent = Arc::new(SyncAgent::new(ledger, sink, Arc::clone(&bus)));

    // Surface connection status to the operator
    let monitor = ConnectionMonitor::new(
        Arc::clone(&status),
        terminal_config.poll_interval,
        Arc::clone(&bus),
    );
    let (_status_rx, monitor_handle) = monitor.spawn(cancel.clone());

    // Drive inbound events into the agent
    let link_handle = link.map(|link| {
        let agent = Arc::clone(&agent);
        let cancel = cancel.clone();
        tokio::spawn(agent.run(link, cancel))
    });

    // Setup signal handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, shutting down...");
            cancel_clone.cancel();
        }
    });

    run_console(&agent, &status, &cancel).await;

    cancel.cancel();
    monitor_handle.await.ok();
    if let Some(handle) = link_handle {
        handle.await.ok();
    }

    tracing::info!("Terminal shutdown complete");
    Ok(())
}

/// Line-oriented operator console
async fn run_console(agent: &Arc<SyncAgent>, status: &Arc<LinkStatus>, cancel: &CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            _ => break,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => {}
            ["order", rest @ ..] => handle_order(agent, rest),
            ["start", id] => handle_status(agent, id, OrderStatus::InProgress),
            ["done", id] => handle_status(agent, id, OrderStatus::Completed),
            ["cancel", id] => match parse_id(id) {
                Some(id) => match agent.cancel_order(id) {
                    Ok(()) => println!("Cancelled order {}", id),
                    Err(e) => println!("Cannot cancel: {}", e),
                },
                None => println!("Invalid order id: {}", id),
            },
            ["list"] => print_orders("Active orders", &agent.active_orders()),
            ["history"] => print_orders("Order history", &agent.order_history()),
            ["status"] => {
                let snapshot = status.snapshot();
                if snapshot.connected {
                    println!("Connected ({} terminals online)", snapshot.peer_count);
                } else {
                    println!("Disconnected - working offline");
                }
            }
            ["clear"] => {
                agent.clear_history();
                println!("Local order history cleared");
            }
            ["help"] => print_help(),
            ["quit"] | ["exit"] => break,
            _ => println!("Unknown command (try 'help')"),
        }
    }
}

/// `order <name> <qty> <unit_price> [<name> <qty> <unit_price> ...]`
fn handle_order(agent: &SyncAgent, fields: &[&str]) {
    if fields.is_empty() || fields.len() % 3 != 0 {
        println!("Usage: order <name> <qty> <unit_price> ...");
        return;
    }

    let mut items = Vec::new();
    for chunk in fields.chunks(3) {
        let (name, qty, price) = (chunk[0], chunk[1], chunk[2]);
        let quantity: u32 = match qty.parse() {
            Ok(q) if q > 0 => q,
            _ => {
                println!("Invalid quantity: {}", qty);
                return;
            }
        };
        let unit_price: u64 = match price.parse() {
            Ok(p) => p,
            Err(_) => {
                println!("Invalid price: {}", price);
                return;
            }
        };
        items.push(OrderLineItem::new(
            name.to_lowercase(),
            name,
            quantity,
            unit_price,
        ));
    }

    match agent.create_order(items) {
        Ok(order) => println!("Created order {} (total {})", order.id, order.total_price),
        Err(e) => println!("Order not created: {}", e),
    }
}

fn handle_status(agent: &SyncAgent, id: &str, target: OrderStatus) {
    match parse_id(id) {
        Some(id) => match agent.set_order_status(id, target) {
            Ok(order) => println!("Order {} is now {}", order.id, order.status),
            Err(e) => println!("Cannot update: {}", e),
        },
        None => println!("Invalid order id: {}", id),
    }
}

fn parse_id(field: &str) -> Option<OrderId> {
    field.parse::<u64>().ok().map(OrderId::new)
}

fn print_orders(heading: &str, orders: &[Order]) {
    println!("{} ({}):", heading, orders.len());
    for order in orders {
        let items: Vec<String> = order
            .items
            .iter()
            .map(|i| format!("{}x {}", i.quantity, i.name))
            .collect();
        println!(
            "  #{} [{}] {} = {}",
            order.id,
            order.status,
            items.join(", "),
            order.total_price
        );
    }
}

fn print_help() {
    println!("Commands:");
    println!("  order <name> <qty> <unit_price> ...   create an order");
    println!("  start <id>                            mark in progress");
    println!("  done <id>                             mark completed");
    println!("  cancel <id>                           cancel an order");
    println!("  list | history | status | clear | help | quit");
}
