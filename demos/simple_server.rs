//! Simple relay server example
//!
//! Run with: cargo run --example simple_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_server                    # binds to 0.0.0.0:7878
//!   cargo run --example simple_server localhost          # binds to 127.0.0.1:7878
//!   cargo run --example simple_server 127.0.0.1:7879     # binds to 127.0.0.1:7879
//!
//! Set RELAY_AUTH_TOKEN to require a token for publishing.
//!
//! ## Talking to it
//!
//! With netcat:
//!   nc localhost 7878
//!   SUBSCRIBE news            # this connection now streams messages
//!
//!   nc localhost 7878
//!   PUBLISH news hello world  # every subscriber of "news" receives it
//!   STATS
//!   QUIT

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use relay_rs::session::SessionContext;
use relay_rs::{AuthResult, RelayHandler, RelayServer, ServerConfig};

/// Handler that logs events and counts traffic
struct LoggingHandler {
    connections: AtomicU64,
    published: AtomicU64,
}

impl LoggingHandler {
    fn new() -> Self {
        Self {
            connections: AtomicU64::new(0),
            published: AtomicU64::new(0),
        }
    }
}

impl RelayHandler for LoggingHandler {
    async fn on_connection(&self, ctx: &SessionContext) -> bool {
        self.connections.fetch_add(1, Ordering::Relaxed);
        println!("[{}] New connection from {}", ctx.session_id, ctx.peer_addr);
        true
    }

    async fn on_publish(&self, ctx: &SessionContext, channel: &str, text: &str) -> AuthResult {
        self.published.fetch_add(1, Ordering::Relaxed);
        println!(
            "[{}] Publish to '{}': {} chars",
            ctx.session_id,
            channel,
            text.len()
        );
        AuthResult::Accept
    }

    async fn on_subscribe(&self, ctx: &SessionContext, channel: &str) -> AuthResult {
        println!("[{}] Subscribe to '{}'", ctx.session_id, channel);
        AuthResult::Accept
    }

    async fn on_disconnect(&self, ctx: &SessionContext) {
        println!(
            "[{}] Disconnected after {:?} ({} delivered, {} published)",
            ctx.session_id,
            ctx.stats.duration,
            ctx.stats.messages_delivered,
            ctx.stats.messages_published,
        );
    }
}

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:7878
/// - "localhost:7879" -> 127.0.0.1:7879
/// - "127.0.0.1" -> 127.0.0.1:7878
/// - "0.0.0.0:7878" -> 0.0.0.0:7878
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 7878;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: simple_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:7878)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:7878".parse().unwrap(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relay_rs=debug".parse()?),
        )
        .init();

    let config = ServerConfig {
        bind_addr,
        ..ServerConfig::default()
    };

    println!("Starting relay server on {}", config.bind_addr);
    if config.auth_token.is_some() {
        println!("Publishing requires AUTH (token from RELAY_AUTH_TOKEN)");
    }
    println!();
    println!("=== Subscribe ===");
    println!("nc localhost {} then: SUBSCRIBE news", config.bind_addr.port());
    println!();
    println!("=== Publish ===");
    println!(
        "nc localhost {} then: PUBLISH news hello world",
        config.bind_addr.port()
    );
    println!();

    let server = Arc::new(RelayServer::new(config, LoggingHandler::new()));

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
