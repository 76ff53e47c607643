//! Publish one message to a relay server
//!
//! Run with: cargo run --example publish -- <ADDR> <CHANNEL> <TEXT...>
//!
//! Example:
//!   cargo run --example publish -- localhost:7878 news hello world
//!
//! Set RELAY_AUTH_TOKEN if the server requires publish authorization.

use relay_rs::client::{ClientConfig, RelayPublisher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: publish <ADDR> <CHANNEL> <TEXT...>");
        std::process::exit(1);
    }

    let addr = &args[1];
    let channel = &args[2];
    let text = args[3..].join(" ");

    let mut config = ClientConfig::new(addr);
    if let Ok(token) = std::env::var("RELAY_AUTH_TOKEN") {
        config = config.auth_token(token);
    }

    let mut publisher = RelayPublisher::new(config);
    publisher.connect().await?;
    publisher.publish(channel, &text).await?;

    let stats = publisher.stats().await?;
    println!(
        "Published to '{}' (server: {} channels, {} subscribers, {} published)",
        channel, stats.channels, stats.subscribers, stats.published
    );

    publisher.disconnect().await?;
    Ok(())
}
