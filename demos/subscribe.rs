//! Subscribe to a relay channel and print every message
//!
//! Run with: cargo run --example subscribe -- <ADDR> <CHANNEL>
//!
//! Example:
//!   cargo run --example subscribe -- localhost:7878 news

use relay_rs::client::{ClientConfig, RelaySubscriber, SubscriberEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: subscribe <ADDR> <CHANNEL>");
        std::process::exit(1);
    }

    let addr = &args[1];
    let channel = &args[2];

    let (mut subscriber, mut events) = RelaySubscriber::new(ClientConfig::new(addr));
    subscriber.subscribe(channel).await?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SubscriberEvent::Subscribed(channel)) => {
                    println!("Subscribed to '{}'", channel);
                }
                Some(SubscriberEvent::Message(line)) => {
                    println!("{}", line);
                }
                Some(SubscriberEvent::Disconnected) | None => {
                    println!("Server closed the stream");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                subscriber.disconnect().await;
                break;
            }
        }
    }

    Ok(())
}
