//! # relay-rs
//!
//! A publish/subscribe text message relay: publishers tag messages with a
//! channel name, and every subscriber holding a streaming connection to
//! that channel receives them while connected.
//!
//! The crate provides:
//! - [`registry::ChannelRegistry`]: the concurrency-safe subscription
//!   registry and fan-out core
//! - [`server::RelayServer`]: a TCP server speaking a newline-delimited
//!   text protocol, with an application [`server::RelayHandler`] seam
//! - [`client::RelayPublisher`] and [`client::RelaySubscriber`]: small
//!   clients for the same protocol
//!
//! Delivery is best-effort. Each subscriber owns a bounded mailbox; a
//! publish enqueues without blocking and drops the message for any
//! subscriber whose mailbox is full, so slow consumers never slow
//! publishers or each other. There is no persistence and no replay for
//! late joiners.
//!
//! # Server example
//!
//! ```no_run
//! use relay_rs::{DefaultHandler, RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> relay_rs::Result<()> {
//!     let config = ServerConfig::default();
//!     let server = RelayServer::new(config, DefaultHandler);
//!     server.run().await
//! }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use registry::{
    ChannelRegistry, Message, PublishOutcome, RegistryConfig, RegistryStats, Subscription,
};
pub use server::{AuthResult, DefaultHandler, RelayHandler, RelayServer, ServerConfig};
