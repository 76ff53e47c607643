//! Relay server
//!
//! TCP server speaking the line protocol: an accept loop, one spawned task
//! per connection, and an application handler hooked in at connection and
//! request boundaries.

pub mod config;
pub mod connection;
pub mod handler;
pub mod listener;

pub use config::ServerConfig;
pub use connection::Connection;
pub use handler::{AuthResult, DefaultHandler, RelayHandler};
pub use listener::RelayServer;
