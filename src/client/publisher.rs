//! Relay message publisher
//!
//! High-level API for publishing messages to a relay server.

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{Command, Response};
use crate::registry::RegistryStats;

use super::config::ClientConfig;
use super::ClientConn;

/// Relay publisher client
///
/// Connects to a relay server and publishes text messages over the line
/// protocol. Also exposes the server's liveness probe and stats line.
///
/// # Example
/// ```no_run
/// use relay_rs::client::{ClientConfig, RelayPublisher};
///
/// # async fn example() -> relay_rs::error::Result<()> {
/// let config = ClientConfig::new("localhost:7878").auth_token("s3cret");
/// let mut publisher = RelayPublisher::new(config);
///
/// publisher.connect().await?;
/// publisher.publish("news", "hello subscribers").await?;
/// # Ok(())
/// # }
/// ```
pub struct RelayPublisher {
    config: ClientConfig,
    conn: Option<ClientConn>,
}

impl RelayPublisher {
    /// Create a new publisher
    pub fn new(config: ClientConfig) -> Self {
        Self { config, conn: None }
    }

    /// Connect to the relay server.
    ///
    /// If the config carries an auth token it is presented immediately; a
    /// token the server refuses fails the whole connect.
    pub async fn connect(&mut self) -> Result<()> {
        let mut conn = ClientConn::open(&self.config.addr).await?;

        if let Some(token) = self.config.auth_token.clone() {
            match conn.request(&Command::Auth { token }).await? {
                Response::Ok(_) => {}
                Response::Err(_) => return Err(Error::Unauthorized),
                Response::Pong => {
                    return Err(ProtocolError::UnexpectedResponse("+PONG".into()).into())
                }
            }
        }

        self.conn = Some(conn);
        Ok(())
    }

    /// Publish a message to a channel
    pub async fn publish(&mut self, channel: &str, text: &str) -> Result<()> {
        let cmd = Command::Publish {
            channel: channel.to_string(),
            text: text.to_string(),
        };
        match self.conn_mut()?.request(&cmd).await? {
            Response::Ok(_) => Ok(()),
            Response::Err(reason) => Err(Error::Rejected(reason)),
            Response::Pong => Err(ProtocolError::UnexpectedResponse("+PONG".into()).into()),
        }
    }

    /// Probe server liveness
    pub async fn ping(&mut self) -> Result<()> {
        match self.conn_mut()?.request(&Command::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(ProtocolError::UnexpectedResponse(format!("{:?}", other)).into()),
        }
    }

    /// Fetch the server's registry counters
    pub async fn stats(&mut self) -> Result<RegistryStats> {
        match self.conn_mut()?.request(&Command::Stats).await? {
            Response::Ok(detail) => parse_stats(&detail),
            Response::Err(reason) => Err(Error::Rejected(reason)),
            Response::Pong => Err(ProtocolError::UnexpectedResponse("+PONG".into()).into()),
        }
    }

    /// Close the connection
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            let _ = conn.send(&Command::Quit).await;
        }
        Ok(())
    }

    fn conn_mut(&mut self) -> Result<&mut ClientConn> {
        self.conn
            .as_mut()
            .ok_or(Error::Protocol(ProtocolError::NotConnected))
    }
}

/// Parse a stats line of the form `channels=N subscribers=N published=N`
fn parse_stats(detail: &str) -> Result<RegistryStats> {
    let mut channels = None;
    let mut subscribers = None;
    let mut published = None;

    for pair in detail.split_whitespace() {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "channels" => channels = value.parse().ok(),
            "subscribers" => subscribers = value.parse().ok(),
            "published" => published = value.parse().ok(),
            _ => {}
        }
    }

    match (channels, subscribers, published) {
        (Some(channels), Some(subscribers), Some(published)) => Ok(RegistryStats {
            channels,
            subscribers,
            published,
        }),
        _ => Err(ProtocolError::UnexpectedResponse(detail.to_string()).into()),
    }
}
