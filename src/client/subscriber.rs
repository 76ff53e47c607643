//! Relay channel subscriber
//!
//! Holds a streaming connection to one channel and forwards every delivered
//! line as an event.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::{Command, Response};

use super::config::ClientConfig;

/// Events from the relay subscriber
#[derive(Debug)]
pub enum SubscriberEvent {
    /// Subscription was accepted by the server
    Subscribed(String),

    /// One delivered message line, `<text> [<timestamp>]`
    Message(String),

    /// Server closed the stream
    Disconnected,
}

/// Relay subscriber client
///
/// # Example
/// ```no_run
/// use relay_rs::client::{ClientConfig, RelaySubscriber, SubscriberEvent};
///
/// # async fn example() -> relay_rs::error::Result<()> {
/// let config = ClientConfig::new("localhost:7878");
/// let (mut subscriber, mut events) = RelaySubscriber::new(config);
///
/// subscriber.subscribe("news").await?;
/// while let Some(event) = events.recv().await {
///     if let SubscriberEvent::Message(line) = event {
///         println!("{}", line);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct RelaySubscriber {
    config: ClientConfig,
    event_tx: mpsc::Sender<SubscriberEvent>,
    writer: Option<OwnedWriteHalf>,
}

impl RelaySubscriber {
    /// Create a new subscriber.
    ///
    /// Returns the subscriber and a receiver for events.
    pub fn new(config: ClientConfig) -> (Self, mpsc::Receiver<SubscriberEvent>) {
        let (tx, rx) = mpsc::channel(256);

        let subscriber = Self {
            config,
            event_tx: tx,
            writer: None,
        };

        (subscriber, rx)
    }

    /// Connect and subscribe to a channel.
    ///
    /// After this returns successfully, delivered messages arrive on the
    /// event receiver until the connection ends.
    pub async fn subscribe(&mut self, channel: &str) -> Result<()> {
        let stream = TcpStream::connect(&self.config.addr).await?;
        let (read_half, mut writer) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let cmd = Command::Subscribe {
            channel: channel.to_string(),
        };
        writer.write_all(cmd.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;

        // The server acknowledges before any message can arrive
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(Error::TransportUnavailable);
        }
        match Response::parse(&line)? {
            Response::Ok(_) => {}
            Response::Err(reason) => return Err(Error::Rejected(reason)),
            Response::Pong => {
                return Err(crate::error::ProtocolError::UnexpectedResponse("+PONG".into()).into())
            }
        }

        let _ = self
            .event_tx
            .send(SubscriberEvent::Subscribed(channel.to_string()))
            .await;

        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => {
                        let _ = event_tx.send(SubscriberEvent::Disconnected).await;
                        break;
                    }
                    Ok(_) => {
                        let event = SubscriberEvent::Message(line.trim_end().to_string());
                        if event_tx.send(event).await.is_err() {
                            // Nobody is listening anymore
                            break;
                        }
                    }
                }
            }
        });

        self.writer = Some(writer);
        Ok(())
    }

    /// Close the streaming connection.
    ///
    /// The server treats the closed socket as a disconnect and unregisters
    /// the subscription.
    pub async fn disconnect(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.shutdown().await;
        }
    }
}
