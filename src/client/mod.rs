//! Relay client implementation
//!
//! Provides client-side access to a relay server:
//! - Publishing messages to channels
//! - Subscribing to a channel and receiving its message stream

pub mod config;
pub mod publisher;
pub mod subscriber;

pub use config::ClientConfig;
pub use publisher::RelayPublisher;
pub use subscriber::{RelaySubscriber, SubscriberEvent};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::protocol::{Command, Response};

/// One established request/response connection
pub(crate) struct ClientConn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ClientConn {
    /// Connect to the server
    pub(crate) async fn open(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
        })
    }

    /// Send one command line
    pub(crate) async fn send(&mut self, cmd: &Command) -> Result<()> {
        self.writer.write_all(cmd.to_string().as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    /// Read one response line
    pub(crate) async fn read_response(&mut self) -> Result<Response> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        Ok(Response::parse(&line)?)
    }

    /// Send a command and wait for its response
    pub(crate) async fn request(&mut self, cmd: &Command) -> Result<Response> {
        self.send(cmd).await?;
        self.read_response().await
    }
}
