//! Per-connection session loop
//!
//! Each accepted connection runs one `Connection`. The session starts in
//! command mode, reading one request line at a time. `SUBSCRIBE` switches
//! it into delivery mode: a race between the subscriber mailbox and the
//! socket, where the first disconnect signal wins and unregisters the slot
//! as the single cleanup action.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;

use crate::error::Result;
use crate::protocol::{Command, Response};
use crate::registry::{ChannelRegistry, Subscription};
use crate::server::config::ServerConfig;
use crate::server::handler::{AuthResult, RelayHandler};
use crate::session::{SessionContext, SessionState};

/// How a delivery loop ended
#[derive(Debug, PartialEq, Eq)]
enum DeliveryEnd {
    /// Client unsubscribed; the session resumes command mode
    Resumed,
    /// Transport is gone or the client quit
    Disconnected,
}

/// One relay connection
pub struct Connection<S, H> {
    state: SessionState,
    config: ServerConfig,
    handler: Arc<H>,
    registry: Arc<ChannelRegistry>,
    stream: S,
}

impl<S, H> Connection<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    H: RelayHandler,
{
    /// Create a new connection
    pub fn new(
        session_id: u64,
        stream: S,
        peer_addr: SocketAddr,
        config: ServerConfig,
        handler: Arc<H>,
        registry: Arc<ChannelRegistry>,
    ) -> Self {
        Self {
            state: SessionState::new(session_id, peer_addr),
            config,
            handler,
            registry,
            stream,
        }
    }

    /// Drive the connection until the peer disconnects or quits
    pub async fn run(self) -> Result<()> {
        let Connection {
            mut state,
            config,
            handler,
            registry,
            stream,
        } = self;

        let (read_half, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);

        let ctx = SessionContext::from(&state);
        if !handler.on_connection(&ctx).await {
            tracing::debug!(session_id = state.id, "Connection refused by handler");
            return Ok(());
        }
        state.activate();

        let mut line = String::new();
        loop {
            line.clear();
            let read = if config.idle_timeout.is_zero() {
                reader.read_line(&mut line).await
            } else {
                match timeout(config.idle_timeout, reader.read_line(&mut line)).await {
                    Ok(read) => read,
                    Err(_) => {
                        tracing::debug!(session_id = state.id, "Command idle timeout");
                        break;
                    }
                }
            };
            match read {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(session_id = state.id, error = %e, "Read failed");
                    break;
                }
            }
            state.lines_received += 1;
            if line.trim().is_empty() {
                continue;
            }

            let cmd = match Command::parse(&line) {
                Ok(cmd) => cmd,
                Err(e) => {
                    write_line(&mut writer, &Response::Err(e.to_string()).to_string()).await?;
                    continue;
                }
            };

            match cmd {
                Command::Ping => {
                    write_line(&mut writer, &Response::Pong.to_string()).await?;
                }
                Command::Stats => {
                    let stats = registry.stats().await;
                    let detail = format!(
                        "channels={} subscribers={} published={}",
                        stats.channels, stats.subscribers, stats.published
                    );
                    write_line(&mut writer, &Response::Ok(detail).to_string()).await?;
                }
                Command::Auth { token } => {
                    let response = handle_auth(&mut state, &config, &token);
                    write_line(&mut writer, &response.to_string()).await?;
                }
                Command::Publish { channel, text } => {
                    let response = handle_publish(
                        &mut state,
                        &config,
                        handler.as_ref(),
                        &registry,
                        &channel,
                        &text,
                    )
                    .await;
                    write_line(&mut writer, &response.to_string()).await?;
                }
                Command::Subscribe { channel } => {
                    let ctx = SessionContext::from(&state);
                    if let AuthResult::Reject(reason) = handler.on_subscribe(&ctx, &channel).await
                    {
                        write_line(&mut writer, &Response::Err(reason).to_string()).await?;
                        continue;
                    }

                    let mut sub = match registry.subscribe(&channel).await {
                        Ok(sub) => sub,
                        Err(e) => {
                            write_line(&mut writer, &Response::Err(e.to_string()).to_string())
                                .await?;
                            continue;
                        }
                    };

                    // If the greeting cannot be written the transport is
                    // already gone; take the slot back out before it can
                    // accumulate messages.
                    let greeting = Response::Ok(format!("subscribed {}", channel));
                    if let Err(e) = write_line(&mut writer, &greeting.to_string()).await {
                        registry.unsubscribe(&channel, sub.id()).await;
                        return Err(e.into());
                    }

                    state.start_delivery(Arc::from(channel.as_str()));
                    tracing::debug!(
                        session_id = state.id,
                        channel = %channel,
                        "Delivery started"
                    );

                    let end =
                        deliver(&mut state, &mut reader, &mut writer, &registry, &mut sub).await;
                    state.stop_delivery();

                    match end {
                        DeliveryEnd::Resumed => {
                            write_line(
                                &mut writer,
                                &Response::Ok("unsubscribed".into()).to_string(),
                            )
                            .await?;
                        }
                        DeliveryEnd::Disconnected => break,
                    }
                }
                Command::Unsubscribe => {
                    write_line(&mut writer, &Response::Err("not subscribed".into()).to_string())
                        .await?;
                }
                Command::Quit => {
                    let _ = write_line(&mut writer, &Response::Ok("bye".into()).to_string()).await;
                    break;
                }
            }
        }

        state.close();
        let ctx = SessionContext::from(&state);
        handler.on_disconnect(&ctx).await;
        state.finish();

        tracing::debug!(
            session_id = state.id,
            lines = state.lines_received,
            delivered = state.messages_delivered,
            published = state.messages_published,
            "Session closed"
        );
        Ok(())
    }
}

fn handle_auth(state: &mut SessionState, config: &ServerConfig, token: &str) -> Response {
    match config.auth_token.as_deref() {
        Some(expected) if expected == token => {
            state.authorize();
            Response::Ok("authenticated".into())
        }
        Some(_) => {
            tracing::warn!(
                session_id = state.id,
                peer = %state.peer_addr,
                "Rejected auth attempt"
            );
            Response::Err("unauthorized".into())
        }
        // No token configured, the gate is open
        None => {
            state.authorize();
            Response::Ok("authenticated".into())
        }
    }
}

async fn handle_publish<H: RelayHandler>(
    state: &mut SessionState,
    config: &ServerConfig,
    handler: &H,
    registry: &ChannelRegistry,
    channel: &str,
    text: &str,
) -> Response {
    if config.auth_token.is_some() && !state.authorized {
        return Response::Err("unauthorized".into());
    }

    let ctx = SessionContext::from(&*state);
    match handler.on_publish(&ctx, channel, text).await {
        AuthResult::Reject(reason) => Response::Err(reason),
        AuthResult::Accept => match registry.publish(channel, text).await {
            Ok(outcome) => {
                state.messages_published += 1;
                state.messages_dropped += outcome.dropped as u64;
                Response::Ok("published".into())
            }
            Err(e) => Response::Err(e.to_string()),
        },
    }
}

/// Stream messages to the peer until it unsubscribes or disconnects.
///
/// Races the subscriber mailbox against the socket's read side. Whichever
/// signal arrives first decides the transition; no message is written after
/// that. Unregistering the slot is the loop's one cleanup action and is
/// idempotent against a concurrent removal.
async fn deliver<R, W>(
    state: &mut SessionState,
    reader: &mut BufReader<R>,
    writer: &mut W,
    registry: &ChannelRegistry,
    sub: &mut Subscription,
) -> DeliveryEnd
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let channel = sub.channel().to_string();
    let id = sub.id();

    // Reused across select iterations so a cancelled partial read keeps
    // its bytes for the next attempt.
    let mut buf = String::new();
    let end;

    loop {
        tokio::select! {
            maybe = sub.recv() => match maybe {
                Some(msg) => {
                    if write_line(writer, &msg.render_line()).await.is_err() {
                        // A failed transport write means the subscriber is gone
                        end = DeliveryEnd::Disconnected;
                        break;
                    }
                    state.messages_delivered += 1;
                }
                None => {
                    // Slot was closed elsewhere; drop back to command mode
                    end = DeliveryEnd::Resumed;
                    break;
                }
            },
            read = reader.read_line(&mut buf) => match read {
                Ok(0) | Err(_) => {
                    end = DeliveryEnd::Disconnected;
                    break;
                }
                Ok(_) => {
                    state.lines_received += 1;
                    if buf.trim().is_empty() {
                        buf.clear();
                        continue;
                    }
                    let parsed = Command::parse(&buf);
                    buf.clear();
                    match parsed {
                        Ok(Command::Unsubscribe) => {
                            end = DeliveryEnd::Resumed;
                            break;
                        }
                        Ok(Command::Quit) => {
                            end = DeliveryEnd::Disconnected;
                            break;
                        }
                        _ => {
                            let refusal = Response::Err("subscribed; UNSUBSCRIBE first".into());
                            if write_line(writer, &refusal.to_string()).await.is_err() {
                                end = DeliveryEnd::Disconnected;
                                break;
                            }
                        }
                    }
                }
            },
        }
    }

    registry.unsubscribe(&channel, id).await;
    tracing::debug!(
        session_id = state.id,
        channel = %channel,
        delivered = state.messages_delivered,
        "Delivery ended"
    );
    end
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await
}
