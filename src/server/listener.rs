//! Relay server listener
//!
//! Handles the TCP accept loop and spawns connection handlers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::registry::ChannelRegistry;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::server::handler::RelayHandler;
use crate::stats::ServerStats;

/// Relay server
pub struct RelayServer<H: RelayHandler> {
    config: ServerConfig,
    handler: Arc<H>,
    registry: Arc<ChannelRegistry>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
    total_connections: AtomicU64,
    active_connections: Arc<AtomicU64>,
    started_at: Instant,
}

impl<H: RelayHandler> RelayServer<H> {
    /// Create a new server with the given configuration and handler
    pub fn new(config: ServerConfig, handler: H) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };
        let registry = Arc::new(ChannelRegistry::with_config(config.registry.clone()));

        Self {
            config,
            handler: Arc::new(handler),
            registry,
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
            total_connections: AtomicU64::new(0),
            active_connections: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    /// Get a reference to the channel registry
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Server-wide connection counters
    pub fn stats(&self) -> ServerStats {
        ServerStats {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Relay server listening");

        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Relay server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let config = self.config.clone();
        let handler = Arc::clone(&self.handler);
        let registry = Arc::clone(&self.registry);
        let active = Arc::clone(&self.active_connections);

        tokio::spawn(async move {
            // Held for the lifetime of the connection task
            let _permit = permit;
            active.fetch_add(1, Ordering::Relaxed);

            let connection =
                Connection::new(session_id, socket, peer_addr, config, handler, registry);
            if let Err(e) = connection.run().await {
                tracing::debug!(
                    session_id = session_id,
                    error = %e,
                    "Connection error"
                );
            }

            active.fetch_sub(1, Ordering::Relaxed);
            tracing::debug!(session_id = session_id, "Connection closed");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::client::{ClientConfig, RelayPublisher, RelaySubscriber, SubscriberEvent};
    use crate::server::handler::DefaultHandler;

    async fn start_server(config: ServerConfig) -> (Arc<RelayServer<DefaultHandler>>, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Arc::new(RelayServer::new(config.bind(addr), DefaultHandler));

        let accept = Arc::clone(&server);
        tokio::spawn(async move {
            let _ = accept.accept_loop(&listener).await;
        });

        (server, addr.to_string())
    }

    fn test_config() -> ServerConfig {
        ServerConfig::default().no_auth().idle_timeout(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_end_to_end_publish_subscribe() {
        let (server, addr) = start_server(test_config()).await;

        let (mut subscriber, mut events) = RelaySubscriber::new(ClientConfig::new(&addr));
        subscriber.subscribe("news").await.unwrap();
        assert!(matches!(
            events.recv().await,
            Some(SubscriberEvent::Subscribed(channel)) if channel == "news"
        ));

        let mut publisher = RelayPublisher::new(ClientConfig::new(&addr));
        publisher.connect().await.unwrap();
        publisher.publish("news", "hello").await.unwrap();

        match events.recv().await {
            Some(SubscriberEvent::Message(line)) => {
                assert!(line.starts_with("hello ["), "unexpected line: {}", line);
            }
            other => panic!("expected message, got {:?}", other),
        }

        let stats = publisher.stats().await.unwrap();
        assert_eq!(stats.channels, 1);
        assert_eq!(stats.subscribers, 1);
        assert_eq!(stats.published, 1);

        let registry_stats = server.registry().stats().await;
        assert_eq!(registry_stats.published, 1);
    }

    #[tokio::test]
    async fn test_auth_required_for_publish() {
        let (_server, addr) = start_server(test_config().auth_token("s3cret")).await;

        // Wrong token is refused at connect time
        let mut bad =
            RelayPublisher::new(ClientConfig::new(&addr).auth_token("wrong"));
        assert!(bad.connect().await.is_err());

        // No token: connect succeeds but publish is gated
        let mut anon = RelayPublisher::new(ClientConfig::new(&addr));
        anon.connect().await.unwrap();
        assert!(anon.publish("news", "x").await.is_err());

        let mut good =
            RelayPublisher::new(ClientConfig::new(&addr).auth_token("s3cret"));
        good.connect().await.unwrap();
        good.publish("news", "x").await.unwrap();
    }

    #[tokio::test]
    async fn test_departed_subscriber_misses_messages() {
        let (server, addr) = start_server(test_config()).await;

        let (mut stays, mut stay_events) = RelaySubscriber::new(ClientConfig::new(&addr));
        stays.subscribe("news").await.unwrap();
        let (mut leaves, mut leave_events) = RelaySubscriber::new(ClientConfig::new(&addr));
        leaves.subscribe("news").await.unwrap();

        assert!(stay_events.recv().await.is_some());
        assert!(leave_events.recv().await.is_some());

        leaves.disconnect().await;
        // Wait for the server to unregister the departed slot
        for _ in 0..50 {
            if server.registry().stats().await.subscribers == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(server.registry().stats().await.subscribers, 1);

        let mut publisher = RelayPublisher::new(ClientConfig::new(&addr));
        publisher.connect().await.unwrap();
        publisher.publish("news", "x").await.unwrap();

        match stay_events.recv().await {
            Some(SubscriberEvent::Message(line)) => assert!(line.starts_with("x [")),
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let (_server, addr) = start_server(test_config().max_connections(1)).await;

        let mut first = RelayPublisher::new(ClientConfig::new(&addr));
        first.connect().await.unwrap();
        first.ping().await.unwrap();

        // Second connection is dropped before any response
        let mut second = RelayPublisher::new(ClientConfig::new(&addr));
        let result = async {
            second.connect().await?;
            second.ping().await
        }
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_server_stats_counts_connections() {
        let (server, addr) = start_server(test_config()).await;

        let mut publisher = RelayPublisher::new(ClientConfig::new(&addr));
        publisher.connect().await.unwrap();
        publisher.ping().await.unwrap();

        assert_eq!(server.stats().total_connections, 1);
    }
}
