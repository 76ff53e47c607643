//! Statistics for relay sessions and the server
//!
//! Registry-wide counters live in `registry::RegistryStats`; these types
//! cover the per-connection and per-process views.

use std::time::Duration;

/// Session-level statistics
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Request lines read from the peer
    pub lines_received: u64,
    /// Messages accepted for publish on this connection
    pub messages_published: u64,
    /// Messages written to the peer while subscribed
    pub messages_delivered: u64,
    /// Messages this connection's publishes dropped on full mailboxes
    pub messages_dropped: u64,
    /// Connection duration
    pub duration: Duration,
}

impl SessionStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }
}

/// Server-wide statistics
#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    /// Total connections ever
    pub total_connections: u64,
    /// Current active connections
    pub active_connections: u64,
    /// Uptime
    pub uptime: Duration,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_stats_new() {
        let stats = SessionStats::new();
        assert_eq!(stats.lines_received, 0);
        assert_eq!(stats.messages_published, 0);
        assert_eq!(stats.messages_delivered, 0);
        assert_eq!(stats.messages_dropped, 0);
        assert_eq!(stats.duration, Duration::ZERO);
    }

    #[test]
    fn test_server_stats_new() {
        let stats = ServerStats::new();
        assert_eq!(stats.total_connections, 0);
        assert_eq!(stats.active_connections, 0);
        assert_eq!(stats.uptime, Duration::ZERO);
    }
}
