//! Handler context
//!
//! Read-only view of a session passed to handler callbacks.

use std::net::SocketAddr;

use crate::stats::SessionStats;

use super::state::SessionState;

/// Context passed to `RelayHandler` callbacks
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Unique session ID
    pub session_id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Whether this connection passed the publish auth gate
    pub authorized: bool,

    /// Current session statistics
    pub stats: SessionStats,
}

impl From<&SessionState> for SessionContext {
    fn from(state: &SessionState) -> Self {
        Self {
            session_id: state.id,
            peer_addr: state.peer_addr,
            authorized: state.authorized,
            stats: SessionStats {
                lines_received: state.lines_received,
                messages_published: state.messages_published,
                messages_delivered: state.messages_delivered,
                messages_dropped: state.messages_dropped,
                duration: state.duration(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_context_from_state() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 7878);
        let mut state = SessionState::new(7, addr);
        state.authorize();
        state.messages_published = 3;

        let ctx = SessionContext::from(&state);
        assert_eq!(ctx.session_id, 7);
        assert_eq!(ctx.peer_addr, addr);
        assert!(ctx.authorized);
        assert_eq!(ctx.stats.messages_published, 3);
    }
}
