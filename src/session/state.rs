//! Session state machine
//!
//! Tracks the state of one relay connection from accept to disconnect.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// TCP connected, not yet accepted by the handler
    Connected,
    /// Accepting commands
    Command,
    /// Subscribed to a channel, streaming messages
    Delivering,
    /// Session is closing
    Closing,
    /// Session closed
    Closed,
}

/// Complete session state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: SessionPhase,

    /// Connection start time
    pub connected_at: Instant,

    /// Whether this connection passed the publish auth gate
    pub authorized: bool,

    /// Channel currently subscribed to, if any
    pub channel: Option<Arc<str>>,

    /// Request lines read from the peer
    pub lines_received: u64,

    /// Messages accepted for publish on this connection
    pub messages_published: u64,

    /// Messages written to the peer while subscribed
    pub messages_delivered: u64,

    /// Messages this connection's publishes dropped on full mailboxes
    pub messages_dropped: u64,
}

impl SessionState {
    /// Create a new session state
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            phase: SessionPhase::Connected,
            connected_at: Instant::now(),
            authorized: false,
            channel: None,
            lines_received: 0,
            messages_published: 0,
            messages_delivered: 0,
            messages_dropped: 0,
        }
    }

    /// Handler accepted the connection; start taking commands
    pub fn activate(&mut self) {
        if self.phase == SessionPhase::Connected {
            self.phase = SessionPhase::Command;
        }
    }

    /// Mark the connection authorized for publishing
    pub fn authorize(&mut self) {
        self.authorized = true;
    }

    /// Enter delivery mode for a channel
    pub fn start_delivery(&mut self, channel: Arc<str>) {
        self.channel = Some(channel);
        self.phase = SessionPhase::Delivering;
    }

    /// Leave delivery mode and return to taking commands
    pub fn stop_delivery(&mut self) {
        self.channel = None;
        if self.phase == SessionPhase::Delivering {
            self.phase = SessionPhase::Command;
        }
    }

    /// Start closing the session
    pub fn close(&mut self) {
        self.channel = None;
        self.phase = SessionPhase::Closing;
    }

    /// Mark the session fully closed
    pub fn finish(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    /// Check if the session is streaming messages
    pub fn is_delivering(&self) -> bool {
        self.phase == SessionPhase::Delivering
    }

    /// Get session duration
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
