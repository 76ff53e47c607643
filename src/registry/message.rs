//! Message types for channel fan-out
//!
//! A published message carries an opaque text payload and a server-assigned
//! RFC 3339 timestamp. Messages are immutable once stamped and are designed
//! to be cheap to clone, since one publish enqueues the same message into
//! every subscriber mailbox on the channel.

use std::borrow::Cow;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{SecondsFormat, Utc};

/// A message published to a channel
///
/// Cloning is cheap: the channel name is a shared `Arc<str>` and the payload
/// is reference-counted `Bytes`.
#[derive(Debug, Clone)]
pub struct Message {
    /// Channel the message was published to
    pub channel: Arc<str>,
    /// Opaque payload (publishers send text, stored as bytes)
    pub payload: Bytes,
    /// Server-assigned RFC 3339 timestamp, stamped at publish time
    pub timestamp: String,
}

impl Message {
    /// Create a message from an existing payload, stamping the current time.
    pub fn new(channel: impl Into<Arc<str>>, payload: Bytes) -> Self {
        Self {
            channel: channel.into(),
            payload,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Create a message from a text payload, stamping the current time.
    pub fn from_text(channel: impl Into<Arc<str>>, text: &str) -> Self {
        Self::new(channel, Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Payload as text. Invalid UTF-8 is replaced, never rejected.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Render the message as a single delivery line: `<text> [<timestamp>]`.
    pub fn render_line(&self) -> String {
        format!("{} [{}]", self.text(), self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text() {
        let msg = Message::from_text("news", "hello world");
        assert_eq!(&*msg.channel, "news");
        assert_eq!(msg.text(), "hello world");
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let msg = Message::from_text("news", "x");
        assert!(chrono::DateTime::parse_from_rfc3339(&msg.timestamp).is_ok());
    }

    #[test]
    fn test_render_line() {
        let msg = Message::from_text("news", "hello");
        let line = msg.render_line();
        assert!(line.starts_with("hello ["));
        assert!(line.ends_with(']'));
    }

    #[test]
    fn test_clone_shares_payload() {
        let msg = Message::from_text("news", "shared");
        let copy = msg.clone();
        // Bytes clones share the same backing allocation
        assert_eq!(msg.payload.as_ptr(), copy.payload.as_ptr());
        assert_eq!(msg.timestamp, copy.timestamp);
    }
}
