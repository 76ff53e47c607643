//! Subscriber slots and subscription handles
//!
//! Each subscriber on a channel owns one slot: a bounded FIFO mailbox plus a
//! liveness flag. The registry holds the sending side (`SubscriberSlot`) for
//! fan-out; the subscriber's delivery loop holds the receiving side
//! (`Subscription`) and drains it until unsubscribed or disconnected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::message::Message;

/// Identity of one subscriber slot within the registry
///
/// Membership is keyed by slot identity, which makes removal idempotent:
/// removing an id that is already gone is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(super) u64);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of a non-blocking mailbox enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueResult {
    /// Message was queued for the subscriber
    Delivered,
    /// Mailbox was full; the message is dropped for this subscriber only
    Dropped,
    /// Receiving side is gone; the slot should be unregistered
    Gone,
}

/// Registry-side handle to one subscriber
///
/// Holds the mailbox sender and the shared liveness flag. Clones refer to
/// the same slot.
#[derive(Debug, Clone)]
pub struct SubscriberSlot {
    pub(super) id: SlotId,
    pub(super) channel: Arc<str>,
    pub(super) tx: mpsc::Sender<Message>,
    pub(super) alive: Arc<AtomicBool>,
}

impl SubscriberSlot {
    /// Slot identity
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Channel this slot is registered on
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the slot is still open
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Enqueue a message without blocking.
    ///
    /// A full mailbox drops the message rather than slowing the publisher.
    pub(super) fn enqueue(&self, msg: Message) -> EnqueueResult {
        match self.tx.try_send(msg) {
            Ok(()) => EnqueueResult::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => EnqueueResult::Dropped,
            Err(mpsc::error::TrySendError::Closed(_)) => EnqueueResult::Gone,
        }
    }

    /// Mark the slot closed. Returns true only for the caller that actually
    /// performed the transition, so close-time cleanup runs exactly once.
    pub(super) fn retire(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }
}

/// Subscriber-side handle returned by `ChannelRegistry::subscribe`
///
/// Owns the receiving end of the mailbox. Once the slot is unregistered the
/// handle stops yielding messages, even if some were still queued.
#[derive(Debug)]
pub struct Subscription {
    pub(super) id: SlotId,
    pub(super) channel: Arc<str>,
    pub(super) rx: mpsc::Receiver<Message>,
    pub(super) alive: Arc<AtomicBool>,
}

impl Subscription {
    /// Slot identity, used to unsubscribe
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Channel this subscription is registered on
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the slot is still registered
    pub fn is_open(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Wait for the next message.
    ///
    /// Returns `None` once the slot has been closed, whether by unsubscribe
    /// or by the registry discarding a dead slot. Cancel-safe, so it can be
    /// raced against a disconnect signal in `select!`.
    pub async fn recv(&mut self) -> Option<Message> {
        if !self.alive.load(Ordering::Acquire) {
            return None;
        }
        self.rx.recv().await
    }

    /// Take the next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<Message> {
        if !self.alive.load(Ordering::Acquire) {
            return None;
        }
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_pair(capacity: usize) -> (SubscriberSlot, Subscription) {
        let (tx, rx) = mpsc::channel(capacity);
        let alive = Arc::new(AtomicBool::new(true));
        let channel: Arc<str> = Arc::from("news");
        let slot = SubscriberSlot {
            id: SlotId(1),
            channel: channel.clone(),
            tx,
            alive: alive.clone(),
        };
        let sub = Subscription {
            id: SlotId(1),
            channel,
            rx,
            alive,
        };
        (slot, sub)
    }

    #[tokio::test]
    async fn test_enqueue_and_recv() {
        let (slot, mut sub) = slot_pair(4);

        assert_eq!(
            slot.enqueue(Message::from_text("news", "a")),
            EnqueueResult::Delivered
        );
        let msg = sub.recv().await.expect("message");
        assert_eq!(msg.text(), "a");
    }

    #[tokio::test]
    async fn test_full_mailbox_drops() {
        let (slot, _sub) = slot_pair(1);

        assert_eq!(
            slot.enqueue(Message::from_text("news", "a")),
            EnqueueResult::Delivered
        );
        assert_eq!(
            slot.enqueue(Message::from_text("news", "b")),
            EnqueueResult::Dropped
        );
    }

    #[tokio::test]
    async fn test_closed_mailbox_reports_gone() {
        let (slot, sub) = slot_pair(1);
        drop(sub);

        assert_eq!(
            slot.enqueue(Message::from_text("news", "a")),
            EnqueueResult::Gone
        );
    }

    #[test]
    fn test_retire_exactly_once() {
        let (slot, _sub) = slot_pair(1);

        assert!(slot.retire());
        assert!(!slot.retire());
        assert!(!slot.is_alive());
    }

    #[tokio::test]
    async fn test_recv_gated_after_retire() {
        let (slot, mut sub) = slot_pair(4);
        slot.enqueue(Message::from_text("news", "queued"));
        slot.retire();

        // Queued messages are discarded once the slot is closed
        assert!(!sub.is_open());
        assert!(sub.recv().await.is_none());
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (slot, mut sub) = slot_pair(8);
        for text in ["1", "2", "3"] {
            slot.enqueue(Message::from_text("news", text));
        }
        for expected in ["1", "2", "3"] {
            assert_eq!(sub.recv().await.unwrap().text(), expected);
        }
    }
}
