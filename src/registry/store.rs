//! Channel registry implementation
//!
//! The central registry that owns subscription lifecycle and routes
//! published messages from publishers to subscriber mailboxes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::message::Message;
use super::slot::{EnqueueResult, SlotId, SubscriberSlot, Subscription};

/// Central registry for all channels and their subscribers
///
/// Thread-safe via a single `RwLock` around the channel map. Publishes take
/// a read-locked snapshot of the current membership; subscribe and
/// unsubscribe take the write lock. Subscriber mailboxes live outside the
/// lock, so a stalled subscriber can never hold the registry hostage.
pub struct ChannelRegistry {
    /// Map of channel name to subscriber slots, keyed by slot identity
    channels: RwLock<HashMap<Arc<str>, HashMap<SlotId, SubscriberSlot>>>,

    /// Configuration
    config: RegistryConfig,

    /// Lifetime count of publish calls, successful validation only
    publish_count: AtomicU64,

    /// Next slot id to allocate
    next_slot_id: AtomicU64,
}

/// Result of one publish call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishOutcome {
    /// Mailboxes the message was queued into
    pub delivered: usize,
    /// Mailboxes that were full; those subscribers missed this message
    pub dropped: usize,
}

/// Point-in-time view of the registry counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of channels with at least one registered slot
    pub channels: usize,
    /// Number of registered subscriber slots across all channels
    pub subscribers: usize,
    /// Lifetime publish count
    pub published: u64,
}

impl ChannelRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            config,
            publish_count: AtomicU64::new(0),
            next_slot_id: AtomicU64::new(1),
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a new subscriber on a channel.
    ///
    /// Creates the channel entry on first subscribe. Never fails for a
    /// non-empty channel name.
    pub async fn subscribe(&self, channel: &str) -> Result<Subscription, RegistryError> {
        if channel.is_empty() {
            return Err(RegistryError::EmptyChannel);
        }

        let mut channels = self.channels.write().await;

        let key: Arc<str> = match channels.get_key_value(channel) {
            Some((key, _)) => key.clone(),
            None => Arc::from(channel),
        };

        let id = SlotId(self.next_slot_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.config.mailbox_capacity);
        let alive = Arc::new(std::sync::atomic::AtomicBool::new(true));

        let slots = channels.entry(key.clone()).or_default();
        slots.insert(
            id,
            SubscriberSlot {
                id,
                channel: key.clone(),
                tx,
                alive: alive.clone(),
            },
        );

        tracing::debug!(
            channel = %key,
            slot = %id,
            subscribers = slots.len(),
            "Subscriber added"
        );

        Ok(Subscription {
            id,
            channel: key,
            rx,
            alive,
        })
    }

    /// Remove a subscriber slot from a channel.
    ///
    /// Idempotent: removing a slot that was already removed, or a channel
    /// that never existed, is a safe no-op. Returns whether a slot was
    /// actually removed.
    pub async fn unsubscribe(&self, channel: &str, id: SlotId) -> bool {
        let mut channels = self.channels.write().await;

        let Some(slots) = channels.get_mut(channel) else {
            return false;
        };
        let Some(slot) = slots.remove(&id) else {
            return false;
        };

        slot.retire();
        let remaining = slots.len();
        if remaining == 0 && self.config.prune_empty_channels {
            channels.remove(channel);
        }

        tracing::debug!(
            channel = channel,
            slot = %id,
            subscribers = remaining,
            "Subscriber removed"
        );
        true
    }

    /// Snapshot the current subscribers of a channel.
    ///
    /// The snapshot is only valid at call time: slots may be unsubscribed
    /// concurrently afterwards, and a just-departed subscriber may still
    /// receive or miss a message routed through an older snapshot.
    pub async fn snapshot_targets(&self, channel: &str) -> Vec<SubscriberSlot> {
        let channels = self.channels.read().await;

        channels
            .get(channel)
            .map(|slots| slots.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Publish a message to every current subscriber of a channel.
    ///
    /// Each mailbox gets a non-blocking enqueue; a full mailbox drops the
    /// message for that subscriber only. The call never waits on subscriber
    /// behavior and succeeds even when the channel has no subscribers.
    /// Slots whose receiving side is gone are unregistered along the way.
    pub async fn publish(
        &self,
        channel: &str,
        text: &str,
    ) -> Result<PublishOutcome, RegistryError> {
        if channel.is_empty() {
            return Err(RegistryError::EmptyChannel);
        }
        if text.is_empty() {
            return Err(RegistryError::EmptyPayload);
        }

        let targets = self.snapshot_targets(channel).await;
        let msg = Message::from_text(channel, text);

        let mut outcome = PublishOutcome::default();
        let mut gone: Vec<SlotId> = Vec::new();

        for slot in &targets {
            match slot.enqueue(msg.clone()) {
                EnqueueResult::Delivered => outcome.delivered += 1,
                EnqueueResult::Dropped => {
                    outcome.dropped += 1;
                    tracing::trace!(channel = channel, slot = %slot.id(), "Mailbox full, message dropped");
                }
                EnqueueResult::Gone => gone.push(slot.id()),
            }
        }

        self.publish_count.fetch_add(1, Ordering::Relaxed);

        // A receiver that vanished without unsubscribing leaves a mailbox
        // nobody drains; discard its slot now.
        for id in gone {
            self.unsubscribe(channel, id).await;
        }

        tracing::debug!(
            channel = channel,
            delivered = outcome.delivered,
            dropped = outcome.dropped,
            "Message published"
        );

        Ok(outcome)
    }

    /// Number of registered subscribers on one channel
    pub async fn channel_subscribers(&self, channel: &str) -> usize {
        let channels = self.channels.read().await;
        channels.get(channel).map(|slots| slots.len()).unwrap_or(0)
    }

    /// Registry-wide counters at a consistent instant.
    ///
    /// Channel and subscriber counts come from one read-locked pass over
    /// the map. The publish count is an atomic read and may trail
    /// concurrent publishes slightly.
    pub async fn stats(&self) -> RegistryStats {
        let channels = self.channels.read().await;

        RegistryStats {
            channels: channels.len(),
            subscribers: channels.values().map(|slots| slots.len()).sum(),
            published: self.publish_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_publish_receive() {
        let registry = ChannelRegistry::new();

        let mut sub = registry.subscribe("news").await.unwrap();
        let outcome = registry.publish("news", "hello").await.unwrap();
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.dropped, 0);

        let msg = sub.recv().await.expect("message");
        assert_eq!(msg.text(), "hello");
        assert_eq!(&*msg.channel, "news");
        assert!(!msg.timestamp.is_empty());

        // Exactly one message, no duplicates
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_publish_with_no_subscribers() {
        let registry = ChannelRegistry::new();

        let outcome = registry.publish("empty", "x").await.unwrap();
        assert_eq!(outcome.delivered, 0);
        assert_eq!(outcome.dropped, 0);

        let stats = registry.stats().await;
        assert_eq!(stats.published, 1);
        assert_eq!(stats.channels, 0);
    }

    #[tokio::test]
    async fn test_publish_rejects_empty_arguments() {
        let registry = ChannelRegistry::new();

        assert_eq!(
            registry.publish("", "x").await,
            Err(RegistryError::EmptyChannel)
        );
        assert_eq!(
            registry.publish("news", "").await,
            Err(RegistryError::EmptyPayload)
        );

        // Failed publishes must not count
        assert_eq!(registry.stats().await.published, 0);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_empty_channel() {
        let registry = ChannelRegistry::new();

        assert!(matches!(
            registry.subscribe("").await,
            Err(RegistryError::EmptyChannel)
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let registry = ChannelRegistry::new();

        let sub = registry.subscribe("news").await.unwrap();
        let id = sub.id();

        assert!(registry.unsubscribe("news", id).await);
        assert!(!registry.unsubscribe("news", id).await);
        assert!(!registry.unsubscribe("missing", id).await);

        assert_eq!(registry.stats().await.subscribers, 0);
    }

    #[tokio::test]
    async fn test_fanout_to_all_subscribers() {
        let registry = ChannelRegistry::new();

        let mut subs = Vec::new();
        for _ in 0..3 {
            subs.push(registry.subscribe("news").await.unwrap());
        }
        let outcome = registry.publish("news", "fanout").await.unwrap();
        assert_eq!(outcome.delivered, 3);

        for sub in &mut subs {
            assert_eq!(sub.recv().await.unwrap().text(), "fanout");
        }
    }

    #[tokio::test]
    async fn test_departed_subscriber_not_delivered() {
        let registry = ChannelRegistry::new();

        let mut keep = registry.subscribe("news").await.unwrap();
        let gone = registry.subscribe("news").await.unwrap();
        registry.unsubscribe("news", gone.id()).await;

        let outcome = registry.publish("news", "x").await.unwrap();
        assert_eq!(outcome.delivered, 1);
        assert_eq!(keep.recv().await.unwrap().text(), "x");

        let stats = registry.stats().await;
        assert_eq!(stats.subscribers, 1);
    }

    #[tokio::test]
    async fn test_full_mailbox_drops_for_that_subscriber_only() {
        let registry =
            ChannelRegistry::with_config(RegistryConfig::default().mailbox_capacity(1));

        let mut fast = registry.subscribe("news").await.unwrap();
        let _slow = registry.subscribe("news").await.unwrap();

        // Fill the slow subscriber's single-message mailbox, then keep
        // publishing while draining the fast one.
        registry.publish("news", "m1").await.unwrap();
        assert_eq!(fast.recv().await.unwrap().text(), "m1");

        let outcome = registry.publish("news", "m2").await.unwrap();
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(fast.recv().await.unwrap().text(), "m2");
    }

    #[tokio::test]
    async fn test_publish_discards_dead_slots() {
        let registry = ChannelRegistry::new();

        let sub = registry.subscribe("news").await.unwrap();
        // Receiver vanishes without unsubscribing
        drop(sub);

        let outcome = registry.publish("news", "x").await.unwrap();
        assert_eq!(outcome.delivered, 0);
        assert_eq!(registry.stats().await.subscribers, 0);
    }

    #[tokio::test]
    async fn test_empty_channel_pruned() {
        let registry = ChannelRegistry::new();

        let sub = registry.subscribe("news").await.unwrap();
        assert_eq!(registry.stats().await.channels, 1);

        registry.unsubscribe("news", sub.id()).await;
        assert_eq!(registry.stats().await.channels, 0);

        // Publishing to the pruned channel is still a no-op success
        assert!(registry.publish("news", "x").await.is_ok());
    }

    #[tokio::test]
    async fn test_retained_empty_channel_is_noop_for_publish() {
        let registry =
            ChannelRegistry::with_config(RegistryConfig::default().retain_empty_channels());

        let sub = registry.subscribe("news").await.unwrap();
        registry.unsubscribe("news", sub.id()).await;

        let stats = registry.stats().await;
        assert_eq!(stats.channels, 1);
        assert_eq!(stats.subscribers, 0);

        let outcome = registry.publish("news", "x").await.unwrap();
        assert_eq!(outcome.delivered, 0);
        assert_eq!(outcome.dropped, 0);
    }

    #[tokio::test]
    async fn test_per_subscriber_publish_order() {
        let registry = ChannelRegistry::new();

        let mut sub = registry.subscribe("news").await.unwrap();
        for i in 0..5 {
            registry.publish("news", &format!("m{}", i)).await.unwrap();
        }
        for i in 0..5 {
            assert_eq!(sub.recv().await.unwrap().text(), format!("m{}", i));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribe_unsubscribe_publish() {
        let registry = Arc::new(ChannelRegistry::new());

        let mut tasks = Vec::new();
        for t in 0..8 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let channel = format!("chan-{}", t % 4);
                for _ in 0..50 {
                    let sub = registry.subscribe(&channel).await.unwrap();
                    registry.publish(&channel, "burst").await.unwrap();
                    registry.unsubscribe(&channel, sub.id()).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // Every slot was unsubscribed, so nothing may linger
        let stats = registry.stats().await;
        assert_eq!(stats.subscribers, 0);
        assert_eq!(stats.published, 8 * 50);
    }

    #[tokio::test]
    async fn test_channel_subscribers() {
        let registry = ChannelRegistry::new();

        assert_eq!(registry.channel_subscribers("news").await, 0);
        let _a = registry.subscribe("news").await.unwrap();
        let _b = registry.subscribe("news").await.unwrap();
        assert_eq!(registry.channel_subscribers("news").await, 2);
        assert_eq!(registry.channel_subscribers("other").await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_targets_reflects_membership() {
        let registry = ChannelRegistry::new();

        let a = registry.subscribe("news").await.unwrap();
        let _b = registry.subscribe("news").await.unwrap();

        let targets = registry.snapshot_targets("news").await;
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|s| s.channel() == "news"));

        registry.unsubscribe("news", a.id()).await;
        assert_eq!(registry.snapshot_targets("news").await.len(), 1);
    }
}
