//! Registry configuration

/// Configuration for the channel registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Capacity of each subscriber mailbox
    ///
    /// Small on purpose: a subscriber that cannot keep up loses messages
    /// instead of buffering without bound.
    pub mailbox_capacity: usize,

    /// Remove a channel entry once its last subscriber leaves
    ///
    /// Publishing to an absent channel and publishing to an empty one are
    /// the same no-op, so either setting is behaviorally equivalent.
    pub prune_empty_channels: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 8,
            prune_empty_channels: true,
        }
    }
}

impl RegistryConfig {
    /// Set the mailbox capacity. Values below 1 are raised to 1.
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity.max(1);
        self
    }

    /// Keep empty channel entries instead of pruning them
    pub fn retain_empty_channels(mut self) -> Self {
        self.prune_empty_channels = false;
        self
    }
}
