//! Channel registry for pub/sub fan-out
//!
//! The registry owns the subscription lifecycle and routes published
//! messages to every subscriber of a channel through bounded per-subscriber
//! mailboxes.
//!
//! # Architecture
//!
//! ```text
//!                         Arc<ChannelRegistry>
//!                    ┌───────────────────────────┐
//!                    │ channels: HashMap<name,   │
//!                    │   {SlotId -> Slot {       │
//!                    │     tx: mpsc::Sender,     │
//!                    │     alive: AtomicBool,    │
//!                    │   }}                      │
//!                    │ >                         │
//!                    └────────────┬──────────────┘
//!                                 │
//!        ┌────────────────────────┼────────────────────────┐
//!        │                        │                        │
//!        ▼                        ▼                        ▼
//!   [Publisher]             [Subscriber]             [Subscriber]
//!   publish()               sub.recv()               sub.recv()
//!        │                        │                        │
//!        └──► try_send per slot ──► delivery loop ──► transport line
//! ```
//!
//! # Backpressure
//!
//! Every mailbox enqueue is non-blocking. A full mailbox drops the message
//! for that subscriber only, so one stalled consumer cannot slow the
//! publisher or the other subscribers on the channel. Messages are FIFO per
//! mailbox, which preserves publish order for each individual subscriber.

pub mod config;
pub mod error;
pub mod message;
pub mod slot;
pub mod store;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use message::Message;
pub use slot::{EnqueueResult, SlotId, SubscriberSlot, Subscription};
pub use store::{ChannelRegistry, PublishOutcome, RegistryStats};
