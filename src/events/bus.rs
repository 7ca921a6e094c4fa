//! # Event bus for broadcasting lifecycle events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Every handle of a
//! [`Client`](crate::Client) publishes into the same bus; the client runs one
//! listener that fans events out to its [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//!   executor (gen 1) ──┐
//!   executor (gen 2) ──┼──► Bus ──► client listener ──► SubscriberSet
//!   controller       ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks.
//! - A single ring buffer of `capacity` events is shared by all receivers;
//!   slow receivers observe `RecvError::Lagged(n)`.
//! - Events published with no receiver are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver observing events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
