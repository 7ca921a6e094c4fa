//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging custom observers
//! (metrics, audit, UI refresh) into a [`Client`](crate::Client).
//!
//! Each subscriber gets a dedicated worker task and a bounded queue of its own.
//! A panicking or slow subscriber only affects itself: overflowing events are
//! dropped for that subscriber and a `tracing` warning is emitted.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use reqvisor::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter(std::sync::atomic::AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::RequestFailed) {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of lifecycle events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event. Called from the subscriber's worker task, FIFO.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic warnings.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (clamped to at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
