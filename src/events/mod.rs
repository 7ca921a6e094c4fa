//! Lifecycle events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the controller (generation start/supersede/teardown, mock)
//!   and the executor (attempts, retries, polls, settlement, stale drops).
//! - **Consumers**: the client's listener task, which forwards to the
//!   [`SubscriberSet`](crate::SubscriberSet); or any receiver from
//!   [`Client::subscribe`](crate::Client::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, PollSource};
