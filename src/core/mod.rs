//! Runtime core: generations, executor and handles.
//!
//! The public API from this module is [`Client`] / [`ClientBuilder`],
//! [`RequestHandle`], [`Snapshot`], [`Outcome`] and [`Generation`].
//!
//! Internal modules:
//! - [`generation`]: generation ids and last-writer guarded cells;
//! - [`exchange`]: one HTTP exchange with cancellation and classification;
//! - [`executor`]: one generation's retry/poll loop;
//! - [`controller`]: eligibility, reconcile, visible state;
//! - [`handle`]: the trigger surface exposed to consumers;
//! - [`client`]: ambient context shared by handles.

mod client;
mod controller;
mod exchange;
mod executor;
mod generation;
mod handle;
mod state;

pub use client::{Client, ClientBuilder};
pub use generation::Generation;
pub use handle::RequestHandle;
pub use state::{Outcome, Snapshot};
