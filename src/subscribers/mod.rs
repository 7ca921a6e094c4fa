//! # Event subscribers.
//!
//! [`Subscribe`] implementations receive every [`Event`](crate::Event) published
//! on a client's bus through a [`SubscriberSet`].
//!
//! ```text
//!   Bus ──► client listener ──► SubscriberSet ──┬──► LogWriter (tracing)
//!                                               └──► custom subscribers
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
