//! # reqvisor
//!
//! **Reqvisor** manages the lifecycle of asynchronous HTTP requests issued from a
//! long-lived call site (a screen, a widget, a job monitor).
//!
//! Each call site is a [`RequestHandle`]. Every trigger starts a new
//! *generation*; older generations are cancelled and any late results they
//! produce are dropped, so the visible state never moves backwards.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────────┐   ┌──────────────────┐
//!     │ RequestHandle #1 │   │ RequestHandle #2 │      trigger(ctx)
//!     └────────┬─────────┘   └────────┬─────────┘
//!              ▼                      ▼
//!     ┌──────────────────┐   ┌──────────────────┐
//!     │    Controller    │   │    Controller    │      eligibility, generations,
//!     │ (guarded cells)  │   │ (guarded cells)  │      pending / response / error
//!     └────────┬─────────┘   └────────┬─────────┘
//!              ▼ spawn                ▼ spawn
//!     ┌──────────────────┐   ┌──────────────────┐
//!     │  Executor (g=3)  │   │  Executor (g=1)  │      retry / poll loop
//!     └────────┬─────────┘   └────────┬─────────┘
//!              ▼                      ▼
//! ┌──────────────────────────────────────────────────┐
//! │ Client: Config, Transform, Transport, Bus        │
//! └──────────────────────────┬───────────────────────┘
//!                            ▼
//!                 listener ──► SubscriberSet ──► LogWriter, custom...
//! ```
//!
//! ### Lifecycle of one generation
//! ```text
//! trigger(ctx)
//!   ├─► cancel previous token
//!   ├─► resolve RequestDescriptor (url + query, method, body, other)
//!   ├─► not eligible ──► clear state
//!   ├─► mock configured ──► response = mock, on_success
//!   └─► mint g, pending = true, spawn executor
//!         ├─► sleep(delay)
//!         └─► loop: exchange ─► retry? ─► poll? ─► settle
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                         |
//! |-------------------|-----------------------------------------------------------|--------------------------------------------|
//! | **Handles**       | Trigger requests and observe their state                  | [`RequestHandle`], [`Snapshot`]            |
//! | **Options**       | Static or context-derived request shape                   | [`RequestOptions`], [`Method`], [`Body`]   |
//! | **Policies**      | Retry / poll decisions and callbacks                      | [`Policy`], [`BackoffPolicy`]              |
//! | **Pipeline**      | Deployment-wide URL and option shaping                    | [`Transform`], [`JsonTransform`]           |
//! | **Transport**     | One HTTP exchange                                         | [`Transport`], `ReqwestTransport`          |
//! | **Events**        | Lifecycle events and observers                            | [`Event`], [`Subscribe`]                   |
//! | **Errors**        | Classified failures                                       | [`RequestError`], [`TransportError`]       |
//! | **Configuration** | Client-wide defaults                                      | [`Config`], [`ClientBuilder`]              |
//!
//! ## Optional features
//! - `reqwest` (default): [`ReqwestTransport`] and its use as the default transport.
//! - `rustls-tls` (default): TLS for the reqwest transport, so https URLs work.
//! - `logging` (default): exports [`LogWriter`], forwarding events to `tracing`.
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use reqvisor::{Client, Config, Param, RequestOptions, UrlParams};
//! use serde::Deserialize;
//!
//! #[derive(Clone, Debug, Deserialize)]
//! struct Page {
//!     count: u64,
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = Client::new();
//!
//!     let events = client.lazy_request(
//!         RequestOptions::<Page, i64>::new()
//!             .name("conflict-data")
//!             .url("https://api.example.org/conflict_data/")
//!             .query_with(|year| {
//!                 let mut q = UrlParams::new();
//!                 q.insert("year".into(), Param::from(*year));
//!                 Some(q)
//!             })
//!             .delay(Duration::from_millis(200))
//!             .on_failure(|err, year| eprintln!("{year}: {err}")),
//!     );
//!
//!     events.trigger(2008);
//!     events.trigger(2009); // supersedes 2008
//!
//!     let state = events.settled().await;
//!     println!("{:?} {:?}", state.context, state.response.map(|p| p.count));
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod policies;
mod request;
mod sleep;
mod subscribers;
mod transform;
mod transport;

// ---- Public re-exports ----

pub use crate::config::Config;
pub use crate::core::{Client, ClientBuilder, Generation, Outcome, RequestHandle, Snapshot};
pub use crate::error::{FailureReason, FailureSource, RequestError, TransportError};
pub use crate::events::{Bus, Event, EventKind, PollSource};
pub use crate::policies::{
    BackoffPolicy, FailureFn, JitterPolicy, PollFn, Policy, RetryFn, SuccessFn,
};
pub use crate::request::{
    Body, ExtraOptions, Field, Headers, Method, Param, RequestDescriptor, RequestOptions, UrlParams,
    prepare_url_params,
};
pub use crate::sleep::{Cancelled, sleep};
pub use crate::subscribers::{Subscribe, SubscriberSet};
pub use crate::transform::{
    FnTransform, JsonTransform, RequestInit, Transform, WireRequest, process_options,
};
pub use crate::transport::{Transport, UnconfiguredTransport, WireResponse};

#[cfg(feature = "reqwest")]
pub use crate::transport::ReqwestTransport;

#[cfg(feature = "logging")]
pub use crate::subscribers::LogWriter;
