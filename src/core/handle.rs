//! # Request handle: the trigger surface.
//!
//! A [`RequestHandle`] is one logical call site. The consumer calls
//! [`trigger`](RequestHandle::trigger) to start a generation and reads back a
//! [`Snapshot`] of `{ pending, response, error, context }`.
//!
//! ```text
//! trigger(ctx) ──► Controller::trigger ──► reconcile ──► Executor (tokio task)
//!                                                            │
//! state() / changed() / settled() ◄── guarded cells ◄────────┘
//! ```
//!
//! Dropping the handle tears it down: the live generation is cancelled and its
//! results are discarded.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    core::{client::Client, controller::Controller, generation::Generation, state::Snapshot},
    request::RequestOptions,
};

/// One logical request call site.
pub struct RequestHandle<T, C> {
    controller: Controller<T, C>,
}

impl<T, C> RequestHandle<T, C>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(client: Arc<Client>, options: RequestOptions<T, C>) -> Self {
        Self {
            controller: Controller::new(client, options),
        }
    }

    /// Starts a new generation with `context`, superseding any running one.
    ///
    /// Returns without waiting.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime when the request is eligible
    /// and not mocked, since the executor is spawned with `tokio::spawn`.
    pub fn trigger(&self, context: C) {
        self.controller.trigger(context);
    }

    /// Current visible state.
    pub fn state(&self) -> Snapshot<T, C> {
        self.controller.shared.snapshot()
    }

    pub fn pending(&self) -> bool {
        self.controller.shared.pending()
    }

    pub fn response(&self) -> Option<T> {
        self.controller.shared.response()
    }

    pub fn error(&self) -> Option<Value> {
        self.controller.shared.error()
    }

    pub fn context(&self) -> Option<C> {
        self.controller.shared.context()
    }

    /// Latest generation minted by this handle ([`Generation::NONE`] before the first).
    pub fn generation(&self) -> Generation {
        self.controller.shared.generations.current()
    }

    /// Waits for the next visible state change.
    pub async fn changed(&self) {
        let mut rx = self.controller.shared.subscribe_revision();
        let _ = rx.changed().await;
    }

    /// Waits until `pending` is false and returns the state.
    ///
    /// Never returns while success-polling keeps the generation pending.
    pub async fn settled(&self) -> Snapshot<T, C> {
        let mut rx = self.controller.shared.subscribe_revision();
        loop {
            if !self.pending() {
                return self.state();
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }

    /// Swaps the options read at decision points (policies, callbacks, delay,
    /// mock, preserve) without restarting.
    pub fn update_options(&self, options: RequestOptions<T, C>) {
        self.controller.update_options(options);
    }

    /// Swaps the options and the request shape. If the handle was triggered and
    /// the resolved request differs, a new generation starts.
    pub fn replace_options(&self, options: RequestOptions<T, C>) {
        self.controller.replace_options(options);
    }
}

impl<T, C> RequestHandle<T, C> {
    /// Cancels the live generation.
    pub fn teardown(&self) {
        self.controller.teardown();
    }
}

impl<T, C> Drop for RequestHandle<T, C> {
    fn drop(&mut self) {
        self.controller.teardown();
    }
}
