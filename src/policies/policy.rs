//! # Retry / poll policy and settlement callbacks.
//!
//! A [`Policy`] bundles the four caller-supplied hooks consulted by the executor:
//!
//! | Hook           | Called with                         | Answer                                      |
//! |----------------|-------------------------------------|---------------------------------------------|
//! | `should_retry` | `(payload, attempt, context)`       | `Some(delay)` → repeat before settling      |
//! | `should_poll`  | `(Some(payload) \| None, context)`  | `Some(delay)` → re-issue after settling/failing |
//! | `on_success`   | `(payload, context)`                | side effect, current generation only        |
//! | `on_failure`   | `(error value, context)`            | side effect, current generation only        |
//!
//! An absent hook means "never retry" / "never poll" / "no callback".
//!
//! `should_poll` is shared between the failure path (called with `None`) and the
//! success path (called with the payload). A payload-less success (empty body)
//! also arrives as `None`.

use std::{sync::Arc, time::Duration};

use serde_json::Value;

use super::backoff::BackoffPolicy;

pub type RetryFn<T, C> = Arc<dyn Fn(Option<&T>, u32, &C) -> Option<Duration> + Send + Sync>;
pub type PollFn<T, C> = Arc<dyn Fn(Option<&T>, &C) -> Option<Duration> + Send + Sync>;
pub type SuccessFn<T, C> = Arc<dyn Fn(Option<&T>, &C) + Send + Sync>;
pub type FailureFn<C> = Arc<dyn Fn(&Value, &C) + Send + Sync>;

/// Caller-supplied retry/poll decisions and settlement callbacks.
pub struct Policy<T, C> {
    should_retry: Option<RetryFn<T, C>>,
    should_poll: Option<PollFn<T, C>>,
    on_success: Option<SuccessFn<T, C>>,
    on_failure: Option<FailureFn<C>>,
}

impl<T, C> Default for Policy<T, C> {
    fn default() -> Self {
        Self {
            should_retry: None,
            should_poll: None,
            on_success: None,
            on_failure: None,
        }
    }
}

impl<T, C> Clone for Policy<T, C> {
    fn clone(&self) -> Self {
        Self {
            should_retry: self.should_retry.clone(),
            should_poll: self.should_poll.clone(),
            on_success: self.on_success.clone(),
            on_failure: self.on_failure.clone(),
        }
    }
}

impl<T, C> Policy<T, C> {
    /// A policy that never retries, never polls and has no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry decision.
    pub fn should_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&T>, u32, &C) -> Option<Duration> + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(f));
        self
    }

    /// Sets the poll decision.
    pub fn should_poll<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&T>, &C) -> Option<Duration> + Send + Sync + 'static,
    {
        self.should_poll = Some(Arc::new(f));
        self
    }

    /// Sets the success callback.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&T>, &C) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Sets the failure callback.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &C) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(f));
        self
    }

    /// Retries while `pending(payload)` holds, up to `max_attempts` exchanges,
    /// waiting `backoff.delay(attempt - 1)` between them.
    ///
    /// # Example
    /// ```rust
    /// use std::time::Duration;
    /// use reqvisor::{BackoffPolicy, Policy};
    /// use serde_json::Value;
    ///
    /// // Keep asking until the job reports "done", at most 5 times.
    /// let policy: Policy<Value, ()> = Policy::new().retry_while(
    ///     |v: Option<&Value>| v.and_then(|v| v["status"].as_str()) != Some("done"),
    ///     BackoffPolicy::default(),
    ///     5,
    /// );
    /// ```
    pub fn retry_while<P>(self, pending: P, backoff: BackoffPolicy, max_attempts: u32) -> Self
    where
        P: Fn(Option<&T>) -> bool + Send + Sync + 'static,
    {
        self.should_retry(move |payload, attempt, _| {
            (attempt < max_attempts && pending(payload))
                .then(|| backoff.delay(attempt.saturating_sub(1)))
        })
    }

    /// Re-issues the request every `interval` after each success; failures settle.
    pub fn poll_every(self, interval: Duration) -> Self {
        self.should_poll(move |payload, _| payload.map(|_| interval))
    }

    /// Re-issues the request every `interval` while it fails (or returns no payload);
    /// stops once a payload arrives.
    pub fn poll_until_present(self, interval: Duration) -> Self {
        self.should_poll(move |payload, _| payload.is_none().then_some(interval))
    }

    pub(crate) fn retry_decision(
        &self,
        payload: Option<&T>,
        attempt: u32,
        ctx: &C,
    ) -> Option<Duration> {
        self.should_retry.as_ref().and_then(|f| f(payload, attempt, ctx))
    }

    pub(crate) fn poll_decision(&self, payload: Option<&T>, ctx: &C) -> Option<Duration> {
        self.should_poll.as_ref().and_then(|f| f(payload, ctx))
    }

    pub(crate) fn notify_success(&self, payload: Option<&T>, ctx: &C) {
        if let Some(f) = &self.on_success {
            f(payload, ctx);
        }
    }

    pub(crate) fn notify_failure(&self, value: &Value, ctx: &C) {
        if let Some(f) = &self.on_failure {
            f(value, ctx);
        }
    }
}
