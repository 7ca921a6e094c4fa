//! # Executor: one generation's attempt-chain.
//!
//! Runs the debounce sleep, then loops over exchanges until the generation
//! settles or its token fires. Retries and polls continue the same loop with
//! the same generation and token.
//!
//! ```text
//! sleep(delay) ──cancel──► return
//!   │
//!   ▼
//! loop {
//!   ├─► publish AttemptStarting
//!   ├─► exchange(transport, url, wire, token)
//!   │     ├─ Cancelled ──► return (no side effects)
//!   │     ├─ Failure ──► should_poll(None)
//!   │     │                ├─ Some(d) ──► PollScheduled, sleep(d), attempt = 1, continue
//!   │     │                └─ None    ──► settle failure, on_failure (if current), return
//!   │     └─ Success ──► should_retry(payload, attempt)
//!   │                      ├─ Some(d) ──► RetryScheduled, sleep(d), attempt += 1, continue
//!   │                      └─ None    ──► should_poll(payload)
//!   │                                     ├─ Some(d) ──► deliver (pending stays), on_success,
//!   │                                     │              PollScheduled, sleep(d), attempt = 1, continue
//!   │                                     └─ None    ──► settle success, on_success, return
//! }
//! ```
//!
//! ## Rules
//! - Policies are loaded from the handle's live slot at each decision point.
//! - The transform and the resolved descriptor are fixed for the whole generation.
//! - Every state write goes through the guarded cells; callbacks run only while
//!   the generation is current. Rejected results publish `StaleDropped`.

use std::{sync::Arc, time::Duration};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        controller::Shared,
        exchange::exchange,
        generation::Generation,
        state::Outcome,
    },
    error::FailureReason,
    events::{EventKind, PollSource},
    request::RequestDescriptor,
    sleep::sleep,
    transform::{RequestInit, Transform},
    transport::Transport,
};

/// Everything one generation needs, captured when it starts.
pub(crate) struct Executor<T, C> {
    pub(crate) shared: Arc<Shared<T, C>>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) transform: Arc<dyn Transform>,
    pub(crate) descriptor: Arc<RequestDescriptor>,
    pub(crate) context: C,
    pub(crate) generation: Generation,
    pub(crate) token: CancellationToken,
    pub(crate) delay: Duration,
    pub(crate) default_timeout: Option<Duration>,
}

impl<T, C> Executor<T, C>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    pub(crate) async fn run(self) {
        if sleep(self.delay, &self.token).await.is_err() {
            return;
        }

        let Some(raw_url) = self.descriptor.url.as_deref() else {
            return;
        };
        let url = self.transform.transform_url(raw_url);
        let init = RequestInit {
            method: Some(self.descriptor.method),
            headers: self.descriptor.other.headers.clone(),
            body: self.descriptor.body.clone(),
            timeout: self.descriptor.other.timeout.or(self.default_timeout),
        };

        let g = self.generation;
        let mut attempt: u32 = 1;

        loop {
            let wire = self.transform.transform_options(raw_url, init.clone());
            self.shared.publish(
                self.shared
                    .event(EventKind::AttemptStarting)
                    .with_generation(g.get())
                    .with_attempt(attempt),
            );

            let outcome = exchange::<T>(self.transport.as_ref(), &url, &wire, &self.token).await;

            let next = match outcome {
                Outcome::Cancelled => return,
                Outcome::Failure(err) => {
                    if err.reason == FailureReason::Network {
                        tracing::warn!(
                            request = %self.shared.name,
                            generation = %g,
                            attempt,
                            url = %url,
                            error = %err.as_message(),
                            "network failure"
                        );
                    } else {
                        tracing::debug!(
                            request = %self.shared.name,
                            generation = %g,
                            attempt,
                            error = %err.as_message(),
                            "request failed"
                        );
                    }
                    self.shared.publish(
                        self.shared
                            .event(EventKind::AttemptFailed)
                            .with_generation(g.get())
                            .with_attempt(attempt)
                            .with_reason(err.as_message()),
                    );

                    let live = self.shared.live.load();
                    match live.policy.poll_decision(None, &self.context) {
                        Some(d) => {
                            self.publish_poll(g, d, PollSource::Failure);
                            d
                        }
                        None => {
                            if !self.shared.settle_failure(g, err.value.clone()) {
                                self.shared.stale(g, "failure");
                            }
                            if self.shared.is_current(g) {
                                live.policy.notify_failure(&err.value, &self.context);
                            }
                            self.shared.publish(
                                self.shared
                                    .event(EventKind::RequestFailed)
                                    .with_generation(g.get())
                                    .with_attempt(attempt)
                                    .with_reason(err.as_label()),
                            );
                            return;
                        }
                    }
                }
                Outcome::Success(payload) => {
                    let live = self.shared.live.load();
                    let retry = live
                        .policy
                        .retry_decision(payload.as_ref(), attempt, &self.context);
                    if let Some(d) = retry {
                        tracing::debug!(
                            request = %self.shared.name,
                            generation = %g,
                            attempt,
                            delay_ms = d.as_millis() as u64,
                            "retry scheduled"
                        );
                        self.shared.publish(
                            self.shared
                                .event(EventKind::RetryScheduled)
                                .with_generation(g.get())
                                .with_attempt(attempt)
                                .with_delay(d),
                        );
                        if sleep(d, &self.token).await.is_err() {
                            return;
                        }
                        attempt += 1;
                        continue;
                    }

                    let poll = live.policy.poll_decision(payload.as_ref(), &self.context);
                    if !self.shared.deliver_success(g, payload.clone(), poll.is_none()) {
                        self.shared.stale(g, "success");
                    }
                    if self.shared.is_current(g) {
                        live.policy.notify_success(payload.as_ref(), &self.context);
                    }

                    match poll {
                        Some(d) => {
                            self.publish_poll(g, d, PollSource::Success);
                            d
                        }
                        None => {
                            self.shared.publish(
                                self.shared
                                    .event(EventKind::RequestSucceeded)
                                    .with_generation(g.get())
                                    .with_attempt(attempt),
                            );
                            return;
                        }
                    }
                }
            };

            if sleep(next, &self.token).await.is_err() {
                return;
            }
            attempt = 1;
        }
    }

    fn publish_poll(&self, g: Generation, delay: Duration, source: PollSource) {
        tracing::debug!(
            request = %self.shared.name,
            generation = %g,
            delay_ms = delay.as_millis() as u64,
            ?source,
            "poll scheduled"
        );
        self.shared.publish(
            self.shared
                .event(EventKind::PollScheduled)
                .with_generation(g.get())
                .with_delay(delay)
                .with_poll_source(source),
        );
    }
}
