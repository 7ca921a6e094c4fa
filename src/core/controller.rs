//! # Lifecycle controller.
//!
//! Owns the visible state of one request handle and decides, on each trigger or
//! request-shape change, whether to start a new generation.
//!
//! ## Reconcile
//! ```text
//! trigger(ctx) / replace_options(opts) with a changed shape
//!   ├─► cancel the previous generation's token
//!   ├─► mock configured?  ──eligible──► mint g, response = mock, pending = false,
//!   │                      │             on_success
//!   │                      └─otherwise─► clear at the current generation
//!   ├─► not eligible      ──► clear response/error/pending at the current generation
//!   └─► eligible          ──► mint g, clear response/error (unless preserve_response),
//!                             pending = true, spawn Executor(g)
//! ```
//!
//! Eligible means: triggered at least once, the resolved URL is non-empty, and a
//! body is present for POST/PUT/PATCH.
//!
//! ## State
//! [`Shared`] holds three [`GuardedCell`]s (pending, response, error), each with
//! its own last-writer generation, plus the live options slot read by the
//! executor at decision points. A `watch` revision counter is bumped after every
//! applied write so waiters can observe changes.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        client::Client,
        executor::Executor,
        generation::{Generation, GenerationCounter, GuardedCell},
        state::Snapshot,
    },
    events::{Bus, Event, EventKind},
    policies::Slot,
    request::{RequestDescriptor, RequestOptions},
};

/// State shared between a handle, its controller and the running executor.
pub(crate) struct Shared<T, C> {
    pub(crate) name: Arc<str>,
    pub(crate) generations: GenerationCounter,
    pub(crate) live: Slot<RequestOptions<T, C>>,
    pending: GuardedCell<bool>,
    response: GuardedCell<Option<T>>,
    error: GuardedCell<Option<Value>>,
    context: Mutex<Option<C>>,
    revision: watch::Sender<u64>,
    bus: Bus,
}

impl<T, C> Shared<T, C> {
    fn new(name: Arc<str>, options: Arc<RequestOptions<T, C>>, bus: Bus) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            name,
            generations: GenerationCounter::default(),
            live: Slot::new(options),
            pending: GuardedCell::new(false),
            response: GuardedCell::new(None),
            error: GuardedCell::new(None),
            context: Mutex::new(None),
            revision,
            bus,
        }
    }

    pub(crate) fn is_current(&self, g: Generation) -> bool {
        self.generations.is_current(g)
    }

    pub(crate) fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_request(Arc::clone(&self.name))
    }

    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    pub(crate) fn stale(&self, g: Generation, what: &'static str) {
        tracing::debug!(request = %self.name, generation = %g, what, "stale result dropped");
        self.publish(
            self.event(EventKind::StaleDropped)
                .with_generation(g.get())
                .with_reason(what),
        );
    }

    pub(crate) fn subscribe_revision(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn commit(&self, applied: bool) -> bool {
        if applied {
            self.revision.send_modify(|r| *r = r.wrapping_add(1));
        }
        applied
    }

    fn lock_context(&self) -> MutexGuard<'_, Option<C>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_context(&self, ctx: C) {
        *self.lock_context() = Some(ctx);
        self.commit(true);
    }

    /// Generation start: optionally clear previous results, then mark pending.
    fn start(&self, g: Generation, clear: bool) -> bool {
        let mut applied = false;
        if clear {
            applied |= self.response.set(g, None);
            applied |= self.error.set(g, None);
        }
        applied |= self.pending.set(g, true);
        self.commit(applied)
    }

    /// Ineligible request: back to idle.
    fn clear(&self, g: Generation) -> bool {
        let mut applied = self.response.set(g, None);
        applied |= self.error.set(g, None);
        applied |= self.pending.set(g, false);
        self.commit(applied)
    }

    /// Final failure. Pending is written last so `settled()` observes the full result.
    pub(crate) fn settle_failure(&self, g: Generation, value: Value) -> bool {
        let mut applied = self.response.set(g, None);
        applied |= self.error.set(g, Some(value));
        applied |= self.pending.set(g, false);
        self.commit(applied)
    }

    /// Success delivery; `settle` also clears pending (false while polling).
    pub(crate) fn deliver_success(&self, g: Generation, payload: Option<T>, settle: bool) -> bool {
        let mut applied = self.error.set(g, None);
        applied |= self.response.set(g, payload);
        if settle {
            applied |= self.pending.set(g, false);
        }
        self.commit(applied)
    }
}

impl<T: Clone, C: Clone> Shared<T, C> {
    pub(crate) fn snapshot(&self) -> Snapshot<T, C> {
        Snapshot {
            pending: self.pending.get(),
            response: self.response.get(),
            error: self.error.get(),
            context: self.lock_context().clone(),
        }
    }

    pub(crate) fn pending(&self) -> bool {
        self.pending.get()
    }

    pub(crate) fn response(&self) -> Option<T> {
        self.response.get()
    }

    pub(crate) fn error(&self) -> Option<Value> {
        self.error.get()
    }

    pub(crate) fn context(&self) -> Option<C> {
        self.lock_context().clone()
    }
}

struct ControllerState<T, C> {
    /// Options the request shape is resolved from (snapshot taken at trigger).
    shape: Arc<RequestOptions<T, C>>,
    /// Number of triggers seen; 0 means never triggered.
    trigger_id: u64,
    /// Descriptor of the last reconcile.
    descriptor: Option<Arc<RequestDescriptor>>,
    /// Token of the live generation.
    token: Option<CancellationToken>,
}

/// Mock payload to hand to `on_success` after the controller lock is released.
struct MockDelivery<T, C> {
    generation: Generation,
    payload: T,
    context: C,
}

/// Generation lifecycle of one request handle.
pub(crate) struct Controller<T, C> {
    pub(crate) shared: Arc<Shared<T, C>>,
    client: Arc<Client>,
    state: Mutex<ControllerState<T, C>>,
}

impl<T, C> Controller<T, C> {
    fn lock(&self) -> MutexGuard<'_, ControllerState<T, C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancels the live generation. Its results are never applied.
    pub(crate) fn teardown(&self) {
        let mut st = self.lock();
        if let Some(token) = st.token.take() {
            token.cancel();
        }
        self.shared.publish(
            self.shared
                .event(EventKind::TornDown)
                .with_generation(self.shared.generations.current().get()),
        );
    }
}

impl<T, C> Controller<T, C>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(client: Arc<Client>, options: RequestOptions<T, C>) -> Self {
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| Arc::clone(&client.config().default_name));
        let options = Arc::new(options);
        let shared = Arc::new(Shared::new(name, Arc::clone(&options), client.bus().clone()));
        Self {
            shared,
            client,
            state: Mutex::new(ControllerState {
                shape: options,
                trigger_id: 0,
                descriptor: None,
                token: None,
            }),
        }
    }

    /// Records a trigger, stores `ctx`, re-snapshots the live options and reconciles.
    pub(crate) fn trigger(&self, ctx: C) {
        let mock = {
            let mut st = self.lock();
            st.trigger_id += 1;
            self.shared.store_context(ctx.clone());
            st.shape = self.shared.live.load();
            self.reconcile(&mut st, Some(ctx))
        };
        self.deliver_mock(mock);
    }

    /// Replaces the live options without touching the running generation.
    pub(crate) fn update_options(&self, options: RequestOptions<T, C>) {
        self.shared.live.store(Arc::new(options));
    }

    /// Replaces live options and the request shape; restarts if the resolved shape changed.
    pub(crate) fn replace_options(&self, options: RequestOptions<T, C>) {
        let options = Arc::new(options);
        self.shared.live.store(Arc::clone(&options));

        let mock = {
            let mut st = self.lock();
            st.shape = options;
            if st.trigger_id == 0 {
                return;
            }
            let ctx = self.shared.context();
            let resolved = RequestDescriptor::resolve(&st.shape, ctx.as_ref());
            if st.descriptor.as_deref() == Some(&resolved) {
                return;
            }
            self.reconcile(&mut st, ctx)
        };
        self.deliver_mock(mock);
    }

    fn reconcile(
        &self,
        st: &mut ControllerState<T, C>,
        ctx: Option<C>,
    ) -> Option<MockDelivery<T, C>> {
        let descriptor = Arc::new(RequestDescriptor::resolve(&st.shape, ctx.as_ref()));
        st.descriptor = Some(Arc::clone(&descriptor));

        if let Some(prev) = st.token.take().filter(|t| !t.is_cancelled()) {
            prev.cancel();
            self.shared.publish(
                self.shared
                    .event(EventKind::GenerationSuperseded)
                    .with_generation(self.shared.generations.current().get()),
            );
        }

        let live = self.shared.live.load();
        let eligible = st.trigger_id > 0 && descriptor.is_fetchable();

        if let Some(mock) = &live.mock_response {
            let ctx = match ctx {
                Some(ctx) if eligible => ctx,
                _ => {
                    self.shared.clear(self.shared.generations.current());
                    return None;
                }
            };
            let g = self.shared.generations.next();
            self.shared.deliver_success(g, Some(mock.clone()), true);
            tracing::debug!(request = %self.shared.name, generation = %g, "mock response applied");
            self.shared
                .publish(self.shared.event(EventKind::MockResolved).with_generation(g.get()));
            return Some(MockDelivery {
                generation: g,
                payload: mock.clone(),
                context: ctx,
            });
        }

        let ctx = match ctx {
            Some(ctx) if eligible => ctx,
            _ => {
                self.shared.clear(self.shared.generations.current());
                return None;
            }
        };

        let g = self.shared.generations.next();
        self.shared.start(g, !live.preserve_response);

        let token = CancellationToken::new();
        st.token = Some(token.clone());

        let config = self.client.config();
        let delay = live
            .delay
            .or_else(|| config.default_delay())
            .unwrap_or(Duration::ZERO);

        tracing::debug!(
            request = %self.shared.name,
            generation = %g,
            url = descriptor.url.as_deref().unwrap_or_default(),
            method = %descriptor.method,
            "generation started"
        );
        self.shared
            .publish(self.shared.event(EventKind::GenerationStarted).with_generation(g.get()));

        let executor = Executor {
            shared: Arc::clone(&self.shared),
            transport: self.client.transport(),
            transform: self.client.transform(),
            descriptor,
            context: ctx,
            generation: g,
            token,
            delay,
            default_timeout: config.default_timeout(),
        };
        tokio::spawn(executor.run());
        None
    }

    fn deliver_mock(&self, mock: Option<MockDelivery<T, C>>) {
        let Some(m) = mock else { return };
        if self.shared.is_current(m.generation) {
            self.shared
                .live
                .load()
                .policy
                .notify_success(Some(&m.payload), &m.context);
        } else {
            self.shared.stale(m.generation, "mock");
        }
    }
}
