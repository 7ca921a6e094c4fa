//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`] to every subscriber **without
//! awaiting** their processing.
//!
//! ```text
//!    emit(&Event)
//!        ├────────► [queue S1] ─► worker S1 ─► on_event()
//!        └────────► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! - `emit` returns immediately; order is FIFO per subscriber only.
//! - Panics inside `on_event` are caught and logged; the worker keeps running.
//! - Full or closed queues drop the event for that subscriber.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;

use super::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        tracing::warn!(
                            subscriber = name,
                            seq = ev.seq,
                            ?panic,
                            "subscriber panicked"
                        );
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fans one event out to all subscribers.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscriber = channel.name,
                        seq = ev.seq,
                        "event dropped: queue full"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(
                        subscriber = channel.name,
                        seq = ev.seq,
                        "event dropped: worker closed"
                    );
                }
            }
        }
    }

    /// Closes all queues and waits for workers to drain.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}
