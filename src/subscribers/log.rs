//! # Logging subscriber.
//!
//! [`LogWriter`] forwards every lifecycle event to `tracing` with structured
//! fields. Enabled via the `logging` feature.
//!
//! ```text
//! DEBUG reqvisor: generation_started request=countries generation=3
//! WARN  reqvisor: attempt_failed request=countries generation=3 attempt=1 reason="request_network: ..."
//! DEBUG reqvisor: poll_scheduled request=job generation=4 delay_ms=2000 source=Success
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Subscriber that logs each event through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let label = e.kind.as_label();
        let request = e.request.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::AttemptFailed | EventKind::RequestFailed => tracing::warn!(
                target: "reqvisor",
                request,
                generation = e.generation,
                attempt = e.attempt,
                reason = e.reason.as_deref(),
                "{label}"
            ),
            EventKind::RetryScheduled | EventKind::PollScheduled => tracing::debug!(
                target: "reqvisor",
                request,
                generation = e.generation,
                attempt = e.attempt,
                delay_ms = e.delay_ms,
                source = ?e.poll_source,
                "{label}"
            ),
            _ => tracing::debug!(
                target: "reqvisor",
                request,
                generation = e.generation,
                attempt = e.attempt,
                reason = e.reason.as_deref(),
                "{label}"
            ),
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
