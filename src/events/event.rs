//! # Request lifecycle events.
//!
//! [`EventKind`] classifies what happened to a request handle:
//! - **Generation events**: a generation started, was superseded, or was torn down;
//! - **Attempt events**: one exchange is starting or failed;
//! - **Scheduling events**: a retry or a poll round was scheduled;
//! - **Terminal events**: the generation settled (success, failure, mock);
//! - **Guard events**: a result arrived for a generation that is no longer current.
//!
//! The [`Event`] struct carries the request label, generation id, attempt number,
//! delay and reason where relevant.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore publication order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use reqvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_request("job-status")
//!     .with_generation(3)
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(500));
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.request.as_deref(), Some("job-status"));
//! assert_eq!(ev.delay_ms, Some(500));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Generation events ===
    /// A new generation was minted and its executor spawned.
    ///
    /// Sets: `request`, `generation`.
    GenerationStarted,

    /// The previous generation's token was cancelled by a newer trigger or shape change.
    ///
    /// Sets: `request`, `generation` (the superseded one).
    GenerationSuperseded,

    /// The handle was torn down; the live generation (if any) was cancelled.
    ///
    /// Sets: `request`, `generation` (latest minted, may be 0).
    TornDown,

    // === Attempt events ===
    /// An exchange is about to be sent.
    ///
    /// Sets: `request`, `generation`, `attempt`.
    AttemptStarting,

    /// An exchange failed (network, parse or application).
    ///
    /// Sets: `request`, `generation`, `attempt`, `reason`.
    AttemptFailed,

    // === Scheduling events ===
    /// `should_retry` asked for another attempt.
    ///
    /// Sets: `request`, `generation`, `attempt` (the one that just ran), `delay_ms`.
    RetryScheduled,

    /// `should_poll` asked for another round.
    ///
    /// Sets: `request`, `generation`, `delay_ms`, `poll_source`.
    PollScheduled,

    // === Terminal events ===
    /// The generation settled with a payload (or an empty body).
    ///
    /// Sets: `request`, `generation`, `attempt`.
    RequestSucceeded,

    /// The generation settled with an error.
    ///
    /// Sets: `request`, `generation`, `attempt`, `reason`.
    RequestFailed,

    /// The mock response was applied without touching the network.
    ///
    /// Sets: `request`, `generation`.
    MockResolved,

    // === Guard events ===
    /// A write or callback was rejected because the generation is no longer current.
    ///
    /// Sets: `request`, `generation`, `reason`.
    StaleDropped,
}

impl EventKind {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::GenerationStarted => "generation_started",
            EventKind::GenerationSuperseded => "generation_superseded",
            EventKind::TornDown => "torn_down",
            EventKind::AttemptStarting => "attempt_starting",
            EventKind::AttemptFailed => "attempt_failed",
            EventKind::RetryScheduled => "retry_scheduled",
            EventKind::PollScheduled => "poll_scheduled",
            EventKind::RequestSucceeded => "request_succeeded",
            EventKind::RequestFailed => "request_failed",
            EventKind::MockResolved => "mock_resolved",
            EventKind::StaleDropped => "stale_dropped",
        }
    }
}

/// What triggered a poll round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSource {
    Success,
    Failure,
}

/// Lifecycle event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Request label (from `RequestOptions::name` or the client default).
    pub request: Option<Arc<str>>,
    /// Generation id the event belongs to.
    pub generation: Option<u64>,
    /// Attempt counter within the generation (1-based, reset by polls).
    pub attempt: Option<u32>,
    /// Scheduled delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (error label/message, stale field, ...).
    pub reason: Option<Arc<str>>,
    /// Set on `PollScheduled`.
    pub poll_source: Option<PollSource>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            request: None,
            generation: None,
            attempt: None,
            delay_ms: None,
            reason: None,
            poll_source: None,
        }
    }

    #[inline]
    pub fn with_request(mut self, request: impl Into<Arc<str>>) -> Self {
        self.request = Some(request.into());
        self
    }

    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_poll_source(mut self, source: PollSource) -> Self {
        self.poll_source = Some(source);
        self
    }

    /// True for events that end a generation's visible work.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::RequestSucceeded | EventKind::RequestFailed | EventKind::MockResolved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::AttemptStarting);
        let b = Event::new(EventKind::AttemptStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_saturates() {
        let ev = Event::new(EventKind::PollScheduled).with_delay(Duration::from_secs(u64::MAX / 2));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn terminal_kinds() {
        assert!(Event::new(EventKind::MockResolved).is_terminal());
        assert!(!Event::new(EventKind::RetryScheduled).is_terminal());
    }
}
