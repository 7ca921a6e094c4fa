//! # Cancellable sleep.
//!
//! [`sleep`] suspends the current task for a duration or until the generation's
//! [`CancellationToken`] fires, whichever happens first.
//!
//! ## Rules
//! - Cancellation wakes the sleeper immediately (no leaked timer).
//! - `Duration::ZERO` still yields once, so a cancellation requested in the same
//!   tick is observed.
//! - An already-cancelled token fails without sleeping.

use std::time::Duration;

use thiserror::Error;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

/// Returned when the token fired before the sleep elapsed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("sleep cancelled")]
pub struct Cancelled;

/// Sleeps for `duration` unless `token` is cancelled first.
pub async fn sleep(duration: Duration, token: &CancellationToken) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        return Err(Cancelled);
    }

    if duration.is_zero() {
        tokio::task::yield_now().await;
        return if token.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        };
    }

    let timer = time::sleep(duration);
    tokio::pin!(timer);
    select! {
        biased;
        _ = token.cancelled() => Err(Cancelled),
        _ = &mut timer => Ok(()),
    }
}
