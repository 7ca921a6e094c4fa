//! Retry / poll policy and delay helpers.
//!
//! ## Contents
//! - [`Policy`]        the four caller hooks consulted by the executor
//! - [`BackoffPolicy`] delay schedule for `retry_while`
//! - [`JitterPolicy`]  randomisation of computed delays
//! - `Slot`            shared cell the executor re-reads at each decision point
//!
//! ## Quick wiring
//! ```text
//! RequestOptions { policy: Policy, .. }
//!      └─► stored in the handle's live Slot
//!           └─► executor loads the slot before every retry / poll / callback decision
//! ```

mod backoff;
mod jitter;
mod policy;
mod slot;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use policy::{FailureFn, PollFn, Policy, RetryFn, SuccessFn};
pub(crate) use slot::Slot;
