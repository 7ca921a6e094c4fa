//! Visible state and per-attempt outcome.

use serde_json::Value;

use crate::error::RequestError;

/// What a handle exposes to its consumer.
///
/// `error` carries only the structured error value; the failure reason and
/// underlying cause are logged and published as events.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<T, C> {
    pub pending: bool,
    pub response: Option<T>,
    pub error: Option<Value>,
    pub context: Option<C>,
}

impl<T, C> Default for Snapshot<T, C> {
    fn default() -> Self {
        Self {
            pending: false,
            response: None,
            error: None,
            context: None,
        }
    }
}

/// Result of one exchange.
#[derive(Debug)]
pub enum Outcome<T> {
    /// 2xx without an error envelope. `None` for an empty body.
    Success(Option<T>),
    /// Network, parse or application failure.
    Failure(RequestError),
    /// The generation's token fired; no side effects follow.
    Cancelled,
}
