//! Error types used by the reqvisor runtime and transports.
//!
//! This module defines:
//!
//! - [`TransportError`]: failures raised by a [`Transport`](crate::Transport) while
//!   performing one HTTP exchange.
//! - [`RequestError`]: the classified failure of one attempt, carrying the
//!   structured error value exposed to callers.
//! - [`FailureReason`]: classification of a [`RequestError`].
//!
//! Like the runtime's other error types they provide `as_label` / `as_message`
//! helpers for logs and events.

use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;

/// # Errors produced by a transport.
///
/// Classified as [`FailureReason::Network`] by the executor, except
/// [`TransportError::Body`], which is a [`FailureReason::Parse`] failure.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection could not be established (DNS, refused, TLS).
    #[error("connection failed: {error}")]
    Connect {
        /// The underlying error message.
        error: String,
    },

    /// The exchange exceeded a transport-level timeout.
    #[error("transport timed out")]
    Timeout,

    /// The response body could not be read. Classified as [`FailureReason::Parse`].
    #[error("failed to read response body: {error}")]
    Body {
        /// The underlying error message.
        error: String,
    },

    /// Any other transport failure.
    #[error("transport error: {error}")]
    Other {
        /// The underlying error message.
        error: String,
    },
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use reqvisor::TransportError;
    ///
    /// assert_eq!(TransportError::Timeout.as_label(), "transport_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Connect { .. } => "transport_connect",
            TransportError::Timeout => "transport_timeout",
            TransportError::Body { .. } => "transport_body",
            TransportError::Other { .. } => "transport_other",
        }
    }
}

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Transport-level failure (DNS, connection, abort).
    Network,
    /// Non-empty body that is not valid JSON (or not the expected payload).
    Parse,
    /// The server answered but signalled an application-level failure.
    Application,
}

impl FailureReason {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            FailureReason::Network => "network",
            FailureReason::Parse => "parse",
            FailureReason::Application => "application",
        }
    }
}

/// Underlying cause kept for diagnostics only (never exposed through the state).
#[derive(Debug, Clone)]
pub enum FailureSource {
    Transport(Arc<TransportError>),
    Parse(Arc<serde_json::Error>),
}

impl std::fmt::Display for FailureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureSource::Transport(e) => write!(f, "{e}"),
            FailureSource::Parse(e) => write!(f, "{e}"),
        }
    }
}

/// # Classified failure of one attempt.
///
/// `value` is the structured error payload handed to `on_failure` and exposed as
/// [`Snapshot::error`](crate::Snapshot::error). The reason and source are diagnostic
/// metadata: they are logged and published on the bus, not stored in the state.
#[derive(Error, Debug, Clone)]
#[error("{} failure: {value}", .reason.as_label())]
pub struct RequestError {
    /// What kind of failure this is.
    pub reason: FailureReason,
    /// Structured error value (e.g. `{"nonFieldErrors": ["boom"]}`).
    pub value: Value,
    /// Optional machine-readable code sent by the server (`errorCode`).
    pub error_code: Option<i64>,
    /// Underlying cause, if any.
    pub cause: Option<FailureSource>,
}

impl RequestError {
    /// A transport failure, with the generic `Network error` value.
    pub fn network(err: TransportError) -> Self {
        Self {
            reason: FailureReason::Network,
            value: non_field_errors("Network error"),
            error_code: None,
            cause: Some(FailureSource::Transport(Arc::new(err))),
        }
    }

    /// A body that failed to parse, with the generic `JSON parse error` value.
    pub fn parse(err: serde_json::Error) -> Self {
        Self {
            reason: FailureReason::Parse,
            value: non_field_errors("JSON parse error"),
            error_code: None,
            cause: Some(FailureSource::Parse(Arc::new(err))),
        }
    }

    /// A response body that could not be read; classified like a parse failure.
    pub fn unreadable_body(err: TransportError) -> Self {
        Self {
            reason: FailureReason::Parse,
            value: non_field_errors("JSON parse error"),
            error_code: None,
            cause: Some(FailureSource::Transport(Arc::new(err))),
        }
    }

    /// A server-signalled failure.
    pub fn application(value: Value, error_code: Option<i64>) -> Self {
        Self {
            reason: FailureReason::Application,
            value,
            error_code,
            cause: None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use reqvisor::RequestError;
    /// use serde_json::json;
    ///
    /// let err = RequestError::application(json!({"detail": "nope"}), Some(42));
    /// assert_eq!(err.as_label(), "request_application");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self.reason {
            FailureReason::Network => "request_network",
            FailureReason::Parse => "request_parse",
            FailureReason::Application => "request_application",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match (&self.cause, self.error_code) {
            (Some(src), _) => format!("{}: {src}", self.reason.as_label()),
            (None, Some(code)) => {
                format!("{}: code={code} value={}", self.reason.as_label(), self.value)
            }
            (None, None) => format!("{}: value={}", self.reason.as_label(), self.value),
        }
    }
}

/// Builds the `{"nonFieldErrors": [msg]}` envelope used for synthesized failures.
pub(crate) fn non_field_errors(msg: impl Into<String>) -> Value {
    json!({ "nonFieldErrors": [msg.into()] })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_carries_generic_value() {
        let err = RequestError::network(TransportError::Connect {
            error: "refused".into(),
        });
        assert_eq!(err.reason, FailureReason::Network);
        assert_eq!(err.value, json!({"nonFieldErrors": ["Network error"]}));
        assert!(err.as_message().contains("refused"));
    }

    #[test]
    fn parse_error_carries_generic_value() {
        let cause = serde_json::from_str::<Value>("{not json").unwrap_err();
        let err = RequestError::parse(cause);
        assert_eq!(err.as_label(), "request_parse");
        assert_eq!(err.value, json!({"nonFieldErrors": ["JSON parse error"]}));
    }

    #[test]
    fn unreadable_body_is_a_parse_failure() {
        let err = RequestError::unreadable_body(TransportError::Body {
            error: "connection reset".into(),
        });
        assert_eq!(err.reason, FailureReason::Parse);
        assert_eq!(err.value, json!({"nonFieldErrors": ["JSON parse error"]}));
        assert!(err.as_message().contains("connection reset"));
    }

    #[test]
    fn application_message_includes_code() {
        let err = RequestError::application(json!({"detail": "x"}), Some(7));
        assert!(err.as_message().contains("code=7"));
        assert!(err.cause.is_none());
    }
}
