//! # One HTTP exchange and its classification.
//!
//! [`exchange`] sends one wire request through the transport, racing it against
//! the generation's token, and classifies the result into an [`Outcome`]:
//!
//! ```text
//! token fired (before/during/after send) ──► Cancelled
//! transport error                         ──► Failure(Network)
//! body could not be read                  ──► Failure(Parse)
//! non-empty body, not JSON                ──► Failure(Parse)
//! non-2xx, or top-level `errors` present  ──► Failure(Application{errors, errorCode})
//! 2xx, empty body                         ──► Success(None)
//! 2xx, JSON body                          ──► Success(Some(T)) | Failure(Parse) if not a T
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{
    core::state::Outcome,
    error::{RequestError, TransportError, non_field_errors},
    transform::WireRequest,
    transport::{Transport, WireResponse},
};

pub(crate) async fn exchange<T: DeserializeOwned>(
    transport: &dyn Transport,
    url: &str,
    request: &WireRequest,
    token: &CancellationToken,
) -> Outcome<T> {
    if token.is_cancelled() {
        return Outcome::Cancelled;
    }

    let res = select! {
        biased;
        _ = token.cancelled() => return Outcome::Cancelled,
        res = transport.send(url, request) => res,
    };

    if token.is_cancelled() {
        return Outcome::Cancelled;
    }

    match res {
        Err(e @ TransportError::Body { .. }) => Outcome::Failure(RequestError::unreadable_body(e)),
        Err(e) => Outcome::Failure(RequestError::network(e)),
        Ok(response) => match classify(response) {
            Ok(payload) => Outcome::Success(payload),
            Err(e) => Outcome::Failure(e),
        },
    }
}

pub(crate) fn classify<T: DeserializeOwned>(
    response: WireResponse,
) -> Result<Option<T>, RequestError> {
    let body: Option<Value> = if response.body.is_empty() {
        None
    } else {
        Some(serde_json::from_str(&response.body).map_err(RequestError::parse)?)
    };

    let errors = body
        .as_ref()
        .and_then(|b| b.get("errors"))
        .filter(|e| !e.is_null())
        .cloned();

    if !response.is_success() || errors.is_some() {
        let error_code = body.as_ref().and_then(|b| b.get("errorCode")).and_then(Value::as_i64);
        let value = errors.unwrap_or_else(|| {
            non_field_errors(format!("Request failed with status {}", response.status))
        });
        return Err(RequestError::application(value, error_code));
    }

    body.map(serde_json::from_value::<T>)
        .transpose()
        .map_err(RequestError::parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureReason;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    fn ok(status: u16, body: &str) -> WireResponse {
        WireResponse::new(status, body)
    }

    #[test]
    fn empty_success_body_has_no_payload() {
        assert_eq!(classify::<Value>(ok(204, "")).unwrap(), None);
    }

    #[test]
    fn server_error_uses_errors_envelope() {
        let body = r#"{"errors":{"nonFieldErrors":["boom"]},"errorCode":12}"#;
        let err = classify::<Value>(ok(500, body)).unwrap_err();
        assert_eq!(err.reason, FailureReason::Application);
        assert_eq!(err.value, json!({"nonFieldErrors": ["boom"]}));
        assert_eq!(err.error_code, Some(12));
    }

    #[test]
    fn server_error_without_envelope_gets_status_message() {
        let err = classify::<Value>(ok(404, "")).unwrap_err();
        assert_eq!(err.value, json!({"nonFieldErrors": ["Request failed with status 404"]}));
    }

    #[test]
    fn envelope_on_2xx_is_application_error() {
        let err = classify::<Value>(ok(200, r#"{"errors":{"field":["bad"]}}"#)).unwrap_err();
        assert_eq!(err.reason, FailureReason::Application);
    }

    #[test]
    fn null_errors_field_is_not_an_envelope() {
        let v = classify::<Value>(ok(200, r#"{"errors":null,"results":[]}"#)).unwrap();
        assert_eq!(v, Some(json!({"errors": null, "results": []})));
    }

    #[test]
    fn invalid_json_is_parse_error_even_on_failure_status() {
        let err = classify::<Value>(ok(502, "<html>bad gateway</html>")).unwrap_err();
        assert_eq!(err.reason, FailureReason::Parse);
    }

    #[test]
    fn payload_shape_mismatch_is_parse_error() {
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Country {
            iso3: String,
        }
        let err = classify::<Country>(ok(200, r#"{"name":"Nepal"}"#)).unwrap_err();
        assert_eq!(err.reason, FailureReason::Parse);
    }

    struct Never;

    #[async_trait]
    impl Transport for Never {
        async fn send(&self, _: &str, _: &WireRequest) -> Result<WireResponse, TransportError> {
            std::future::pending().await
        }
    }

    struct Refused;

    #[async_trait]
    impl Transport for Refused {
        async fn send(&self, _: &str, _: &WireRequest) -> Result<WireResponse, TransportError> {
            Err(TransportError::Connect {
                error: "refused".into(),
            })
        }
    }

    struct Truncated;

    #[async_trait]
    impl Transport for Truncated {
        async fn send(&self, _: &str, _: &WireRequest) -> Result<WireResponse, TransportError> {
            Err(TransportError::Body {
                error: "unexpected end of body".into(),
            })
        }
    }

    #[tokio::test]
    async fn unreadable_body_is_parse_error() {
        let token = CancellationToken::new();
        match exchange::<Value>(&Truncated, "/a", &WireRequest::default(), &token).await {
            Outcome::Failure(e) => assert_eq!(e.reason, FailureReason::Parse),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_in_flight_exchange() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            child.cancel();
        });
        let out = exchange::<Value>(&Never, "/a", &WireRequest::default(), &token).await;
        assert!(matches!(out, Outcome::Cancelled));
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let token = CancellationToken::new();
        match exchange::<Value>(&Refused, "/a", &WireRequest::default(), &token).await {
            Outcome::Failure(e) => assert_eq!(e.reason, FailureReason::Network),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
