//! # Network collaborator.
//!
//! [`Transport`] performs exactly one HTTP exchange: it sends a [`WireRequest`] and
//! returns the status and the full body text. Classification (network / parse /
//! application) happens in the executor, not here.
//!
//! - [`ReqwestTransport`] (feature `reqwest`, default) is the production transport.
//! - [`UnconfiguredTransport`] fails every exchange; it is the default when the
//!   crate is built without `reqwest` and no transport was installed.

#[cfg(feature = "reqwest")]
mod reqwest;

use async_trait::async_trait;

use crate::{error::TransportError, transform::WireRequest};

#[cfg(feature = "reqwest")]
pub use self::reqwest::ReqwestTransport;

/// Status and body of one completed exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

impl WireResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one HTTP exchange.
///
/// Implementations must be cancel-safe: the executor drops the returned future
/// when the generation is superseded.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, url: &str, request: &WireRequest) -> Result<WireResponse, TransportError>;
}

/// Transport that refuses every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredTransport;

#[async_trait]
impl Transport for UnconfiguredTransport {
    async fn send(
        &self,
        url: &str,
        _request: &WireRequest,
    ) -> Result<WireResponse, TransportError> {
        Err(TransportError::Other {
            error: format!("no transport configured for {url}"),
        })
    }
}
