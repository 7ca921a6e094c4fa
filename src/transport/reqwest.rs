//! Production transport backed by [`reqwest`].

use async_trait::async_trait;

use super::{Transport, WireResponse};
use crate::{error::TransportError, request::Method, transform::WireRequest};

/// [`Transport`] over a shared [`reqwest::Client`].
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (proxies, TLS roots, default timeout).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect {
            error: err.to_string(),
        }
    } else {
        TransportError::Other {
            error: err.to_string(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, url: &str, request: &WireRequest) -> Result<WireResponse, TransportError> {
        let mut builder = self.client.request(map_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Body {
                    error: e.to_string(),
                }
            }
        })?;

        Ok(WireResponse { status, body })
    }
}
