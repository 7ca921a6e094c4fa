//! # Resolved request shape.
//!
//! [`RequestDescriptor`] is what a [`RequestOptions`] turns into once a trigger
//! context is known. One descriptor is resolved per generation and shared
//! immutably with its executor.
//!
//! ## Eligibility
//! A descriptor is *fetchable* when:
//! - the (query-extended) URL is present and non-empty;
//! - the method is not body-bearing (`PUT`/`PATCH`/`POST`), or a body is present.

use std::{collections::BTreeMap, time::Duration};

use serde::Serialize;
use serde_json::Value;

use super::{
    method::Method,
    options::RequestOptions,
    params::{UrlParams, prepare_url_params},
};

/// Header map used on the wire (names are sent as given).
pub type Headers = BTreeMap<String, String>;

/// Request body.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Structured body, serialized as JSON by the default transform.
    Json(Value),
    /// Raw text body, sent verbatim.
    Text(String),
}

impl Body {
    /// Serializes any `Serialize` value into a JSON body.
    pub fn json<S: Serialize + ?Sized>(value: &S) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Body::Json)
    }
}

impl From<Value> for Body {
    fn from(v: Value) -> Self {
        Body::Json(v)
    }
}

impl From<String> for Body {
    fn from(v: String) -> Self {
        Body::Text(v)
    }
}

/// Extra wire options merged into the request before the transform runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtraOptions {
    /// Headers merged over the transform's defaults.
    pub headers: Headers,
    /// Per-exchange transport timeout.
    pub timeout: Option<Duration>,
}

impl ExtraOptions {
    /// Returns options with one extra header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns options with a transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Resolved request for one generation.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    /// URL with the encoded query appended (`url?query`), if any.
    pub url: Option<String>,
    pub method: Method,
    pub query: Option<UrlParams>,
    pub body: Option<Body>,
    pub other: ExtraOptions,
}

impl RequestDescriptor {
    /// Resolves `options` against `context`.
    ///
    /// Context-dependent fields resolve to `None` while no context is known;
    /// static fields resolve regardless.
    pub fn resolve<T, C>(options: &RequestOptions<T, C>, context: Option<&C>) -> Self {
        let query = options.query.resolve(context);
        let url = options.url.resolve(context).map(|url| {
            match query.as_ref().map(prepare_url_params) {
                Some(q) if !q.is_empty() => format!("{url}?{q}"),
                _ => url,
            }
        });

        Self {
            url,
            method: options.method.resolve(context).unwrap_or_default(),
            query,
            body: options.body.resolve(context),
            other: options.other.resolve(context).unwrap_or_default(),
        }
    }

    /// Returns true when the request may be issued.
    pub fn is_fetchable(&self) -> bool {
        let has_url = self.url.as_deref().is_some_and(|u| !u.is_empty());
        has_url && (!self.method.is_body_bearing() || self.body.is_some())
    }
}
