//! # Transform pipeline.
//!
//! Turns a resolved [`RequestDescriptor`](crate::RequestDescriptor) into the
//! final URL and wire request handed to the [`Transport`](crate::Transport).
//! A [`Transform`] is deployment-wide ambient configuration installed on the
//! [`Client`](crate::Client); each generation snapshots it once at start.
//!
//! ## Default behaviour ([`JsonTransform`])
//! - URL unchanged;
//! - method `GET` unless the caller set one;
//! - `Accept: application/json`, `Content-Type: application/json; charset=utf-8`,
//!   caller headers merged over these;
//! - a JSON body is serialised with `serde_json`, a text body is sent as-is;
//!   a falsy body (`null`, `false`, `0`, empty string) is not sent at all.

use std::{sync::Arc, time::Duration};

use serde_json::Value;

use crate::request::{Body, Headers, Method};

/// Request options before the transform: what the caller resolved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestInit {
    pub method: Option<Method>,
    pub headers: Headers,
    pub body: Option<Body>,
    pub timeout: Option<Duration>,
}

/// Request options after the transform: what goes on the wire.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WireRequest {
    pub method: Method,
    pub headers: Headers,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

/// Deployment-specific request shaping (base URL, auth headers, encoding).
pub trait Transform: Send + Sync + 'static {
    /// Maps the caller URL to the URL actually fetched.
    fn transform_url(&self, url: &str) -> String;

    /// Maps caller options to the wire request. `url` is the untransformed URL.
    fn transform_options(&self, url: &str, init: RequestInit) -> WireRequest;
}

/// Applies the default JSON shaping to `init`.
///
/// # Example
/// ```rust
/// use reqvisor::{Method, RequestInit, process_options};
///
/// let wire = process_options(RequestInit::default());
/// assert_eq!(wire.method, Method::Get);
/// assert_eq!(wire.headers["Accept"], "application/json");
/// assert!(wire.body.is_none());
/// ```
pub fn process_options(init: RequestInit) -> WireRequest {
    let mut headers = Headers::new();
    headers.insert("Accept".into(), "application/json".into());
    headers.insert("Content-Type".into(), "application/json; charset=utf-8".into());
    headers.extend(init.headers);

    let body = init.body.and_then(encode_body);

    WireRequest {
        method: init.method.unwrap_or_default(),
        headers,
        body,
        timeout: init.timeout,
    }
}

/// Falsy bodies (`null`, `false`, `0`, `""`) are sent without a body.
fn encode_body(body: Body) -> Option<String> {
    match body {
        Body::Json(Value::Null | Value::Bool(false)) => None,
        Body::Json(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Body::Json(Value::String(s)) if s.is_empty() => None,
        Body::Json(v) => Some(v.to_string()),
        Body::Text(s) if s.is_empty() => None,
        Body::Text(s) => Some(s),
    }
}

/// The default transform.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonTransform;

impl Transform for JsonTransform {
    fn transform_url(&self, url: &str) -> String {
        url.to_owned()
    }

    fn transform_options(&self, _url: &str, init: RequestInit) -> WireRequest {
        process_options(init)
    }
}

type UrlFn = Arc<dyn Fn(&str) -> String + Send + Sync>;
type OptionsFn = Arc<dyn Fn(&str, RequestInit) -> WireRequest + Send + Sync>;

/// Transform built from two closures.
///
/// Either closure falls back to [`JsonTransform`] when not set.
///
/// # Example
/// ```rust
/// use reqvisor::{FnTransform, Transform, RequestInit, process_options};
///
/// let t = FnTransform::new()
///     .url(|u| format!("https://api.example.org{u}"))
///     .options(|_, mut init| {
///         init.headers.insert("Authorization".into(), "Token abc".into());
///         process_options(init)
///     });
///
/// assert_eq!(t.transform_url("/countries/"), "https://api.example.org/countries/");
/// assert_eq!(t.transform_options("/", RequestInit::default()).headers["Authorization"], "Token abc");
/// ```
#[derive(Clone, Default)]
pub struct FnTransform {
    url: Option<UrlFn>,
    options: Option<OptionsFn>,
}

impl FnTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.url = Some(Arc::new(f));
        self
    }

    pub fn options<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, RequestInit) -> WireRequest + Send + Sync + 'static,
    {
        self.options = Some(Arc::new(f));
        self
    }
}

impl Transform for FnTransform {
    fn transform_url(&self, url: &str) -> String {
        match &self.url {
            Some(f) => f(url),
            None => url.to_owned(),
        }
    }

    fn transform_options(&self, url: &str, init: RequestInit) -> WireRequest {
        match &self.options {
            Some(f) => f(url, init),
            None => process_options(init),
        }
    }
}
