//! # Caller-facing request configuration.
//!
//! [`RequestOptions`] describes a logical request in terms of the trigger
//! context `C`: every shape field (URL, query, body, method, extra options) is
//! either a static value or a function of the context. Resolution happens in
//! [`RequestDescriptor::resolve`](crate::RequestDescriptor::resolve).
//!
//! The non-shape fields (`delay`, `mock_response`, `preserve_response`,
//! `policy`) are read from the handle's *live* options at the moment they are
//! needed, so they can be swapped with
//! [`RequestHandle::update_options`](crate::RequestHandle::update_options)
//! without restarting a running chain.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use reqvisor::{Method, Policy, RequestOptions};
//! use serde_json::Value;
//!
//! let opts: RequestOptions<Value, String> = RequestOptions::new()
//!     .name("country")
//!     .url_with(|iso3: &String| Some(format!("/countries/{iso3}")))
//!     .method(Method::Get)
//!     .delay(Duration::from_millis(200))
//!     .policy(Policy::new().poll_every(Duration::from_secs(30)));
//! ```

use std::{sync::Arc, time::Duration};

use serde_json::Value;

use super::{
    descriptor::{Body, ExtraOptions},
    method::Method,
    params::UrlParams,
};
use crate::policies::Policy;

type Resolver<C, V> = Arc<dyn Fn(&C) -> Option<V> + Send + Sync>;

/// A request field: unset, a static value, or a function of the context.
pub enum Field<C, V> {
    Unset,
    Value(V),
    With(Resolver<C, V>),
}

impl<C, V: Clone> Field<C, V> {
    /// Resolves the field. Functions yield `None` while no context is known.
    pub fn resolve(&self, context: Option<&C>) -> Option<V> {
        match self {
            Field::Unset => None,
            Field::Value(v) => Some(v.clone()),
            Field::With(f) => context.and_then(|c| f(c)),
        }
    }
}

impl<C, V: Clone> Clone for Field<C, V> {
    fn clone(&self) -> Self {
        match self {
            Field::Unset => Field::Unset,
            Field::Value(v) => Field::Value(v.clone()),
            Field::With(f) => Field::With(Arc::clone(f)),
        }
    }
}

/// Configuration of one logical request call site.
pub struct RequestOptions<T, C> {
    pub(crate) name: Option<Arc<str>>,
    pub(crate) url: Field<C, String>,
    pub(crate) query: Field<C, UrlParams>,
    pub(crate) body: Field<C, Body>,
    pub(crate) method: Field<C, Method>,
    pub(crate) other: Field<C, ExtraOptions>,

    pub(crate) delay: Option<Duration>,
    pub(crate) mock_response: Option<T>,
    pub(crate) preserve_response: bool,
    pub(crate) policy: Policy<T, C>,
}

impl<T, C> Default for RequestOptions<T, C> {
    fn default() -> Self {
        Self {
            name: None,
            url: Field::Unset,
            query: Field::Unset,
            body: Field::Unset,
            method: Field::Unset,
            other: Field::Unset,
            delay: None,
            mock_response: None,
            preserve_response: false,
            policy: Policy::default(),
        }
    }
}

impl<T: Clone, C> Clone for RequestOptions<T, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            url: self.url.clone(),
            query: self.query.clone(),
            body: self.body.clone(),
            method: self.method.clone(),
            other: self.other.clone(),
            delay: self.delay,
            mock_response: self.mock_response.clone(),
            preserve_response: self.preserve_response,
            policy: self.policy.clone(),
        }
    }
}

impl<T, C> RequestOptions<T, C> {
    /// Empty options (no URL: not eligible until one is set).
    pub fn new() -> Self {
        Self::default()
    }

    /// Label used in logs and events.
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Static URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Field::Value(url.into());
        self
    }

    /// URL derived from the context (`None` means "not eligible").
    pub fn url_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&C) -> Option<String> + Send + Sync + 'static,
    {
        self.url = Field::With(Arc::new(f));
        self
    }

    /// Static query parameters.
    pub fn query(mut self, query: UrlParams) -> Self {
        self.query = Field::Value(query);
        self
    }

    /// Query parameters derived from the context.
    pub fn query_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&C) -> Option<UrlParams> + Send + Sync + 'static,
    {
        self.query = Field::With(Arc::new(f));
        self
    }

    /// Static body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Field::Value(body.into());
        self
    }

    /// Body derived from the context.
    pub fn body_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&C) -> Option<Body> + Send + Sync + 'static,
    {
        self.body = Field::With(Arc::new(f));
        self
    }

    /// Static method (default `GET`).
    pub fn method(mut self, method: Method) -> Self {
        self.method = Field::Value(method);
        self
    }

    /// Method derived from the context (`None` falls back to `GET`).
    pub fn method_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&C) -> Option<Method> + Send + Sync + 'static,
    {
        self.method = Field::With(Arc::new(f));
        self
    }

    /// Static extra wire options.
    pub fn other(mut self, other: ExtraOptions) -> Self {
        self.other = Field::Value(other);
        self
    }

    /// Extra wire options derived from the context.
    pub fn other_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&C) -> Option<ExtraOptions> + Send + Sync + 'static,
    {
        self.other = Field::With(Arc::new(f));
        self
    }

    /// Debounce delay before the first exchange of every generation.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Static payload: eligible triggers settle immediately with this value.
    pub fn mock_response(mut self, response: T) -> Self {
        self.mock_response = Some(response);
        self
    }

    /// Keep the previous response/error visible while a new generation runs.
    pub fn preserve_response(mut self, preserve: bool) -> Self {
        self.preserve_response = preserve;
        self
    }

    /// Retry/poll policy and settlement callbacks.
    pub fn policy(mut self, policy: Policy<T, C>) -> Self {
        self.policy = policy;
        self
    }

    /// Shortcut for [`Policy::should_retry`].
    pub fn should_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&T>, u32, &C) -> Option<Duration> + Send + Sync + 'static,
    {
        self.policy = self.policy.should_retry(f);
        self
    }

    /// Shortcut for [`Policy::should_poll`].
    pub fn should_poll<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&T>, &C) -> Option<Duration> + Send + Sync + 'static,
    {
        self.policy = self.policy.should_poll(f);
        self
    }

    /// Shortcut for [`Policy::on_success`].
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&T>, &C) + Send + Sync + 'static,
    {
        self.policy = self.policy.on_success(f);
        self
    }

    /// Shortcut for [`Policy::on_failure`].
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &C) + Send + Sync + 'static,
    {
        self.policy = self.policy.on_failure(f);
        self
    }
}
