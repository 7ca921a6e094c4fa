//! # Client: ambient request context.
//!
//! A [`Client`] is created once per process (or per API) and shared by every
//! request handle. It owns:
//! - the [`Config`];
//! - the [`Transport`] performing exchanges;
//! - the current [`Transform`] (snapshotted by each generation at start);
//! - the event [`Bus`] and, when subscribers are configured, the listener task
//!   fanning events out to a [`SubscriberSet`].
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use reqvisor::{Client, Config, FnTransform, RequestOptions};
//! use serde_json::Value;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = Client::builder(Config::default())
//!         .with_transform(FnTransform::new().url(|u| format!("https://api.example.org{u}")))
//!         .build();
//!
//!     let countries = client.lazy_request(
//!         RequestOptions::<Value, ()>::new().name("countries").url("/countries/"),
//!     );
//!     countries.trigger(());
//!     let state = countries.settled().await;
//!     println!("{:?}", state.response);
//! }
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    config::Config,
    core::handle::RequestHandle,
    events::{Bus, Event},
    policies::Slot,
    request::RequestOptions,
    subscribers::{Subscribe, SubscriberSet},
    transform::{JsonTransform, Transform},
    transport::Transport,
};

/// Shared ambient context for request handles.
pub struct Client {
    config: Config,
    bus: Bus,
    transport: Arc<dyn Transport>,
    transform: Slot<dyn Transform>,
}

impl Client {
    /// Starts building a client.
    pub fn builder(config: Config) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Client with default config, transport and transform, and no subscribers.
    pub fn new() -> Arc<Self> {
        ClientBuilder::new(Config::default()).build()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Receiver over all events published by this client's handles.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Installs a new transform. Running generations keep the one they started with.
    pub fn set_transform(&self, transform: impl Transform) {
        self.transform.store(Arc::new(transform));
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    pub(crate) fn transform(&self) -> Arc<dyn Transform> {
        self.transform.load()
    }

    /// Creates a handle that stays idle until [`RequestHandle::trigger`].
    pub fn lazy_request<T, C>(
        self: &Arc<Self>,
        options: RequestOptions<T, C>,
    ) -> RequestHandle<T, C>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
        C: Clone + Send + Sync + 'static,
    {
        RequestHandle::new(Arc::clone(self), options)
    }

    /// Creates a handle and triggers it immediately with `context`.
    ///
    /// # Panics
    /// Same as [`RequestHandle::trigger`].
    pub fn request<T, C>(
        self: &Arc<Self>,
        options: RequestOptions<T, C>,
        context: C,
    ) -> RequestHandle<T, C>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
        C: Clone + Send + Sync + 'static,
    {
        let handle = self.lazy_request(options);
        handle.trigger(context);
        handle
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
    transform: Option<Arc<dyn Transform>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ClientBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transport: None,
            transform: None,
            subscribers: Vec::new(),
        }
    }

    pub fn with_transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_transform(mut self, transform: impl Transform) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the client.
    ///
    /// # Panics
    /// With subscribers configured this spawns the listener task, and panics
    /// if called outside a tokio runtime.
    pub fn build(self) -> Arc<Client> {
        let bus = Bus::new(self.config.bus_capacity_clamped());
        if !self.subscribers.is_empty() {
            spawn_listener(bus.subscribe(), SubscriberSet::new(self.subscribers));
        }

        let transport = self.transport.unwrap_or_else(default_transport);
        let transform = self
            .transform
            .unwrap_or_else(|| Arc::new(JsonTransform) as Arc<dyn Transform>);

        Arc::new(Client {
            config: self.config,
            bus,
            transport,
            transform: Slot::new(transform),
        })
    }
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Arc<dyn Transport> {
    Arc::new(crate::transport::ReqwestTransport::new())
}

#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Arc<dyn Transport> {
    Arc::new(crate::transport::UnconfiguredTransport)
}

/// Forwards bus events to the subscriber set until every sender is gone.
fn spawn_listener(mut rx: broadcast::Receiver<Event>, set: SubscriberSet) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "subscriber listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}
