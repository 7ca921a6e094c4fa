#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqvisor::{Client, Config, Transport, TransportError, WireRequest, WireResponse};

/// What the scripted server does for one call.
#[derive(Clone, Debug)]
pub enum Step {
    Respond { status: u16, body: String, after: Duration },
    Fail { after: Duration },
    Hang,
}

impl Step {
    pub fn ok(body: &str) -> Self {
        Step::Respond {
            status: 200,
            body: body.to_owned(),
            after: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Step::Respond {
            status,
            body: body.to_owned(),
            after: Duration::ZERO,
        }
    }

    pub fn after(self, d: Duration) -> Self {
        match self {
            Step::Respond { status, body, .. } => Step::Respond { status, body, after: d },
            Step::Fail { .. } => Step::Fail { after: d },
            Step::Hang => Step::Hang,
        }
    }
}

type Script = dyn Fn(&str, usize) -> Step + Send + Sync;

/// In-memory transport answering from a script of `(url, call index) -> Step`.
pub struct Scripted {
    script: Box<Script>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, WireRequest)>>,
}

impl Scripted {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&str, usize) -> Step + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Answers call `i` with `steps[i]`, repeating the last step afterwards.
    pub fn sequence(steps: Vec<Step>) -> Arc<Self> {
        Self::new(move |_, i| steps[i.min(steps.len() - 1)].clone())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(String, WireRequest)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for Scripted {
    async fn send(&self, url: &str, request: &WireRequest) -> Result<WireResponse, TransportError> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((url.to_owned(), request.clone()));
        match (self.script)(url, i) {
            Step::Respond { status, body, after } => {
                tokio::time::sleep(after).await;
                Ok(WireResponse::new(status, body))
            }
            Step::Fail { after } => {
                tokio::time::sleep(after).await;
                Err(TransportError::Connect {
                    error: "connection refused".into(),
                })
            }
            Step::Hang => std::future::pending().await,
        }
    }
}

pub fn client_with(transport: &Arc<Scripted>) -> Arc<Client> {
    Client::builder(Config::default())
        .with_shared_transport(Arc::clone(transport) as Arc<dyn Transport>)
        .build()
}

/// Counts calls and records the values passed to a callback.
#[derive(Clone, Default)]
pub struct Recorder<V> {
    inner: Arc<Mutex<Vec<V>>>,
}

impl<V: Clone> Recorder<V> {
    pub fn push(&self, v: V) {
        self.inner.lock().unwrap().push(v);
    }

    pub fn values(&self) -> Vec<V> {
        self.inner.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}
