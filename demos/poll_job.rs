//! # Example: polling an export job
//!
//! A simulated export endpoint answers `404` until the job exists, then
//! `{"status":"running"}` a few times, then `{"status":"done"}`.
//!
//! The handle polls on failure until the job appears, then polls on success
//! while it is running. Every lifecycle event is logged through `tracing`.
//!
//! ```text
//! RUST_LOG=reqvisor=debug cargo run --example poll_job
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqvisor::{
    Client, Config, LogWriter, RequestOptions, Subscribe, Transport, TransportError, WireRequest,
    WireResponse,
};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Deserialize)]
struct Job {
    id: u64,
    status: String,
}

/// Fake export service.
#[derive(Default)]
struct ExportServer {
    calls: AtomicUsize,
}

#[async_trait]
impl Transport for ExportServer {
    async fn send(&self, url: &str, _req: &WireRequest) -> Result<WireResponse, TransportError> {
        tokio::time::sleep(Duration::from_millis(80)).await;
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        println!("[server] {url} call={n}");
        Ok(match n {
            0 | 1 => WireResponse::new(404, r#"{"errors":{"detail":"job not created yet"}}"#),
            2..=4 => WireResponse::new(200, r#"{"id":42,"status":"running"}"#),
            _ => WireResponse::new(200, r#"{"id":42,"status":"done"}"#),
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reqvisor=debug")),
        )
        .init();

    let client = Client::builder(Config::default())
        .with_transport(ExportServer::default())
        .with_subscribers(vec![Arc::new(LogWriter) as Arc<dyn Subscribe>])
        .build();

    let job = client.request(
        RequestOptions::<Job, u64>::new()
            .name("export-job")
            .url_with(|id| Some(format!("/exports/{id}/")))
            .should_poll(|job, _| match job {
                None => Some(Duration::from_millis(300)),
                Some(j) if j.status == "running" => Some(Duration::from_millis(500)),
                Some(_) => None,
            })
            .on_success(|job, id| println!("[app] export {id}: {job:?}"))
            .on_failure(|err, id| println!("[app] export {id} failed: {err}")),
        42,
    );

    while job.pending() {
        job.changed().await;
        if let Some(j) = job.response() {
            println!("[app] pending={} status={} id={}", job.pending(), j.status, j.id);
        }
    }

    let state = job.state();
    println!("[app] settled: response={:?} error={:?}", state.response, state.error);
}
