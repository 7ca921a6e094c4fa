//! # Example: debounced search with superseding triggers
//!
//! Each keystroke triggers the handle with the current query. A 250ms debounce
//! collapses bursts, and a newer trigger cancels the older generation so a slow
//! answer for an old query never replaces a newer one.

use std::time::Duration;

use async_trait::async_trait;
use reqvisor::{
    Client, Config, FnTransform, Param, RequestOptions, Transport, TransportError, UrlParams,
    WireRequest, WireResponse, process_options,
};
use serde_json::{Value, json};

/// Echoes the query back; shorter queries are slower to answer.
struct SearchServer;

#[async_trait]
impl Transport for SearchServer {
    async fn send(&self, url: &str, req: &WireRequest) -> Result<WireResponse, TransportError> {
        let q = url.split("q=").nth(1).unwrap_or_default().to_owned();
        let slow = Duration::from_millis(900u64.saturating_sub(q.len() as u64 * 150));
        let auth = req.headers.get("Authorization");
        println!("[server] {url} (auth={auth:?}, answering in {slow:?})");
        tokio::time::sleep(slow).await;
        Ok(WireResponse::new(200, json!({ "q": q, "hits": q.len() * 3 }).to_string()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let client = Client::builder(Config {
        default_delay: Duration::from_millis(250),
        ..Config::default()
    })
    .with_transport(SearchServer)
    .with_transform(
        FnTransform::new()
            .url(|u| format!("https://search.example.org{u}"))
            .options(|_, mut init| {
                init.headers.insert("Authorization".into(), "Token demo".into());
                process_options(init)
            }),
    )
    .build();

    let search = client.lazy_request(
        RequestOptions::<Value, String>::new()
            .name("search")
            .url("/countries/")
            .query_with(|q| {
                let mut params = UrlParams::new();
                params.insert("q".into(), Param::from(q.as_str()));
                Some(params)
            })
            .preserve_response(true)
            .on_success(|v, q| println!("[app] results for {q:?}: {v:?}")),
    );

    for typed in ["n", "ne", "nep"] {
        search.trigger(typed.to_owned());
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    tokio::time::sleep(Duration::from_millis(600)).await;
    search.trigger("nepal".to_owned());
    println!("[app] typing again; previous results kept: {:?}", search.response());

    let state = search.settled().await;
    println!(
        "[app] final {:?} -> {:?} (generation {})",
        state.context,
        state.response,
        search.generation()
    );
}
