mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{Recorder, Scripted, Step, client_with};
use reqvisor::{
    Body, Client, Config, Event, EventKind, FnTransform, Method, Param, Policy, RequestOptions,
    Subscribe, Transport, UrlParams, process_options,
};
use serde_json::{Value, json};
use tokio::time::sleep;

const MS: Duration = Duration::from_millis(1);

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn server_error_settles_with_error_envelope() {
    let transport = Scripted::sequence(vec![Step::status(
        500,
        r#"{"errors":{"nonFieldErrors":["boom"]}}"#,
    )]);
    let client = client_with(&transport);
    let failures = Recorder::<Value>::default();
    let f = failures.clone();

    let handle = client.request(
        RequestOptions::<Value, ()>::new()
            .url("/a")
            .method(Method::Get)
            .on_failure(move |e, _| f.push(e.clone())),
        (),
    );
    let state = handle.settled().await;

    assert!(!state.pending);
    assert_eq!(state.response, None);
    assert_eq!(state.error, Some(json!({"nonFieldErrors": ["boom"]})));
    assert_eq!(failures.values(), vec![json!({"nonFieldErrors": ["boom"]})]);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn network_failure_exposes_generic_error() {
    let transport = Scripted::sequence(vec![Step::Fail { after: MS }]);
    let client = client_with(&transport);

    let handle = client.request(RequestOptions::<Value, ()>::new().url("/down"), ());
    let state = handle.settled().await;

    assert_eq!(state.error, Some(json!({"nonFieldErrors": ["Network error"]})));
    assert_eq!(state.response, None);
}

#[tokio::test(start_paused = true)]
async fn invalid_json_exposes_parse_error() {
    let transport = Scripted::sequence(vec![Step::ok("<html>")]);
    let client = client_with(&transport);

    let handle = client.request(RequestOptions::<Value, ()>::new().url("/html"), ());
    let state = handle.settled().await;

    assert_eq!(state.error, Some(json!({"nonFieldErrors": ["JSON parse error"]})));
}

#[tokio::test(start_paused = true)]
async fn empty_body_is_success_without_payload() {
    let transport = Scripted::sequence(vec![Step::status(204, "")]);
    let client = client_with(&transport);
    let successes = Recorder::<Option<Value>>::default();
    let s = successes.clone();

    let handle = client.request(
        RequestOptions::<Value, ()>::new()
            .url("/x")
            .method(Method::Delete)
            .on_success(move |v, _| s.push(v.cloned())),
        (),
    );
    let state = handle.settled().await;

    assert_eq!(state.response, None);
    assert_eq!(state.error, None);
    assert_eq!(successes.values(), vec![None]);
}

#[tokio::test(start_paused = true)]
async fn retry_repeats_without_visible_flicker() {
    let transport =
        Scripted::new(|_, i| Step::ok(&json!({ "n": i + 1 }).to_string()).after(100 * MS));
    let client = client_with(&transport);
    let successes = Recorder::<Value>::default();
    let s = successes.clone();

    let handle = client.request(
        RequestOptions::<Value, ()>::new()
            .url("/job")
            .should_retry(|_, attempt, _| (attempt < 3).then_some(50 * MS))
            .on_success(move |v, _| s.push(v.cloned().unwrap_or_default())),
        (),
    );

    // First answer arrived at 100ms, second exchange in flight.
    sleep(200 * MS).await;
    let mid = handle.state();
    assert!(mid.pending);
    assert_eq!(mid.response, None);
    assert_eq!(transport.calls(), 2);

    let state = handle.settled().await;
    assert_eq!(state.response, Some(json!({"n": 3})));
    assert_eq!(transport.calls(), 3);
    assert_eq!(successes.values(), vec![json!({"n": 3})]);
}

#[tokio::test(start_paused = true)]
async fn retry_while_helper_stops_on_predicate() {
    let transport = Scripted::sequence(vec![
        Step::ok(r#"{"status":"running"}"#),
        Step::ok(r#"{"status":"running"}"#),
        Step::ok(r#"{"status":"done"}"#),
    ]);
    let client = client_with(&transport);

    let handle = client.request(
        RequestOptions::<Value, ()>::new().url("/job").policy(Policy::new().retry_while(
            |v: Option<&Value>| v.and_then(|v| v["status"].as_str()) != Some("done"),
            reqvisor::BackoffPolicy::constant(10 * MS),
            10,
        )),
        (),
    );

    let state = handle.settled().await;
    assert_eq!(state.response, Some(json!({"status": "done"})));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn success_poll_shows_fresh_value_while_pending() {
    let transport = Scripted::sequence(vec![
        Step::ok(r#"{"status":"running"}"#),
        Step::ok(r#"{"status":"running"}"#),
        Step::ok(r#"{"status":"done"}"#),
    ]);
    let client = client_with(&transport);
    let successes = Recorder::<Value>::default();
    let s = successes.clone();

    let handle = client.request(
        RequestOptions::<Value, ()>::new()
            .url("/job")
            .should_poll(|v, _| {
                let status = v.and_then(|v| v["status"].as_str());
                (status == Some("running")).then_some(Duration::from_secs(1))
            })
            .on_success(move |v, _| s.push(v.cloned().unwrap_or_default())),
        (),
    );

    sleep(500 * MS).await;
    let mid = handle.state();
    assert!(mid.pending);
    assert_eq!(mid.response, Some(json!({"status": "running"})));
    assert_eq!(mid.error, None);

    let state = handle.settled().await;
    assert!(!state.pending);
    assert_eq!(state.response, Some(json!({"status": "done"})));
    assert_eq!(transport.calls(), 3);
    assert_eq!(successes.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn failure_poll_keeps_trying_until_payload_exists() {
    let transport = Scripted::sequence(vec![
        Step::status(404, r#"{"errors":{"detail":"not yet"}}"#),
        Step::status(404, r#"{"errors":{"detail":"not yet"}}"#),
        Step::ok(r#"{"id":7}"#),
    ]);
    let client = client_with(&transport);
    let failures = Recorder::<Value>::default();
    let f = failures.clone();

    let handle = client.request(
        RequestOptions::<Value, ()>::new()
            .url("/export/7")
            .policy(Policy::new().poll_until_present(Duration::from_secs(2)))
            .on_failure(move |e, _| f.push(e.clone())),
        (),
    );

    sleep(Duration::from_secs(1)).await;
    let mid = handle.state();
    assert!(mid.pending);
    assert_eq!(mid.error, None);

    let state = handle.settled().await;
    assert_eq!(state.response, Some(json!({"id": 7})));
    assert_eq!(state.error, None);
    assert_eq!(failures.len(), 0);
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn newer_trigger_supersedes_slow_generation() {
    let transport = Scripted::new(|url, _| {
        let id = url.trim_start_matches("/items/");
        let after = if id == "1" { 500 * MS } else { 10 * MS };
        Step::ok(&format!(r#"{{"id":{id}}}"#)).after(after)
    });
    let client = client_with(&transport);
    let mut rx = client.subscribe();
    let successes = Recorder::<(Value, u32)>::default();
    let s = successes.clone();

    let handle = client.lazy_request(
        RequestOptions::<Value, u32>::new()
            .url_with(|id| Some(format!("/items/{id}")))
            .on_success(move |v, id| s.push((v.cloned().unwrap_or_default(), *id))),
    );

    handle.trigger(1);
    sleep(100 * MS).await;
    handle.trigger(2);

    let state = handle.settled().await;
    assert_eq!(state.response, Some(json!({"id": 2})));
    assert_eq!(state.context, Some(2));

    // Long after the first exchange would have completed.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.response(), Some(json!({"id": 2})));
    assert_eq!(successes.values(), vec![(json!({"id": 2}), 2)]);
    assert_eq!(handle.generation().get(), 2);

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| e.kind == EventKind::GenerationSuperseded && e.generation == Some(1)));
    assert!(!events
        .iter()
        .any(|e| e.kind == EventKind::RequestSucceeded && e.generation == Some(1)));
}

#[tokio::test(start_paused = true)]
async fn teardown_discards_in_flight_result() {
    let transport = Scripted::sequence(vec![Step::ok(r#"{"ok":true}"#).after(200 * MS)]);
    let client = client_with(&transport);
    let mut rx = client.subscribe();
    let callbacks = Recorder::<&'static str>::default();
    let (s, f) = (callbacks.clone(), callbacks.clone());

    let handle = client.request(
        RequestOptions::<Value, ()>::new()
            .url("/slow")
            .on_success(move |_, _| s.push("success"))
            .on_failure(move |_, _| f.push("failure")),
        (),
    );

    sleep(50 * MS).await;
    handle.teardown();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(callbacks.len(), 0);
    assert_eq!(handle.response(), None);
    assert_eq!(transport.calls(), 1);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.kind == EventKind::TornDown));
    assert!(!events.iter().any(Event::is_terminal));
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_cancels_debounce() {
    let transport = Scripted::sequence(vec![Step::ok("{}")]);
    let client = client_with(&transport);

    let handle = client.request(
        RequestOptions::<Value, ()>::new().url("/a").delay(Duration::from_secs(1)),
        (),
    );
    drop(handle);
    sleep(Duration::from_secs(2)).await;

    assert_eq!(transport.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn untriggered_handle_stays_idle() {
    let transport = Scripted::sequence(vec![Step::ok("{}")]);
    let client = client_with(&transport);

    let handle = client.lazy_request(RequestOptions::<Value, ()>::new().url("/a"));
    sleep(Duration::from_secs(1)).await;

    assert_eq!(handle.state(), reqvisor::Snapshot::default());
    assert_eq!(handle.generation(), reqvisor::Generation::NONE);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_url_or_body_is_not_eligible() {
    let transport = Scripted::sequence(vec![Step::ok(r#"{"saved":true}"#)]);
    let client = client_with(&transport);

    let no_url = client.lazy_request(
        RequestOptions::<Value, u32>::new()
            .url_with(|id| (*id > 0).then(|| format!("/items/{id}"))),
    );
    no_url.trigger(0);
    assert!(!no_url.pending());

    let post = client.lazy_request(
        RequestOptions::<Value, ()>::new()
            .url("/items/")
            .method(Method::Post),
    );
    post.trigger(());
    assert!(!post.pending());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.calls(), 0);

    let post = client.request(
        RequestOptions::<Value, ()>::new()
            .url("/items/")
            .method(Method::Post)
            .body(json!({"name": "Nepal"})),
        (),
    );
    let state = post.settled().await;
    assert_eq!(state.response, Some(json!({"saved": true})));

    let (url, wire) = transport.seen().remove(0);
    assert_eq!(url, "/items/");
    assert_eq!(wire.method, Method::Post);
    assert_eq!(wire.body.as_deref(), Some(r#"{"name":"Nepal"}"#));
    assert_eq!(wire.headers["Content-Type"], "application/json; charset=utf-8");
}

#[tokio::test(start_paused = true)]
async fn ineligible_trigger_clears_previous_result() {
    let transport = Scripted::sequence(vec![Step::ok(r#"{"id":1}"#)]);
    let client = client_with(&transport);

    let handle = client.lazy_request(
        RequestOptions::<Value, u32>::new()
            .url_with(|id| (*id > 0).then(|| format!("/items/{id}"))),
    );
    handle.trigger(1);
    assert_eq!(handle.settled().await.response, Some(json!({"id": 1})));

    handle.trigger(0);
    let state = handle.state();
    assert_eq!(state.response, None);
    assert_eq!(state.error, None);
    assert!(!state.pending);
    assert_eq!(state.context, Some(0));
}

#[tokio::test(start_paused = true)]
async fn mock_response_skips_network() {
    let transport = Scripted::sequence(vec![Step::ok("{}")]);
    let client = client_with(&transport);
    let successes = Recorder::<Value>::default();
    let s = successes.clone();

    let handle = client.lazy_request(
        RequestOptions::<Value, ()>::new()
            .url("/a")
            .mock_response(json!({"mock": true}))
            .on_success(move |v, _| s.push(v.cloned().unwrap_or_default())),
    );
    assert_eq!(handle.response(), None);

    handle.trigger(());
    let state = handle.state();
    assert!(!state.pending);
    assert_eq!(state.response, Some(json!({"mock": true})));
    assert_eq!(successes.values(), vec![json!({"mock": true})]);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn mock_response_respects_eligibility() {
    let transport = Scripted::sequence(vec![Step::ok("{}")]);
    let client = client_with(&transport);

    let handle = client.lazy_request(
        RequestOptions::<Value, ()>::new()
            .url("/a")
            .method(Method::Put)
            .mock_response(json!({"mock": true})),
    );
    handle.trigger(());
    assert_eq!(handle.response(), None);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn ineligible_mock_trigger_settles_in_flight_generation() {
    let transport = Scripted::sequence(vec![Step::Hang]);
    let client = client_with(&transport);
    let url = |id: &u32| (*id > 0).then(|| format!("/items/{id}"));

    let handle = client.lazy_request(RequestOptions::<Value, u32>::new().url_with(url));
    handle.trigger(1);
    sleep(10 * MS).await;
    assert!(handle.pending());
    assert_eq!(transport.calls(), 1);

    handle.update_options(
        RequestOptions::<Value, u32>::new()
            .url_with(url)
            .mock_response(json!({"mock": true})),
    );
    handle.trigger(0);

    let state = tokio::time::timeout(Duration::from_secs(1), handle.settled())
        .await
        .expect("handle settles after ineligible trigger");
    assert!(!state.pending);
    assert_eq!(state.response, None);
    assert_eq!(state.error, None);
    assert_eq!(state.context, Some(0));
}

#[tokio::test(start_paused = true)]
async fn preserve_response_keeps_value_across_retrigger() {
    let transport = Scripted::new(|_, i| Step::ok(&json!({ "v": i }).to_string()).after(100 * MS));
    let client = client_with(&transport);

    let kept = client.lazy_request(
        RequestOptions::<Value, ()>::new()
            .url("/a")
            .preserve_response(true),
    );
    kept.trigger(());
    assert_eq!(kept.settled().await.response, Some(json!({"v": 0})));
    kept.trigger(());
    assert!(kept.pending());
    assert_eq!(kept.response(), Some(json!({"v": 0})));
    assert_eq!(kept.settled().await.response, Some(json!({"v": 1})));

    let cleared = client.lazy_request(RequestOptions::<Value, ()>::new().url("/a"));
    cleared.trigger(());
    cleared.settled().await;
    cleared.trigger(());
    assert!(cleared.pending());
    assert_eq!(cleared.response(), None);
}

#[tokio::test(start_paused = true)]
async fn policy_swap_takes_effect_mid_chain() {
    let transport = Scripted::sequence(vec![Step::ok(r#"{"ok":true}"#)]);
    let client = client_with(&transport);

    let handle = client.request(
        RequestOptions::<Value, ()>::new()
            .url("/a")
            .should_retry(|_, _, _| Some(100 * MS)),
        (),
    );

    sleep(150 * MS).await;
    assert_eq!(transport.calls(), 2);
    handle.update_options(RequestOptions::<Value, ()>::new().url("/a"));

    let state = handle.settled().await;
    assert_eq!(state.response, Some(json!({"ok": true})));
    assert_eq!(transport.calls(), 3);
    assert_eq!(handle.generation().get(), 1);
}

#[tokio::test(start_paused = true)]
async fn replace_options_restarts_only_on_shape_change() {
    let transport = Scripted::new(|url, _| Step::ok(&json!({ "url": url }).to_string()));
    let client = client_with(&transport);

    let handle = client.lazy_request(RequestOptions::<Value, ()>::new().url("/a"));
    handle.replace_options(RequestOptions::new().url("/b"));
    assert_eq!(transport.calls(), 0);

    handle.trigger(());
    handle.settled().await;
    assert_eq!(handle.generation().get(), 1);

    handle.replace_options(RequestOptions::new().url("/b"));
    sleep(10 * MS).await;
    assert_eq!(handle.generation().get(), 1);
    assert_eq!(transport.calls(), 1);

    handle.replace_options(RequestOptions::new().url("/c"));
    let state = handle.settled().await;
    assert_eq!(handle.generation().get(), 2);
    assert_eq!(state.response, Some(json!({"url": "/c"})));
}

#[tokio::test(start_paused = true)]
async fn debounce_collapses_rapid_triggers() {
    let transport = Scripted::new(|url, _| Step::ok(&json!({ "url": url }).to_string()));
    let client = client_with(&transport);

    let handle = client.lazy_request(
        RequestOptions::<Value, u32>::new()
            .url("/search")
            .query_with(|year| {
                let mut q = UrlParams::new();
                q.insert("ci".into(), Param::from("IDMC WS"));
                q.insert("year".into(), Param::from(i64::from(*year)));
                Some(q)
            })
            .delay(300 * MS),
    );

    handle.trigger(2007);
    sleep(100 * MS).await;
    handle.trigger(2008);

    let state = handle.settled().await;
    assert_eq!(transport.calls(), 1);
    assert_eq!(state.response, Some(json!({"url": "/search?ci=IDMC%20WS&year=2008"})));
}

#[tokio::test(start_paused = true)]
async fn client_transform_shapes_every_request() {
    let transport = Scripted::sequence(vec![Step::ok("{}")]);
    let client = Client::builder(Config::default())
        .with_shared_transport(Arc::clone(&transport) as Arc<dyn Transport>)
        .with_transform(
            FnTransform::new()
                .url(|u| format!("https://api.test{u}"))
                .options(|_, mut init| {
                    init.headers.insert("Authorization".into(), "Token t".into());
                    process_options(init)
                }),
        )
        .build();

    let handle = client.request(
        RequestOptions::<Value, ()>::new()
            .url("/countries/")
            .method(Method::Patch)
            .body(Body::Text("raw".into())),
        (),
    );
    handle.settled().await;

    let (url, wire) = transport.seen().remove(0);
    assert_eq!(url, "https://api.test/countries/");
    assert_eq!(wire.headers["Authorization"], "Token t");
    assert_eq!(wire.body.as_deref(), Some("raw"));
}

#[tokio::test(start_paused = true)]
async fn events_follow_generation_lifecycle() {
    let transport = Scripted::sequence(vec![Step::ok("{}")]);
    let client = client_with(&transport);
    let mut rx = client.subscribe();

    let handle = client.request(RequestOptions::<Value, ()>::new().name("countries").url("/a"), ());
    handle.settled().await;

    let kinds: Vec<EventKind> = drain(&mut rx).into_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::GenerationStarted,
            EventKind::AttemptStarting,
            EventKind::RequestSucceeded,
        ]
    );
}

struct SuccessCounter(Recorder<String>);

#[async_trait]
impl Subscribe for SuccessCounter {
    async fn on_event(&self, ev: &Event) {
        if ev.kind == EventKind::RequestSucceeded {
            self.0.push(ev.request.as_deref().unwrap_or_default().to_owned());
        }
    }

    fn name(&self) -> &'static str {
        "success-counter"
    }
}

#[tokio::test(start_paused = true)]
async fn subscribers_receive_events_with_request_label() {
    let transport = Scripted::sequence(vec![Step::ok("{}")]);
    let seen = Recorder::<String>::default();
    let client = Client::builder(Config::default())
        .with_shared_transport(Arc::clone(&transport) as Arc<dyn Transport>)
        .with_subscribers(vec![Arc::new(SuccessCounter(seen.clone())) as Arc<dyn Subscribe>])
        .build();

    let named = client.request(RequestOptions::<Value, ()>::new().name("countries").url("/a"), ());
    named.settled().await;
    let unnamed = client.request(RequestOptions::<Value, ()>::new().url("/b"), ());
    unnamed.settled().await;

    sleep(10 * MS).await;
    assert_eq!(seen.values(), vec!["countries".to_owned(), "request".to_owned()]);
}
