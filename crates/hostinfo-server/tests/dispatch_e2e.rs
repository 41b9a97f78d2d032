//! End-to-end dispatch tests.
//!
//! These drive the full pipeline (router, binder, registry, response
//! builder) through `Dispatcher::dispatch` with call-counting handlers, and
//! check that a handler runs exactly when the request is routable and
//! bindable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use hostinfo_core::{
    BoundParams, Contract, Handler, HandlerResult, Operation, ParamSpec, ParamType,
    RequestContext, Schema,
};
use hostinfo_server::{Dispatcher, DispatcherConfig, HandlerRegistry, REQUEST_ID_HEADER};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde::Deserialize;
use serde_json::{json, Value};

/// Counts invocations and replies with a fixed result.
struct CountingHandler {
    calls: Arc<AtomicUsize>,
    result: HandlerResult,
}

impl CountingHandler {
    fn new(result: HandlerResult) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
                result,
            },
            calls,
        )
    }
}

#[async_trait]
impl Handler for CountingHandler {
    async fn handle(&self, _ctx: &RequestContext, _params: BoundParams) -> HandlerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Echoes typed parameters back as an object.
struct SearchHandler;

#[derive(Deserialize)]
struct SearchParams {
    q: String,
    limit: Option<i64>,
    exact: Option<bool>,
}

#[async_trait]
impl Handler for SearchHandler {
    async fn handle(&self, _ctx: &RequestContext, params: BoundParams) -> HandlerResult {
        match params.deserialize::<SearchParams>() {
            Ok(p) => HandlerResult::success(&json!({
                "q": p.q,
                "limit": p.limit.unwrap_or(10),
                "exact": p.exact.unwrap_or(false),
            })),
            Err(e) => HandlerResult::failure(500, e.to_string()),
        }
    }
}

fn contract() -> Arc<Contract> {
    Arc::new(
        Contract::builder("e2e")
            .version("1.0.0")
            .operation(
                Operation::builder("getThing")
                    .path("/things/{id}")
                    .param(ParamSpec::path("id", ParamType::Integer))
                    .success(200, Schema::string())
                    .error(404, Schema::error_object())
                    .error(500, Schema::error_object())
                    .build(),
            )
            .operation(
                Operation::builder("search")
                    .path("/search")
                    .param(ParamSpec::query("q", ParamType::String).required())
                    .param(ParamSpec::query("limit", ParamType::Integer))
                    .param(ParamSpec::query("exact", ParamType::Boolean))
                    .success(200, Schema::Any)
                    .error(500, Schema::error_object())
                    .build(),
            )
            .operation(
                Operation::builder("lookup")
                    .path("/lookup")
                    .param(ParamSpec::query("name", ParamType::String).required())
                    .success(200, Schema::string())
                    .error(500, Schema::error_object())
                    .build(),
            )
            .build(),
    )
}

fn dispatcher_with(result: HandlerResult) -> (Dispatcher, Arc<AtomicUsize>) {
    let (handler, calls) = CountingHandler::new(result.clone());
    let lookup = CountingHandler {
        calls: Arc::clone(&calls),
        result,
    };
    let mut handlers = HandlerRegistry::new();
    handlers.register("getThing", handler);
    handlers.register("lookup", lookup);
    handlers.register("search", SearchHandler);

    let dispatcher = Dispatcher::new(contract(), handlers, DispatcherConfig::default())
        .expect("registry covers the contract");
    (dispatcher, calls)
}

fn get(uri: &str) -> Request<Bytes> {
    Request::get(uri).body(Bytes::new()).unwrap()
}

async fn json_body(response: hostinfo_server::HttpResponse) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn success_value_round_trips() {
    let (dispatcher, calls) = dispatcher_with(HandlerResult::success(&"thing-7"));

    let response = dispatcher.dispatch(&get("/things/7")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!("thing-7"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn declared_failure_uses_its_status() {
    let (dispatcher, calls) = dispatcher_with(HandlerResult::failure(404, "no such thing"));

    let response = dispatcher.dispatch(&get("/things/7")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({"code": 404, "message": "no such thing"})
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn undeclared_failure_is_generic_500() {
    let (dispatcher, _calls) = dispatcher_with(HandlerResult::failure(409, "conflict"));

    let response = dispatcher.dispatch(&get("/things/7")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"code": 500, "message": "internal server error"})
    );
}

#[tokio::test]
async fn unmatched_route_is_404_without_invocation() {
    let (dispatcher, calls) = dispatcher_with(HandlerResult::success(&"unused"));

    for uri in ["/nonexistent", "/things", "/things/7/extra", "/"] {
        let response = dispatcher.dispatch(&get(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri = {uri}");
    }

    let with_body = Request::delete("/things/7")
        .body(Bytes::from_static(b"{\"ignored\":true}"))
        .unwrap();
    let response = dispatcher.dispatch(&with_body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn binding_failure_is_400_without_invocation() {
    let (dispatcher, calls) = dispatcher_with(HandlerResult::success(&"unused"));

    let response = dispatcher.dispatch(&get("/things/seven")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], 400);
    assert!(body["message"].as_str().unwrap().contains("'id'"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_required_query_is_400_without_invocation() {
    let (dispatcher, calls) = dispatcher_with(HandlerResult::success(&"unused"));

    let response = dispatcher.dispatch(&get("/lookup?other=5")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], 400);
    assert_eq!(
        body["message"],
        "missing required query parameter 'name'"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let response = dispatcher.dispatch(&get("/search?limit=5")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("'q'"));
}

#[tokio::test]
async fn undecodable_query_value_is_400_without_invocation() {
    let (dispatcher, calls) = dispatcher_with(HandlerResult::success(&"unused"));

    let response = dispatcher.dispatch(&get("/lookup?name=%FF%FE")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("malformed query parameter 'name'"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn counted_lookup_runs_once_when_bound() {
    let (dispatcher, calls) = dispatcher_with(HandlerResult::success(&"found"));

    let response = dispatcher.dispatch(&get("/lookup?name=web+01")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!("found"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn typed_parameters_reach_the_handler() {
    let (dispatcher, _calls) = dispatcher_with(HandlerResult::success(&"unused"));

    let response = dispatcher
        .dispatch(&get("/search?q=web+servers&exact=true&unknown=1"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"q": "web servers", "limit": 10, "exact": true})
    );
}

#[tokio::test]
async fn every_response_carries_request_id_and_json_type() {
    let (dispatcher, _calls) = dispatcher_with(HandlerResult::success(&"x"));

    let mut seen = Vec::new();
    for uri in ["/things/1", "/things/x", "/nope"] {
        let response = dispatcher.dispatch(&get(uri)).await;
        assert_eq!(response.headers()["content-type"], "application/json");
        let id = response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        assert!(!seen.contains(&id));
        seen.push(id);
    }
}
