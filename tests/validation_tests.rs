//! Body parsing and schema validation: failures are resolved before any
//! handler runs and surface as structured 400 responses.

use edgekit::{Context, DispatchRequest, Dispatcher, Reply, Router, SchemaValidator};
use http::Method;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod tracing_util;
use tracing_util::TestTracing;

fn quest_schema() -> Arc<SchemaValidator> {
    Arc::new(
        SchemaValidator::new(json!({
            "type": "object",
            "required": ["title"],
            "properties": {
                "title": { "type": "string" },
                "xp": { "type": "integer", "minimum": 0 }
            }
        }))
        .unwrap(),
    )
}

fn quests_app() -> (Dispatcher, Arc<AtomicBool>) {
    let called = Arc::new(AtomicBool::new(false));
    let called_in_handler = Arc::clone(&called);

    let mut router: Router = Router::new();
    router.post("/quests", move |ctx: &mut Context| {
        called_in_handler.store(true, Ordering::SeqCst);
        Ok(Reply::json(ctx.body.clone()))
    });
    router.schema(Method::POST, "/quests", quest_schema());
    (Dispatcher::new(router, ()), called)
}

#[test]
fn invalid_body_is_rejected_before_the_handler() {
    let _t = TestTracing::init();
    let (d, called) = quests_app();

    let req = DispatchRequest::new(Method::POST, "/quests")
        .with_json_body(r#"{ "title": "walk", "xp": "lots" }"#);
    let resp = d.dispatch(req);

    assert_eq!(resp.status, 400);
    assert_eq!(resp.body["status"], json!(400));
    assert_eq!(resp.body["message"], json!("Validation error"));
    let tree = &resp.body["error"];
    assert!(tree.is_object());
    assert!(!tree.as_object().unwrap().is_empty(), "error tree must not be empty");
    assert!(tree.get("xp").is_some(), "expected failure under /xp: {tree}");
    assert!(!called.load(Ordering::SeqCst), "handler must not run");
}

#[test]
fn missing_required_field_reports_root_error() {
    let (d, called) = quests_app();

    let resp = d.dispatch(
        DispatchRequest::new(Method::POST, "/quests").with_json_body(r#"{ "xp": 5 }"#),
    );
    assert_eq!(resp.status, 400);
    assert!(resp.body["error"].get("_root").is_some());
    assert!(!called.load(Ordering::SeqCst));
}

#[test]
fn valid_body_reaches_the_handler_parsed() {
    let (d, called) = quests_app();

    let resp = d.dispatch(
        DispatchRequest::new(Method::POST, "/quests")
            .with_json_body(r#"{ "title": "walk", "xp": 50 }"#),
    );
    assert_eq!(resp.status, 201);
    assert_eq!(resp.body, json!({ "title": "walk", "xp": 50 }));
    assert!(called.load(Ordering::SeqCst));
}

#[test]
fn malformed_json_is_rejected_with_400() {
    let (d, called) = quests_app();

    let resp = d.dispatch(
        DispatchRequest::new(Method::POST, "/quests").with_json_body("{ not json"),
    );
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body["message"], json!("Invalid JSON body"));
    assert!(!called.load(Ordering::SeqCst));
}

#[test]
fn body_without_json_content_type_is_not_parsed() {
    let mut router: Router = Router::new();
    router.post("/echo", |ctx: &mut Context| Ok(Reply::json(ctx.body.clone())));
    let d = Dispatcher::new(router, ());

    let mut req = DispatchRequest::new(Method::POST, "/echo");
    req.body = Some(r#"{ "ignored": true }"#.to_string());
    let resp = d.dispatch(req);
    assert_eq!(resp.body, Value::Null);
}

#[test]
fn route_without_schema_passes_raw_json_through() {
    let mut router: Router = Router::new();
    router.post("/free", |ctx: &mut Context| Ok(Reply::json(ctx.body.clone())));
    let d = Dispatcher::new(router, ());

    let resp = d.dispatch(
        DispatchRequest::new(Method::POST, "/free")
            .with_json_body(r#"{ "anything": ["goes", 1] }"#),
    );
    assert_eq!(resp.status, 201);
    assert_eq!(resp.body, json!({ "anything": ["goes", 1] }));
}

#[test]
fn duplicate_schema_registration_is_a_noop() {
    let strict = quest_schema();
    let lax: Arc<SchemaValidator> =
        Arc::new(SchemaValidator::new(json!({ "type": "object" })).unwrap());

    let mut router: Router = Router::new();
    router.post("/quests", |ctx: &mut Context| Ok(Reply::json(ctx.body.clone())));
    router.schema(Method::POST, "/quests", strict);
    router.schema(Method::POST, "/quests", lax);
    let d = Dispatcher::new(router, ());

    // Body violating the first schema must still be rejected: the second
    // (permissive) registration was ignored.
    let resp = d.dispatch(
        DispatchRequest::new(Method::POST, "/quests").with_json_body(r#"{ "xp": -1 }"#),
    );
    assert_eq!(resp.status, 400);
}

#[test]
fn get_requests_never_parse_bodies() {
    let mut router: Router = Router::new();
    router.get("/peek", |ctx: &mut Context| Ok(Reply::json(ctx.body.clone())));
    let d = Dispatcher::new(router, ());

    let mut req = DispatchRequest::new(Method::GET, "/peek");
    req.headers
        .insert("content-type".to_string(), "application/json".to_string());
    req.body = Some(r#"{ "x": 1 }"#.to_string());
    let resp = d.dispatch(req);
    assert_eq!(resp.body, Value::Null);
}
