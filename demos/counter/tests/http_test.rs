//! HTTP-level end-to-end scenarios (spec.md section 8): counter increment,
//! property validation, and settings persistence.

mod support;

use std::time::Duration;

use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

async fn send(router: &Router, method: Method, uri: &str, body: Option<&Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(serde_json::to_vec(json).unwrap())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.expect("request dispatch failed");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, parsed)
}

async fn poll_until_terminal(router: &Router, href: &str) -> Value {
    for _ in 0..50 {
        let (status, body) = send(router, Method::GET, href, None).await;
        assert_eq!(status, StatusCode::OK);
        match body["status"].as_str() {
            Some("completed") | Some("cancelled") | Some("error") => return body,
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    panic!("invocation at {href} never reached a terminal status");
}

/// Scenario 1: a fresh counter starts at zero, `increment` runs to
/// completion asynchronously, and the property reflects the new value.
#[tokio::test]
async fn counter_increment_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let state = support::counter_and_instrument_state(dir.path()).await;
    let router = labthings_server::build_router(state);

    let (status, body) = send(&router, Method::GET, "/counter/count", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, 0);

    let (status, invocation) = send(&router, Method::POST, "/counter/increment", Some(&serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = invocation["id"].as_str().expect("invocation record has an id");

    let terminal = poll_until_terminal(&router, &format!("/action_invocations/{id}")).await;
    assert_eq!(terminal["status"], "completed");
    assert_eq!(terminal["output"], 1);

    let (status, body) = send(&router, Method::GET, "/counter/count", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, 1);
}

/// Scenario 1 continued: `count` is read-only — a direct `PUT` is rejected
/// even though the action that owns it can change it freely.
#[tokio::test]
async fn counter_count_rejects_direct_writes() {
    let dir = tempfile::tempdir().unwrap();
    let state = support::counter_and_instrument_state(dir.path()).await;
    let router = labthings_server::build_router(state);

    let (status, _) = send(&router, Method::PUT, "/counter/count", Some(&serde_json::json!(5))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

/// Scenario 2: property validation rejects both out-of-range and
/// wrong-typed values with 422, and accepts a valid write with 201.
#[tokio::test]
async fn property_validation_rejects_bad_writes() {
    let dir = tempfile::tempdir().unwrap();
    let state = support::counter_and_instrument_state(dir.path()).await;
    let router = labthings_server::build_router(state);

    let (status, _) = send(&router, Method::PUT, "/instrument/temperature", Some(&serde_json::json!(-300.0))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&router, Method::PUT, "/instrument/temperature", Some(&serde_json::json!("hot"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&router, Method::PUT, "/instrument/temperature", Some(&serde_json::json!(37.5))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, 37.5);

    let (status, body) = send(&router, Method::GET, "/instrument/temperature", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, 37.5);
}

/// Scenario 5: a setting survives a simulated restart — `save` then a fresh
/// server built against the same settings folder picks the value back up.
#[tokio::test]
async fn setting_property_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let state = support::counter_and_instrument_state(dir.path()).await;
    let router = labthings_server::build_router(state.clone());
    let (status, body) = send(&router, Method::PUT, "/instrument/gain", Some(&serde_json::json!(2.5))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, 2.5);

    labthings_runtime::server::shutdown(&state.server).await;

    let contents = tokio::fs::read_to_string(dir.path().join("instrument").join("settings.json"))
        .await
        .expect("settings file should exist after shutdown");
    let on_disk: Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(on_disk["gain"], 2.5);

    let restarted = support::counter_and_instrument_state(dir.path()).await;
    let router = labthings_server::build_router(restarted);
    let (status, body) = send(&router, Method::GET, "/instrument/gain", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, 2.5);
}
