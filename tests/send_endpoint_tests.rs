// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Status contract tests for the admin send endpoint.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

fn post_json(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/send")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_missing_to_is_bad_request() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(post_json(serde_json::json!({
            "title": "Hello",
            "body": "World"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_title_is_bad_request() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(post_json(serde_json::json!({
            "to": "ExponentPushToken[abc]",
            "body": "World"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_body_is_bad_request() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(post_json(serde_json::json!({
            "to": "ExponentPushToken[abc]",
            "title": "Hello"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_to_with_wrong_type_is_bad_request() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(post_json(serde_json::json!({
            "to": 42,
            "title": "Hello",
            "body": "World"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/send")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_options_preflight_is_no_content() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/send")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_browser_preflight_answered_by_cors_layer() {
    // A preflight carrying Access-Control-Request-Method is handled by
    // the CORS layer (with the allow headers the browser needs); only
    // bare OPTIONS reaches the 204 handler above.
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/send")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_empty_recipient_list_is_ok_without_network() {
    let (app, _state) = common::create_test_app();

    // Empty/whitespace tokens normalize away; the fast path answers 200
    // with zero chunks and never touches the provider.
    let response = app
        .oneshot(post_json(serde_json::json!({
            "to": ["", "   "],
            "title": "Hello",
            "body": "World"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
