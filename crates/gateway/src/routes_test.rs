//! HTTP surface tests via `tower::ServiceExt::oneshot`

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::routes::build_router;
use crate::routes::proxy::{forwarded_request_headers, tag_body};
use crate::test_utils::{Harness, harness};
use crate::traffic::Backend;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn app(weight: u8) -> (Harness, Router) {
    let h = harness(weight).await;
    let app = build_router(h.router.clone());
    (h, app)
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_status() {
    let (_h, app) = app(25).await;

    let (status, _, body) = send(&app, get("/admin/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trafficWeight"], 25);
    assert_eq!(body["stats"], json!({"total": 0, "toLegacy": 0, "toReplica": 0}));
    assert!(body["legacyUrl"].as_str().unwrap().starts_with("http://127.0.0.1:"));
    assert!(body["replicaUrl"].as_str().unwrap().starts_with("http://127.0.0.1:"));
}

#[tokio::test]
async fn test_set_weight() {
    let (h, app) = app(0).await;

    let (status, _, body) = send(&app, post_json("/admin/weight", r#"{"weight": 30}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"trafficWeight": 30}));
    assert_eq!(h.router.traffic().weight(), 30);
}

#[tokio::test]
async fn test_set_weight_rejects_invalid() {
    let (h, app) = app(40).await;

    for payload in [
        r#"{"weight": -1}"#,
        r#"{"weight": 101}"#,
        r#"{"weight": 50.5}"#,
        r#"{"weight": "50"}"#,
        r#"{}"#,
        r#"[30]"#,
        "not json",
    ] {
        let (status, _, body) = send(&app, post_json("/admin/weight", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body["error"], "INVALID_WEIGHT");
        assert!(body["message"].is_string());
    }

    assert_eq!(h.router.traffic().weight(), 40);
}

#[tokio::test]
async fn test_reset_stats() {
    let (h, app) = app(0).await;
    send(&app, get("/api/products/1")).await;
    send(&app, get("/api/products/2")).await;
    assert_eq!(h.router.traffic().stats().total, 2);

    let (status, _, body) = send(&app, post_json("/admin/reset-stats", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"], json!({"total": 0, "toLegacy": 0, "toReplica": 0}));
    assert_eq!(h.router.traffic().stats().total, 0);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (h, app) = app(0).await;
    h.replica
        .health_status
        .store(503, std::sync::atomic::Ordering::Relaxed);

    let (status, _, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"gateway": "healthy", "legacyStatus": "healthy", "replicaStatus": "unhealthy"})
    );
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_read_is_tagged() {
    let (_h, app) = app(0).await;

    let (status, headers, body) = send(&app, get("/api/products/7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-source"], "LEGACY");
    assert!(headers.get("x-fallback").is_none());

    assert_eq!(body["id"], "7");
    assert_eq!(body["served_by"], "legacy");
    assert_eq!(body["source"], "LEGACY");
    assert_eq!(body["trafficWeight"], 0);
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(body.get("fallback").is_none());
}

#[tokio::test]
async fn test_list_is_wrapped() {
    let (_h, app) = app(100).await;

    let (status, headers, body) = send(&app, get("/api/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-source"], "REPLICA");
    assert_eq!(body["data"][0]["served_by"], "replica");
    assert_eq!(body["source"], "REPLICA");
    assert_eq!(body["trafficWeight"], 100);
}

#[tokio::test]
async fn test_reviews_read() {
    let (_h, app) = app(100).await;

    let (status, _, body) = send(&app, get("/api/products/3/reviews")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["served_by"], "replica");
    assert_eq!(body["reviews"], json!([]));
}

#[tokio::test]
async fn test_fallback_is_flagged() {
    let (h, app) = app(100).await;
    h.replica.set_failing(true);

    let (status, headers, body) = send(&app, get("/api/products/7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-source"], "LEGACY");
    assert_eq!(headers["x-fallback"], "true");
    assert_eq!(body["source"], "LEGACY");
    assert_eq!(body["fallback"], true);
}

#[tokio::test]
async fn test_both_down_is_503() {
    let (h, app) = app(50).await;
    h.legacy.set_failing(true);
    h.replica.set_failing(true);

    let (status, _, body) = send(&app, get("/api/products/7")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_not_found_passes_through() {
    let (h, app) = app(0).await;

    let (status, headers, body) = send(&app, get("/api/products/404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers["x-source"], "LEGACY");
    // Error bodies are not tagged
    assert_eq!(body, json!({"error": "not found"}));
    assert_eq!(h.replica.hits(), 0);
}

#[tokio::test]
async fn test_non_json_body_passes_through() {
    let (_h, app) = app(0).await;

    let response = app.clone().oneshot(get("/api/products/text")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-source"], "LEGACY");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"plain text");
}

#[tokio::test]
async fn test_read_forwards_client_headers() {
    let (h, app) = app(0).await;

    let request = Request::builder()
        .uri("/api/products/3")
        .header(header::HOST, "shop.example")
        .header(header::AUTHORIZATION, "Bearer abc")
        .header(header::ACCEPT_LANGUAGE, "de")
        .header(header::COOKIE, "session=42")
        .header(header::ACCEPT_ENCODING, "gzip")
        .header("x-request-id", "req-7")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "LEGACY");

    let received = h.legacy.last_read_headers.lock().clone().unwrap();
    assert_eq!(received[header::AUTHORIZATION], "Bearer abc");
    assert_eq!(received[header::ACCEPT_LANGUAGE], "de");
    assert_eq!(received[header::COOKIE], "session=42");
    assert_eq!(received["x-request-id"], "req-7");
    assert!(received.get(header::ACCEPT_ENCODING).is_none());
    assert_ne!(received[header::HOST], "shop.example");
}

#[test]
fn test_forwarded_request_headers_drop_connection_level() {
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(header::HOST, "gateway:4000".parse().unwrap());
    headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());
    headers.insert("keep-alive", "timeout=5".parse().unwrap());
    headers.insert(header::CONTENT_LENGTH, "12".parse().unwrap());
    headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
    headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());

    let forwarded = forwarded_request_headers(&headers);
    assert_eq!(forwarded.len(), 2);
    assert_eq!(forwarded[header::AUTHORIZATION], "Bearer abc");
    assert_eq!(forwarded[header::CONTENT_TYPE], "application/json");
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_write_pinned_to_legacy() {
    let (h, app) = app(100).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/products")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer abc")
        .header("x-ignored", "1")
        .body(Body::from(r#"{"name":"Lamp"}"#))
        .unwrap();

    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers["x-backend"], "legacy");
    assert!(headers.get("x-source").is_none());
    // Returned exactly as legacy answered
    assert_eq!(body, json!({"ok": true}));

    let write = h.legacy.last_write.lock().clone().unwrap();
    assert_eq!(write.method, "POST");
    assert_eq!(write.body, r#"{"name":"Lamp"}"#);
    assert_eq!(write.authorization.as_deref(), Some("Bearer abc"));

    assert_eq!(h.replica.hits(), 0);
    assert_eq!(h.router.traffic().stats().total, 0);
}

#[tokio::test]
async fn test_cart_and_account_pinned_to_legacy() {
    let (h, app) = app(100).await;

    for (method, uri) in [
        ("GET", "/api/cart"),
        ("DELETE", "/api/cart/items/4"),
        ("POST", "/api/login"),
        ("POST", "/api/register"),
        ("DELETE", "/api/reviews/2"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert!(
            response.status().is_success(),
            "{} {} -> {}",
            method,
            uri,
            response.status()
        );
    }

    assert_eq!(h.legacy.hits(), 5);
    assert_eq!(h.replica.hits(), 0);
}

#[test]
fn test_tag_body() {
    let tagged = tag_body(json!({"id": 1}), Backend::Replica, true, 30, "2026-01-01T00:00:00.000Z");
    assert_eq!(
        tagged,
        json!({
            "id": 1,
            "source": "REPLICA",
            "trafficWeight": 30,
            "timestamp": "2026-01-01T00:00:00.000Z",
            "fallback": true
        })
    );

    let wrapped = tag_body(json!([1, 2]), Backend::Legacy, false, 0, "t");
    assert_eq!(
        wrapped,
        json!({"data": [1, 2], "source": "LEGACY", "trafficWeight": 0, "timestamp": "t"})
    );
}
