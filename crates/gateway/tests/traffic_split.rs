//! End-to-end traffic split with a failing replica
//!
//! Runs the gateway on a real socket in front of a healthy legacy backend and
//! a replica that answers 503 to everything, then drives reads over HTTP.

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::{Value, json};
use shadowmesh_config::GatewayConfig;
use shadowmesh_gateway::{TrafficRouter, build_router};
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn legacy() -> String {
    serve(
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/api/products/{id}",
                get(|| async { axum::Json(json!({"id": 1, "name": "Lamp"})) }),
            ),
    )
    .await
}

async fn failing_replica() -> String {
    serve(Router::new().fallback(|| async { StatusCode::SERVICE_UNAVAILABLE })).await
}

async fn gateway(legacy_url: String, replica_url: String) -> String {
    let config = GatewayConfig {
        legacy_url,
        replica_url,
        request_timeout: Duration::from_secs(2),
        health_timeout: Duration::from_secs(1),
        ..GatewayConfig::default()
    };
    let router = TrafficRouter::from_config(&config).unwrap();
    serve(build_router(router)).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_weight_thirty_with_failing_replica() {
    let gateway_url = gateway(legacy().await, failing_replica().await).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/admin/weight", gateway_url))
        .json(&json!({"weight": 30}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut fallbacks = 0u64;
    for _ in 0..1000 {
        let response = client
            .get(format!("{}/api/products/1", gateway_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-source"], "LEGACY");
        if response.headers().contains_key("x-fallback") {
            fallbacks += 1;
        }
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["name"], "Lamp");
    }

    let status: Value = client
        .get(format!("{}/admin/status", gateway_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(status["trafficWeight"], 30);
    assert_eq!(status["stats"]["total"], 1000);
    assert_eq!(status["stats"]["toLegacy"], 1000);

    let to_replica = status["stats"]["toReplica"].as_u64().unwrap();
    assert!(
        (230..=370).contains(&to_replica),
        "toReplica {} not near 300",
        to_replica
    );
    // Every replica attempt failed over
    assert_eq!(fallbacks, to_replica);
}

#[tokio::test]
async fn test_health_reports_each_backend() {
    let gateway_url = gateway(legacy().await, failing_replica().await).await;

    let body: Value = reqwest::get(format!("{}/health", gateway_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        body,
        json!({"gateway": "healthy", "legacyStatus": "healthy", "replicaStatus": "unhealthy"})
    );
}
