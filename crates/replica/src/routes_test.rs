//! HTTP surface tests via `tower::ServiceExt::oneshot`

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use shadowmesh_pipeline::store::StoreResult;
use shadowmesh_pipeline::{
    MemoryReplicaStore, ReplicaReader, ReplicaStore, ReplicatedProduct, ReviewSummary,
};
use shadowmesh_protocol::{ProductSnapshot, ReviewSnapshot};
use shadowmesh_transform::{PricedProduct, PricingAggregates};
use tower::ServiceExt;

use crate::build_router;

async fn send(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn product(id: i64, price: i64, stock: i32) -> PricedProduct {
    PricedProduct::from(ProductSnapshot {
        id,
        name: format!("product-{}", id),
        description: Some("desk lamp".into()),
        price: Decimal::new(price, 2),
        stock,
        image_url: None,
        category: Some("lighting".into()),
    })
}

fn review(id: i64, product_id: i64, rating: i32, username: Option<&str>) -> ReviewSnapshot {
    ReviewSnapshot {
        id,
        product_id,
        user_id: Some(id * 10),
        username: username.map(str::to_string),
        rating,
        comment: Some("fine".into()),
    }
}

async fn app_with_catalogue() -> (Arc<MemoryReplicaStore>, Router) {
    let store = Arc::new(MemoryReplicaStore::new());
    store.upsert_product(&product(1, 1000, 5)).await.unwrap();
    store.upsert_product(&product(2, 2000, 300)).await.unwrap();
    store.upsert_review(&review(1, 1, 5, Some("ada"))).await.unwrap();
    store.upsert_review(&review(2, 1, 4, None)).await.unwrap();
    let app = build_router(store.clone());
    (store, app)
}

/// Reader whose every query fails
struct BrokenReader;

#[async_trait]
impl ReplicaReader for BrokenReader {
    async fn ping(&self) -> StoreResult<()> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn list_products(&self) -> StoreResult<Vec<ReplicatedProduct>> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn find_product(&self, _id: i64) -> StoreResult<Option<ReplicatedProduct>> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn product_reviews(&self, _product_id: i64) -> StoreResult<ReviewSummary> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn pricing_aggregates(&self) -> StoreResult<PricingAggregates> {
        Err(sqlx::Error::PoolTimedOut.into())
    }
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (_, app) = app_with_catalogue().await;

    let (status, body) = send(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "replica");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_health_reports_store_failure() {
    let app = build_router(Arc::new(BrokenReader));

    let (status, body) = send(&app, "/health").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].as_str().unwrap().contains("database error"));
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_list_products() {
    let (_, app) = app_with_catalogue().await;

    let (status, body) = send(&app, "/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["source"], "REPLICA");
    assert_eq!(body["pricing_engine"], "dynamic_demand_v1");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    // Most recently synced first
    assert_eq!(data[0]["id"], 2);
    assert_eq!(data[0]["price"], 20.0);
    assert_eq!(data[0]["dynamic_price"], 18.0);
    assert_eq!(data[0]["demand_score"], 0.9);
    assert!(data[0]["synced_at"].is_string());
    // Listings carry no recommendation
    assert!(data[0].get("pricing_recommendation").is_none());
}

#[tokio::test]
async fn test_get_product_with_recommendation() {
    let (_, app) = app_with_catalogue().await;

    let (status, body) = send(&app, "/api/products/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "product-1");
    assert_eq!(body["data"]["dynamic_price"], 13.0);

    let recommendation = &body["data"]["pricing_recommendation"];
    assert_eq!(recommendation["action"], "INCREASE_PRICE");
    assert_eq!(recommendation["reason"], "Low stock, high demand");
    assert_eq!(recommendation["confidence"], 0.95);
}

#[tokio::test]
async fn test_missing_product_is_404() {
    let (_, app) = app_with_catalogue().await;

    let (status, body) = send(&app, "/api/products/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn test_deleted_product_disappears() {
    let (store, app) = app_with_catalogue().await;
    store.delete_product(2).await.unwrap();

    let (status, _) = send(&app, "/api/products/2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "/api/products").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
async fn test_product_reviews() {
    let (_, app) = app_with_catalogue().await;

    let (status, body) = send(&app, "/api/products/1/reviews").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_reviews"], 2);
    assert_eq!(body["average_rating"], 4.5);

    let reviews = body["reviews"].as_array().unwrap();
    assert_eq!(reviews[0]["id"], 2);
    assert_eq!(reviews[0]["username"], "Anonymous");
    assert_eq!(reviews[1]["username"], "ada");
    assert_eq!(reviews[1]["user_id"], 10);
}

#[tokio::test]
async fn test_reviews_of_unreviewed_product() {
    let (_, app) = app_with_catalogue().await;

    let (status, body) = send(&app, "/api/products/2/reviews").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_reviews"], 0);
    assert_eq!(body["average_rating"], 0.0);
    assert!(body["reviews"].as_array().unwrap().is_empty());
}

// ============================================================================
// Analytics
// ============================================================================

#[tokio::test]
async fn test_pricing_analytics() {
    let (_, app) = app_with_catalogue().await;

    let (status, body) = send(&app, "/api/analytics/pricing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "REPLICA");

    let analytics = &body["analytics"];
    assert_eq!(analytics["total_products"], 2);
    assert_eq!(analytics["average_price"], 15.0);
    // (13.00 + 18.00) / 2
    assert_eq!(analytics["average_dynamic_price"], 15.5);
    assert_eq!(analytics["total_inventory"], 305);
    assert_eq!(analytics["low_stock_alerts"], 1);
    assert_eq!(analytics["high_demand_products"], 1);
    // 15.5 / 15 * 100 = 103.33..
    assert_eq!(analytics["pricing_efficiency"], 103.3);
}

#[tokio::test]
async fn test_empty_catalogue_analytics() {
    let app = build_router(Arc::new(MemoryReplicaStore::new()));

    let (status, body) = send(&app, "/api/analytics/pricing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analytics"]["total_products"], 0);
    assert_eq!(body["analytics"]["average_demand_score"], 1.0);
    assert_eq!(body["analytics"]["pricing_efficiency"], 0.0);
}

// ============================================================================
// Store failures
// ============================================================================

#[tokio::test]
async fn test_store_failure_is_500() {
    let app = build_router(Arc::new(BrokenReader));

    for uri in [
        "/api/products",
        "/api/products/1",
        "/api/products/1/reviews",
        "/api/analytics/pricing",
    ] {
        let (status, body) = send(&app, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "STORE_ERROR");
    }
}
