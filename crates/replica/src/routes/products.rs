//! Product and review reads
//!
//! Prices go out as JSON numbers. Rows come back exactly as the pipeline
//! stored them, so a product's `dynamic_price` is the one computed at its
//! last sync.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shadowmesh_pipeline::{ReplicatedProduct, ReplicatedReview};
use shadowmesh_transform::Recommendation;
use tracing::debug;

use super::ReplicaState;
use crate::SOURCE;
use crate::error::{ReplicaError, Result};

/// Name of the pricing model reported with product listings
pub const PRICING_ENGINE: &str = "dynamic_demand_v1";

/// Username shown for reviews without one
pub const ANONYMOUS: &str = "Anonymous";

/// A product as served
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub category: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub dynamic_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub demand_score: Decimal,
    pub synced_at: DateTime<Utc>,
    /// Only on single-product reads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_recommendation: Option<Recommendation>,
}

impl From<ReplicatedProduct> for ProductView {
    fn from(row: ReplicatedProduct) -> Self {
        let product = row.product;
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image_url: product.image_url,
            category: product.category,
            dynamic_price: product.dynamic_price,
            demand_score: product.demand_score,
            synced_at: row.synced_at,
            pricing_recommendation: None,
        }
    }
}

/// A review as served
#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: i64,
    pub product_id: i64,
    pub user_id: Option<i64>,
    pub username: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub synced_at: DateTime<Utc>,
}

impl From<ReplicatedReview> for ReviewView {
    fn from(row: ReplicatedReview) -> Self {
        let review = row.review;
        Self {
            id: review.id,
            product_id: review.product_id,
            user_id: review.user_id,
            username: review.username.unwrap_or_else(|| ANONYMOUS.to_string()),
            rating: review.rating,
            comment: review.comment,
            synced_at: row.synced_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub source: &'static str,
    pub data: Vec<ProductView>,
    pub pricing_engine: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub source: &'static str,
    pub data: ProductView,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub success: bool,
    pub source: &'static str,
    pub reviews: Vec<ReviewView>,
    /// Zero when there are no reviews
    #[serde(with = "rust_decimal::serde::float")]
    pub average_rating: Decimal,
    pub total_reviews: usize,
}

pub fn routes() -> Router<ReplicaState> {
    Router::new()
        .route("/api/products", get(list_handler))
        .route("/api/products/{id}", get(product_handler))
        .route("/api/products/{id}/reviews", get(reviews_handler))
}

/// GET /api/products
async fn list_handler(State(reader): State<ReplicaState>) -> Result<Json<ProductListResponse>> {
    let rows = reader.list_products().await?;
    debug!(count = rows.len(), "listed replica products");

    Ok(Json(ProductListResponse {
        success: true,
        source: SOURCE,
        data: rows.into_iter().map(ProductView::from).collect(),
        pricing_engine: PRICING_ENGINE,
    }))
}

/// GET /api/products/{id}
async fn product_handler(
    State(reader): State<ReplicaState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>> {
    let row = reader
        .find_product(id)
        .await?
        .ok_or(ReplicaError::ProductNotFound(id))?;

    let recommendation = row.product.recommendation();
    let mut data = ProductView::from(row);
    data.pricing_recommendation = Some(recommendation);

    Ok(Json(ProductResponse {
        success: true,
        source: SOURCE,
        data,
    }))
}

/// GET /api/products/{id}/reviews
///
/// A product without reviews, or one not in the replica at all, gets an
/// empty list.
async fn reviews_handler(
    State(reader): State<ReplicaState>,
    Path(id): Path<i64>,
) -> Result<Json<ReviewsResponse>> {
    let summary = reader.product_reviews(id).await?;
    let total_reviews = summary.total_reviews();

    Ok(Json(ReviewsResponse {
        success: true,
        source: SOURCE,
        average_rating: summary.average_rating.unwrap_or(Decimal::ZERO),
        reviews: summary.reviews.into_iter().map(ReviewView::from).collect(),
        total_reviews,
    }))
}
