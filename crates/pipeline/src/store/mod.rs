//! Replica store
//!
//! Where decoded change events land. Writes are unconditional upserts keyed by
//! primary key, so replaying a stream is harmless (last write wins).
//!
//! [`ReplicaStore`] is the pipeline's write side; [`ReplicaReader`] is what the
//! replica read service queries.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use shadowmesh_protocol::ReviewSnapshot;
use shadowmesh_transform::{PricedProduct, PricingAggregates};

use crate::error::StoreError;

pub use memory::MemoryReplicaStore;
pub use postgres::PgReplicaStore;

/// Replica table for products
pub const PRODUCTS_TABLE: &str = "pricing_inventory";

/// Replica table for reviews
pub const REVIEWS_TABLE: &str = "reviews_replica";

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Write side of the replica store
///
/// Implement this trait to plug a different backend into the pipeline.
#[async_trait]
pub trait ReplicaStore: Send + Sync {
    /// Insert or overwrite a product row, stamping `synced_at`
    async fn upsert_product(&self, product: &PricedProduct) -> StoreResult<()>;

    /// Delete a product row; returns whether a row existed
    async fn delete_product(&self, id: i64) -> StoreResult<bool>;

    /// Insert or overwrite a review row, stamping `synced_at`
    async fn upsert_review(&self, review: &ReviewSnapshot) -> StoreResult<()>;

    /// Delete a review row; returns whether a row existed
    async fn delete_review(&self, id: i64) -> StoreResult<bool>;
}

/// A product row as stored in the replica
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicatedProduct {
    pub product: PricedProduct,
    pub synced_at: DateTime<Utc>,
}

/// A review row as stored in the replica
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicatedReview {
    pub review: ReviewSnapshot,
    pub synced_at: DateTime<Utc>,
}

/// Read side of the replica store
#[async_trait]
pub trait ReplicaReader: Send + Sync {
    /// Round trip to the backend
    async fn ping(&self) -> StoreResult<()>;

    /// All product rows, most recently synced first
    async fn list_products(&self) -> StoreResult<Vec<ReplicatedProduct>>;

    /// Product row by id
    async fn find_product(&self, id: i64) -> StoreResult<Option<ReplicatedProduct>>;

    /// Reviews of a product, most recently synced first
    async fn product_reviews(&self, product_id: i64) -> StoreResult<ReviewSummary>;

    /// Catalogue-wide pricing aggregates
    async fn pricing_aggregates(&self) -> StoreResult<PricingAggregates>;
}

/// Reviews of one product with their average rating
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub product_id: i64,
    pub reviews: Vec<ReplicatedReview>,
    /// Mean rating rounded to one decimal; `None` without reviews
    pub average_rating: Option<Decimal>,
}

impl ReviewSummary {
    /// Summarize `reviews`, keeping their order
    pub fn new(product_id: i64, reviews: Vec<ReplicatedReview>) -> Self {
        let average_rating = if reviews.is_empty() {
            None
        } else {
            let total: i64 = reviews.iter().map(|r| i64::from(r.review.rating)).sum();
            Decimal::from(total)
                .checked_div(Decimal::from(reviews.len() as u64))
                .map(|mean| mean.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        };

        Self {
            product_id,
            reviews,
            average_rating,
        }
    }

    pub fn total_reviews(&self) -> usize {
        self.reviews.len()
    }
}
