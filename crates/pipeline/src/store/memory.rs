//! In-memory replica store
//!
//! Backs tests and embedded use. Rows live in ordered maps behind a
//! `parking_lot::RwLock`; no lock is held across an await.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shadowmesh_protocol::ReviewSnapshot;
use shadowmesh_transform::{PricedProduct, PricingAggregates};

use super::{
    ReplicaReader, ReplicaStore, ReplicatedProduct, ReplicatedReview, ReviewSummary, StoreResult,
};

/// Replica store held in process memory
#[derive(Debug, Default)]
pub struct MemoryReplicaStore {
    products: RwLock<BTreeMap<i64, ReplicatedProduct>>,
    reviews: RwLock<BTreeMap<i64, ReplicatedReview>>,
}

impl MemoryReplicaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Product row by id
    pub fn product(&self, id: i64) -> Option<ReplicatedProduct> {
        self.products.read().get(&id).cloned()
    }

    /// Review row by id
    pub fn review(&self, id: i64) -> Option<ReplicatedReview> {
        self.reviews.read().get(&id).cloned()
    }

    pub fn product_count(&self) -> usize {
        self.products.read().len()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.read().len()
    }
}

#[async_trait]
impl ReplicaStore for MemoryReplicaStore {
    async fn upsert_product(&self, product: &PricedProduct) -> StoreResult<()> {
        let row = ReplicatedProduct {
            product: product.clone(),
            synced_at: Utc::now(),
        };
        self.products.write().insert(product.id, row);
        Ok(())
    }

    async fn delete_product(&self, id: i64) -> StoreResult<bool> {
        Ok(self.products.write().remove(&id).is_some())
    }

    async fn upsert_review(&self, review: &ReviewSnapshot) -> StoreResult<()> {
        let row = ReplicatedReview {
            review: review.clone(),
            synced_at: Utc::now(),
        };
        self.reviews.write().insert(review.id, row);
        Ok(())
    }

    async fn delete_review(&self, id: i64) -> StoreResult<bool> {
        Ok(self.reviews.write().remove(&id).is_some())
    }
}

#[async_trait]
impl ReplicaReader for MemoryReplicaStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_products(&self) -> StoreResult<Vec<ReplicatedProduct>> {
        let mut rows: Vec<ReplicatedProduct> = self.products.read().values().cloned().collect();
        // Ties on the timestamp go to the higher id
        rows.sort_by_key(|row| Reverse((row.synced_at, row.product.id)));
        Ok(rows)
    }

    async fn find_product(&self, id: i64) -> StoreResult<Option<ReplicatedProduct>> {
        Ok(self.product(id))
    }

    async fn product_reviews(&self, product_id: i64) -> StoreResult<ReviewSummary> {
        let mut reviews: Vec<ReplicatedReview> = self
            .reviews
            .read()
            .values()
            .filter(|row| row.review.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|row| Reverse((row.synced_at, row.review.id)));
        Ok(ReviewSummary::new(product_id, reviews))
    }

    async fn pricing_aggregates(&self) -> StoreResult<PricingAggregates> {
        Ok(PricingAggregates::from_products(
            self.products.read().values().map(|row| &row.product),
        ))
    }
}
