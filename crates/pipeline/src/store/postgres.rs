//! PostgreSQL replica store
//!
//! Owns the replica schema: `pricing_inventory` holds products with their
//! computed dynamic price and `reviews_replica` holds reviews. Tables are
//! created on connect when missing.
//!
//! Rows written by other tools may lack the derived columns; a missing
//! `dynamic_price` reads as the base price and a missing `demand_score` as 1.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shadowmesh_protocol::ReviewSnapshot;
use shadowmesh_transform::{PricedProduct, PricingAggregates};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tracing::info;

use super::{
    ReplicaReader, ReplicaStore, ReplicatedProduct, ReplicatedReview, ReviewSummary, StoreResult,
};

/// How long a write waits for a pooled connection
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, image_url, category, \
     dynamic_price, demand_score, synced_at";

/// Replica store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgReplicaStore {
    pool: PgPool,
}

impl PgReplicaStore {
    /// Open a pool against `url` and ensure the replica tables exist
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        info!(max_connections, "replica store connected");
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pricing_inventory (
                id BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                price NUMERIC(10, 2) NOT NULL,
                stock INTEGER NOT NULL DEFAULT 0,
                image_url TEXT,
                category VARCHAR(100),
                dynamic_price NUMERIC(10, 2),
                demand_score NUMERIC(5, 2) DEFAULT 1.0,
                synced_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews_replica (
                id BIGINT PRIMARY KEY,
                product_id BIGINT NOT NULL,
                user_id BIGINT,
                username VARCHAR(100),
                rating INTEGER NOT NULL,
                comment TEXT,
                synced_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_reviews_replica_product_id ON reviews_replica(product_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ReplicaStore for PgReplicaStore {
    async fn upsert_product(&self, product: &PricedProduct) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pricing_inventory
                (id, name, description, price, stock, image_url, category,
                 dynamic_price, demand_score, synced_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                stock = EXCLUDED.stock,
                image_url = EXCLUDED.image_url,
                category = EXCLUDED.category,
                dynamic_price = EXCLUDED.dynamic_price,
                demand_score = EXCLUDED.demand_score,
                synced_at = NOW()
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(&product.category)
        .bind(product.dynamic_price)
        .bind(product.demand_score)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_product(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM pricing_inventory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_review(&self, review: &ReviewSnapshot) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews_replica
                (id, product_id, user_id, username, rating, comment, synced_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (id) DO UPDATE SET
                product_id = EXCLUDED.product_id,
                user_id = EXCLUDED.user_id,
                username = EXCLUDED.username,
                rating = EXCLUDED.rating,
                comment = EXCLUDED.comment,
                synced_at = NOW()
            "#,
        )
        .bind(review.id)
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(&review.username)
        .bind(review.rating)
        .bind(&review.comment)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_review(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reviews_replica WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn product_from_row(row: &PgRow) -> StoreResult<ReplicatedProduct> {
    let price: Decimal = row.try_get("price")?;
    let dynamic_price: Option<Decimal> = row.try_get("dynamic_price")?;
    let demand_score: Option<Decimal> = row.try_get("demand_score")?;

    Ok(ReplicatedProduct {
        product: PricedProduct {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price,
            stock: row.try_get("stock")?,
            image_url: row.try_get("image_url")?,
            category: row.try_get("category")?,
            dynamic_price: dynamic_price.unwrap_or(price),
            demand_score: demand_score.unwrap_or(Decimal::ONE),
        },
        synced_at: row.try_get("synced_at")?,
    })
}

fn review_from_row(row: &PgRow) -> StoreResult<ReplicatedReview> {
    Ok(ReplicatedReview {
        review: ReviewSnapshot {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            user_id: row.try_get("user_id")?,
            username: row.try_get("username")?,
            rating: row.try_get("rating")?,
            comment: row.try_get("comment")?,
        },
        synced_at: row.try_get("synced_at")?,
    })
}

#[async_trait]
impl ReplicaReader for PgReplicaStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_products(&self) -> StoreResult<Vec<ReplicatedProduct>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM pricing_inventory ORDER BY synced_at DESC, id DESC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn find_product(&self, id: i64) -> StoreResult<Option<ReplicatedProduct>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM pricing_inventory WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn product_reviews(&self, product_id: i64) -> StoreResult<ReviewSummary> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, user_id, username, rating, comment, synced_at
            FROM reviews_replica
            WHERE product_id = $1
            ORDER BY synced_at DESC, id DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        let reviews = rows
            .iter()
            .map(review_from_row)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(ReviewSummary::new(product_id, reviews))
    }

    async fn pricing_aggregates(&self) -> StoreResult<PricingAggregates> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_products,
                AVG(price) AS avg_price,
                AVG(COALESCE(dynamic_price, price)) AS avg_dynamic_price,
                AVG(COALESCE(demand_score, 1.0)) AS avg_demand_score,
                COALESCE(SUM(stock), 0)::BIGINT AS total_stock,
                COUNT(*) FILTER (WHERE stock < 10) AS low_stock,
                COUNT(*) FILTER (WHERE demand_score > 1.1) AS high_demand
            FROM pricing_inventory
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(PricingAggregates {
            total_products: row.try_get("total_products")?,
            avg_price: row.try_get("avg_price")?,
            avg_dynamic_price: row.try_get("avg_dynamic_price")?,
            avg_demand_score: row.try_get("avg_demand_score")?,
            total_stock: row.try_get("total_stock")?,
            low_stock: row.try_get("low_stock")?,
            high_demand: row.try_get("high_demand")?,
        })
    }
}
