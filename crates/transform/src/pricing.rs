//! Dynamic pricing
//!
//! Scarce products get a markup, overstocked ones a discount. The factor is a
//! step function of stock, evaluated in a fixed order so the bands never
//! overlap.

use rust_decimal::{Decimal, RoundingStrategy};
use shadowmesh_protocol::ProductSnapshot;

/// Stock below which the scarcity markup applies
pub const LOW_STOCK: i32 = 10;

/// Stock above which the overstock discount applies
pub const OVERSTOCK: i32 = 200;

/// Demand score above which a product counts as in high demand
pub fn high_demand_threshold() -> Decimal {
    Decimal::new(110, 2)
}

/// Demand factor for a stock level
///
/// | stock      | factor |
/// |------------|--------|
/// | < 10       | 1.30   |
/// | < 25       | 1.15   |
/// | < 50       | 1.05   |
/// | > 200      | 0.90   |
/// | otherwise  | 1.00   |
pub fn demand_factor(stock: i32) -> Decimal {
    if stock < LOW_STOCK {
        Decimal::new(130, 2)
    } else if stock < 25 {
        Decimal::new(115, 2)
    } else if stock < 50 {
        Decimal::new(105, 2)
    } else if stock > OVERSTOCK {
        Decimal::new(90, 2)
    } else {
        Decimal::ONE
    }
}

/// Round to two decimal places, half away from zero
#[inline]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Derived pricing columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicPrice {
    /// `round2(price * factor)`
    pub price: Decimal,
    /// `round2(factor)`
    pub demand_score: Decimal,
}

/// Compute the dynamic price for a base price and stock level
pub fn compute_dynamic_price(price: Decimal, stock: i32) -> DynamicPrice {
    let factor = demand_factor(stock);
    DynamicPrice {
        price: round2(price.saturating_mul(factor)),
        demand_score: round2(factor),
    }
}

/// A product snapshot with its derived pricing columns
///
/// This is the row shape of `pricing_inventory`, minus `synced_at` which the
/// store stamps on write.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedProduct {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub dynamic_price: Decimal,
    pub demand_score: Decimal,
}

impl PricedProduct {
    /// Apply the pricing transform to a snapshot
    pub fn from_snapshot(snapshot: ProductSnapshot) -> Self {
        let derived = compute_dynamic_price(snapshot.price, snapshot.stock);
        Self {
            id: snapshot.id,
            name: snapshot.name,
            description: snapshot.description,
            price: snapshot.price,
            stock: snapshot.stock,
            image_url: snapshot.image_url,
            category: snapshot.category,
            dynamic_price: derived.price,
            demand_score: derived.demand_score,
        }
    }
}

impl From<ProductSnapshot> for PricedProduct {
    fn from(snapshot: ProductSnapshot) -> Self {
        Self::from_snapshot(snapshot)
    }
}
