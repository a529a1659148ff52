//! Pricing analytics
//!
//! Catalogue-wide figures over the replicated products. Aggregation and
//! presentation are split: a store may compute [`PricingAggregates`] itself
//! (in SQL, say) and still share the rounding rules in
//! [`PricingAnalytics::from`].

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::pricing::{LOW_STOCK, PricedProduct, high_demand_threshold, round2};

/// Raw aggregates over the products table
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PricingAggregates {
    pub total_products: i64,
    /// `None` when there are no products
    pub avg_price: Option<Decimal>,
    pub avg_dynamic_price: Option<Decimal>,
    pub avg_demand_score: Option<Decimal>,
    pub total_stock: i64,
    /// Products with stock below [`LOW_STOCK`]
    pub low_stock: i64,
    /// Products whose demand score is above 1.10
    pub high_demand: i64,
}

impl PricingAggregates {
    /// Aggregate a set of products
    pub fn from_products<'a, I>(products: I) -> Self
    where
        I: IntoIterator<Item = &'a PricedProduct>,
    {
        let mut aggregates = Self::default();
        let mut price = Decimal::ZERO;
        let mut dynamic_price = Decimal::ZERO;
        let mut demand_score = Decimal::ZERO;
        let threshold = high_demand_threshold();

        for product in products {
            aggregates.total_products += 1;
            aggregates.total_stock += i64::from(product.stock);
            price = price.saturating_add(product.price);
            dynamic_price = dynamic_price.saturating_add(product.dynamic_price);
            demand_score = demand_score.saturating_add(product.demand_score);

            if product.stock < LOW_STOCK {
                aggregates.low_stock += 1;
            }
            if product.demand_score > threshold {
                aggregates.high_demand += 1;
            }
        }

        if aggregates.total_products > 0 {
            let count = Decimal::from(aggregates.total_products);
            aggregates.avg_price = price.checked_div(count);
            aggregates.avg_dynamic_price = dynamic_price.checked_div(count);
            aggregates.avg_demand_score = demand_score.checked_div(count);
        }
        aggregates
    }
}

/// Analytics as served by the replica read service
///
/// Averages are rounded to two places. An empty catalogue reports a zero
/// price, a neutral demand score of 1.00 and zero efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingAnalytics {
    pub total_products: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_dynamic_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_demand_score: Decimal,
    pub total_inventory: i64,
    pub low_stock_alerts: i64,
    pub high_demand_products: i64,
    /// Average dynamic price as a percentage of the average base price,
    /// one decimal place
    #[serde(with = "rust_decimal::serde::float")]
    pub pricing_efficiency: Decimal,
}

impl From<PricingAggregates> for PricingAnalytics {
    fn from(aggregates: PricingAggregates) -> Self {
        let avg_price = aggregates.avg_price.unwrap_or(Decimal::ZERO);
        let avg_dynamic_price = aggregates.avg_dynamic_price.unwrap_or(Decimal::ZERO);

        // A zero base price would divide by zero; the ratio is taken against 1
        let base = if avg_price.is_zero() {
            Decimal::ONE
        } else {
            avg_price
        };
        let efficiency = avg_dynamic_price
            .checked_div(base)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);

        Self {
            total_products: aggregates.total_products,
            average_price: round2(avg_price),
            average_dynamic_price: round2(avg_dynamic_price),
            average_demand_score: round2(aggregates.avg_demand_score.unwrap_or(Decimal::ONE)),
            total_inventory: aggregates.total_stock,
            low_stock_alerts: aggregates.low_stock,
            high_demand_products: aggregates.high_demand,
            pricing_efficiency: efficiency,
        }
    }
}
