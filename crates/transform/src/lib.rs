//! ShadowMesh Transform - Replica-side derived fields
//!
//! Pure functions applied to product snapshots before they are written to the
//! replica store.
//!
//! # Overview
//!
//! - `pricing` - Demand factor from stock level and the dynamic price derived
//!   from it
//! - `recommendation` - Rule-based pricing action for a priced product
//! - `analytics` - Catalogue-wide averages and stock alerts
//!
//! # Design Principles
//!
//! - **Pure**: No I/O, no clocks, no randomness; same input, same output
//! - **Exact**: All arithmetic is fixed-point `Decimal`, rounded half away from
//!   zero to two places
//!
//! # Example
//!
//! ```
//! use shadowmesh_transform::compute_dynamic_price;
//! use shadowmesh_protocol::Decimal;
//!
//! let priced = compute_dynamic_price(Decimal::new(1000, 2), 5);
//! assert_eq!(priced.price, Decimal::new(1300, 2));
//! assert_eq!(priced.demand_score, Decimal::new(130, 2));
//! ```

pub mod analytics;
pub mod pricing;
pub mod recommendation;

pub use analytics::{PricingAggregates, PricingAnalytics};
pub use pricing::{
    DynamicPrice, PricedProduct, compute_dynamic_price, demand_factor, high_demand_threshold,
    round2,
};
pub use recommendation::{PricingAction, Recommendation, recommend};
