//! Pricing recommendation
//!
//! A rule-based suggestion attached to replica product reads. First matching
//! rule wins.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::pricing::{LOW_STOCK, OVERSTOCK, PricedProduct, high_demand_threshold};

/// Suggested pricing action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingAction {
    IncreasePrice,
    DecreasePrice,
    Hold,
    Monitor,
}

impl PricingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncreasePrice => "INCREASE_PRICE",
            Self::DecreasePrice => "DECREASE_PRICE",
            Self::Hold => "HOLD",
            Self::Monitor => "MONITOR",
        }
    }
}

impl fmt::Display for PricingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommendation with its rationale
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub action: PricingAction,
    pub reason: &'static str,
    pub confidence: f64,
}

/// Recommend a pricing action
///
/// Rules, in order: stock < 10 increase (0.95); stock > 200 decrease (0.85);
/// demand score > 1.1 hold (0.90); otherwise monitor (0.75).
pub fn recommend(stock: i32, demand_score: Decimal) -> Recommendation {
    if stock < LOW_STOCK {
        Recommendation {
            action: PricingAction::IncreasePrice,
            reason: "Low stock, high demand",
            confidence: 0.95,
        }
    } else if stock > OVERSTOCK {
        Recommendation {
            action: PricingAction::DecreasePrice,
            reason: "Overstock, promote sales",
            confidence: 0.85,
        }
    } else if demand_score > high_demand_threshold() {
        Recommendation {
            action: PricingAction::Hold,
            reason: "Optimal pricing for current demand",
            confidence: 0.90,
        }
    } else {
        Recommendation {
            action: PricingAction::Monitor,
            reason: "Stable market conditions",
            confidence: 0.75,
        }
    }
}

impl PricedProduct {
    /// Recommendation for this product's stock and demand score
    pub fn recommendation(&self) -> Recommendation {
        recommend(self.stock, self.demand_score)
    }
}
