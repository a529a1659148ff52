//! Traffic weight and request statistics
//!
//! The weight is the percentage of reads sent to the replica. It lives in an
//! `AtomicU8`; a request reads it once, so a concurrent change never splits a
//! single request across two weights. Counters use relaxed ordering.

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::error::{GatewayError, Result};

/// Highest accepted weight
pub const MAX_WEIGHT: u8 = 100;

/// A read backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Backend {
    /// The authoritative monolith
    Legacy,
    /// The CDC-fed replica service
    Replica,
}

impl Backend {
    /// Value of the `X-Source` header and the `source` body field
    pub fn label(&self) -> &'static str {
        match self {
            Self::Legacy => "LEGACY",
            Self::Replica => "REPLICA",
        }
    }

    /// The backend to fall back to
    pub fn other(&self) -> Self {
        match self {
            Self::Legacy => Self::Replica,
            Self::Replica => Self::Legacy,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick a backend for a draw in `0..100`
///
/// A draw at or above the weight goes to legacy, so weight 0 never selects
/// the replica and weight 100 always does.
#[inline]
pub fn choose_backend(weight: u8, draw: u8) -> Backend {
    if draw >= weight {
        Backend::Legacy
    } else {
        Backend::Replica
    }
}

/// Source of uniform draws in `0..100`
pub trait WeightedPicker: Send + Sync {
    fn draw(&self) -> u8;
}

/// Draws from the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl WeightedPicker for RandomPicker {
    fn draw(&self) -> u8 {
        rand::rng().random_range(0..MAX_WEIGHT)
    }
}

/// Validate a weight taken from a JSON request body
///
/// Only integral JSON numbers in `0..=100` are accepted; floats, strings and
/// missing values are rejected.
pub fn parse_weight(value: Option<&Value>) -> Result<u8> {
    let value = value.ok_or_else(|| GatewayError::invalid_weight("weight is required"))?;
    let weight = value
        .as_i64()
        .ok_or_else(|| GatewayError::invalid_weight(format!("{} is not an integer", value)))?;
    u8::try_from(weight)
        .ok()
        .filter(|w| *w <= MAX_WEIGHT)
        .ok_or_else(|| {
            GatewayError::invalid_weight(format!("{} is outside 0..={}", weight, MAX_WEIGHT))
        })
}

/// Routing weight plus read counters
#[derive(Debug, Default)]
pub struct TrafficState {
    weight: AtomicU8,
    total: AtomicU64,
    to_legacy: AtomicU64,
    to_replica: AtomicU64,
}

/// Point-in-time copy of the read counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Reads routed
    pub total: u64,
    /// Reads that attempted legacy (as primary or fallback)
    pub to_legacy: u64,
    /// Reads that attempted the replica (as primary or fallback)
    pub to_replica: u64,
}

impl TrafficState {
    /// Create state with an initial weight, clamped to 100
    pub fn new(initial_weight: u8) -> Self {
        Self {
            weight: AtomicU8::new(initial_weight.min(MAX_WEIGHT)),
            ..Self::default()
        }
    }

    #[inline]
    pub fn weight(&self) -> u8 {
        self.weight.load(Ordering::Relaxed)
    }

    /// Replace the weight, returning the previous one
    pub fn set_weight(&self, weight: u8) -> Result<u8> {
        if weight > MAX_WEIGHT {
            return Err(GatewayError::invalid_weight(format!(
                "{} is outside 0..={}",
                weight, MAX_WEIGHT
            )));
        }
        Ok(self.weight.swap(weight, Ordering::Relaxed))
    }

    /// Count a routed read and its primary attempt
    #[inline]
    pub fn record_read(&self, primary: Backend) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.record_attempt(primary);
    }

    /// Count an attempt against `backend`
    #[inline]
    pub fn record_attempt(&self, backend: Backend) {
        match backend {
            Backend::Legacy => self.to_legacy.fetch_add(1, Ordering::Relaxed),
            Backend::Replica => self.to_replica.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            to_legacy: self.to_legacy.load(Ordering::Relaxed),
            to_replica: self.to_replica.load(Ordering::Relaxed),
        }
    }

    /// Zero all counters and return the zeroed snapshot
    pub fn reset_stats(&self) -> StatsSnapshot {
        self.total.store(0, Ordering::Relaxed);
        self.to_legacy.store(0, Ordering::Relaxed);
        self.to_replica.store(0, Ordering::Relaxed);
        StatsSnapshot::default()
    }
}
