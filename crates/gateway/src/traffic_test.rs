//! Weight, draw and statistics tests

use serde_json::json;

use crate::error::GatewayError;
use crate::traffic::{
    Backend, RandomPicker, StatsSnapshot, TrafficState, WeightedPicker, choose_backend,
    parse_weight,
};

#[test]
fn test_choose_backend_threshold() {
    assert_eq!(choose_backend(0, 0), Backend::Legacy);
    assert_eq!(choose_backend(30, 29), Backend::Replica);
    assert_eq!(choose_backend(30, 30), Backend::Legacy);
    assert_eq!(choose_backend(100, 99), Backend::Replica);
}

#[test]
fn test_weight_zero_never_picks_replica() {
    assert!((0..100).all(|draw| choose_backend(0, draw) == Backend::Legacy));
}

#[test]
fn test_weight_hundred_always_picks_replica() {
    assert!((0..100).all(|draw| choose_backend(100, draw) == Backend::Replica));
}

#[test]
fn test_random_draws_in_range() {
    let picker = RandomPicker;
    assert!((0..1000).all(|_| picker.draw() < 100));
}

#[test]
fn test_weight_fifty_splits_evenly() {
    let picker = RandomPicker;
    let draws = 10_000;
    let replica = (0..draws)
        .filter(|_| choose_backend(50, picker.draw()) == Backend::Replica)
        .count();

    let fraction = replica as f64 / draws as f64;
    assert!(
        (fraction - 0.5).abs() <= 0.02,
        "replica fraction {} outside 0.5 +/- 0.02",
        fraction
    );
}

#[test]
fn test_parse_weight_accepts_integers() {
    assert_eq!(parse_weight(Some(&json!(0))).unwrap(), 0);
    assert_eq!(parse_weight(Some(&json!(42))).unwrap(), 42);
    assert_eq!(parse_weight(Some(&json!(100))).unwrap(), 100);
}

#[test]
fn test_parse_weight_rejects_invalid() {
    for value in [
        json!(-1),
        json!(101),
        json!(50.5),
        json!("50"),
        json!(null),
        json!(u64::MAX),
    ] {
        assert!(
            matches!(parse_weight(Some(&value)), Err(GatewayError::InvalidWeight(_))),
            "{} should be rejected",
            value
        );
    }
    assert!(matches!(
        parse_weight(None),
        Err(GatewayError::InvalidWeight(_))
    ));
}

#[test]
fn test_set_weight() {
    let state = TrafficState::new(10);
    assert_eq!(state.weight(), 10);

    assert_eq!(state.set_weight(75).unwrap(), 10);
    assert_eq!(state.weight(), 75);

    assert!(state.set_weight(101).is_err());
    assert_eq!(state.weight(), 75);
}

#[test]
fn test_initial_weight_clamped() {
    assert_eq!(TrafficState::new(250).weight(), 100);
}

#[test]
fn test_stats_and_reset() {
    let state = TrafficState::new(0);
    state.record_read(Backend::Legacy);
    state.record_read(Backend::Replica);
    state.record_attempt(Backend::Legacy);

    assert_eq!(
        state.stats(),
        StatsSnapshot {
            total: 2,
            to_legacy: 2,
            to_replica: 1,
        }
    );

    assert_eq!(state.reset_stats(), StatsSnapshot::default());
    assert_eq!(state.stats(), StatsSnapshot::default());
}

#[test]
fn test_serialization() {
    let stats = StatsSnapshot {
        total: 3,
        to_legacy: 2,
        to_replica: 1,
    };
    assert_eq!(
        serde_json::to_value(stats).unwrap(),
        json!({"total": 3, "toLegacy": 2, "toReplica": 1})
    );
    assert_eq!(serde_json::to_value(Backend::Replica).unwrap(), json!("REPLICA"));
    assert_eq!(Backend::Legacy.other(), Backend::Replica);
    assert_eq!(Backend::Legacy.to_string(), "LEGACY");
}
