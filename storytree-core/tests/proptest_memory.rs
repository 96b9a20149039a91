//! Property-Based Tests for StoryTree Core
//!
//! Uses `proptest` to check the memory engine's invariants under random
//! inputs: attribute bounds, cached vector length, dot/normalize algebra,
//! combination, and bank aggregation.

use proptest::prelude::*;

use storytree_core::attribute::Attribute;
use storytree_core::memory::{MemoryBank, MemoryVector};
use storytree_core::mutation::{IntegerOp, Mutation};
use storytree_core::types::DimensionKey;
use storytree_core::StoryError;

const TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_key() -> impl Strategy<Value = DimensionKey> {
    (
        prop::sample::select(vec!["bob", "alice", "carol"]),
        prop::sample::select(vec!["mood", "health"]),
        prop::sample::select(vec!["anger", "joy", "hp", "fear"]),
    )
        .prop_map(|(c, cls, kind)| DimensionKey::new(c, cls, kind).expect("key"))
}

fn arb_vector() -> impl Strategy<Value = MemoryVector> {
    prop::collection::vec((arb_key(), -10.0..10.0f64), 0..12).prop_map(|entries| {
        let mut v = MemoryVector::new();
        for (k, value) in entries {
            v.encode_raw(k, value);
        }
        v
    })
}

fn arb_op() -> impl Strategy<Value = IntegerOp> {
    prop_oneof![Just(IntegerOp::Add), Just(IntegerOp::Subtract), Just(IntegerOp::Set)]
}

/// `(min, max, start)` with `min < max` and `start` in range.
fn arb_range() -> impl Strategy<Value = (i32, i32, i32)> {
    (-1000..1000i32, 1..500i32)
        .prop_flat_map(|(min, span)| (Just(min), Just(min + span), min..=min + span))
}

fn sum_of_squares(v: &MemoryVector) -> f64 {
    v.iter().map(|(_, x)| x * x).sum()
}

// ---------------------------------------------------------------------------
// Property: integer attributes stay within bounds
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn attribute_stays_in_bounds(
        (min, max, start) in arb_range(),
        steps in prop::collection::vec((arb_op(), 0..2000i32), 1..40),
    ) {
        let key = DimensionKey::new("bob", "mood", "anger").expect("key");
        let mut attr = Attribute::integer(key.clone(), start, min, max).expect("attr");
        for (op, amount) in steps {
            let m = Mutation::integer(key.clone(), op, amount).expect("mutation");
            attr.apply(&m).expect("apply");
            let value = attr.as_integer().expect("integer");
            prop_assert!(value >= min && value <= max);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: impact of Add/Subtract never exceeds 1 and is non-negative
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn clamped_impact_is_a_fraction(
        (min, max, start) in arb_range(),
        subtract in any::<bool>(),
        amount in 0..5000i32,
    ) {
        let key = DimensionKey::new("bob", "mood", "anger").expect("key");
        let attr = Attribute::integer(key.clone(), start, min, max).expect("attr");
        let op = if subtract { IntegerOp::Subtract } else { IntegerOp::Add };
        let impact = Mutation::integer(key, op, amount).expect("m").impact(&attr).expect("impact");
        prop_assert!((0.0..=1.0).contains(&impact));
    }
}

// ---------------------------------------------------------------------------
// Property: encoding accumulates and keeps the cached length exact
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn encode_accumulates(amounts in prop::collection::vec(0..10i32, 1..8)) {
        let key = DimensionKey::new("bob", "mood", "anger").expect("key");
        let attr = Attribute::integer(key.clone(), 0, 0, 10).expect("attr");
        let mut v = MemoryVector::new();
        let mut expected = 0.0;
        for amount in amounts {
            let m = Mutation::integer(key.clone(), IntegerOp::Add, amount).expect("m");
            expected += v.encode(&m, &attr).expect("encode");
        }
        prop_assert!((v.get(&key) - expected).abs() < TOLERANCE);
        prop_assert!((v.squared_length() - expected * expected).abs() < TOLERANCE);
    }
}

proptest! {
    #[test]
    fn cached_length_matches_entries(v in arb_vector()) {
        prop_assert!((v.squared_length() - sum_of_squares(&v)).abs() < TOLERANCE);
        prop_assert!((v.length().powi(2) - v.squared_length()).abs() < TOLERANCE);
    }
}

// ---------------------------------------------------------------------------
// Property: normalization
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn normalize_is_unit_or_fails(v in arb_vector()) {
        match v.normalize() {
            Ok(n) => {
                prop_assert!((n.length() - 1.0).abs() < TOLERANCE);
                prop_assert_eq!(n.path(), v.path());
            }
            Err(e) => {
                prop_assert!(matches!(e, StoryError::ZeroLengthVector));
                prop_assert!(v.length() == 0.0);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property: dot product algebra
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn dot_is_commutative(a in arb_vector(), b in arb_vector()) {
        prop_assert!((a.dot(&b) - b.dot(&a)).abs() < TOLERANCE);
    }

    #[test]
    fn self_dot_is_squared_length(a in arb_vector()) {
        prop_assert!((a.dot(&a) - a.squared_length()).abs() < TOLERANCE);
    }
}

// ---------------------------------------------------------------------------
// Property: combine is an elementwise sum over the union
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn combine_sums_every_key(a in arb_vector(), b in arb_vector()) {
        let c = MemoryVector::combine(&a, &b);
        for (k, _) in a.iter().chain(b.iter()) {
            prop_assert!((c.get(k) - (a.get(k) + b.get(k))).abs() < TOLERANCE);
        }
        prop_assert!(c.len() <= a.len() + b.len());
        prop_assert!(c.path().is_none());
        prop_assert!((c.squared_length() - sum_of_squares(&c)).abs() < TOLERANCE);
    }
}

// ---------------------------------------------------------------------------
// Property: bank aggregation is one pass per memory
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn bank_total_matches_closed_form(values in prop::collection::vec(0.0..1.0f64, 1..30)) {
        let key = DimensionKey::new("bob", "mood", "anger").expect("key");
        let mut bank = MemoryBank::new();
        let mut expected = 0.0;
        for (i, value) in values.iter().enumerate() {
            let mut v = MemoryVector::new();
            v.encode_raw(key.clone(), *value);
            bank.add_memory(v);
            expected += value + 0.1 * i as f64;
        }
        prop_assert_eq!(bank.step_count(), values.len());
        prop_assert_eq!(bank.history().len(), values.len());
        prop_assert!((bank.total().get(&key) - expected).abs() < 1e-6);
    }
}
