//! Property-based invariant tests for shape defaults and equality.
//!
//! 1. Every shape's equality is reflexive on NaN-free values.
//! 2. Every shape's equality is symmetric.
//! 3. Mapping equality agrees with structural equality on maps.
//! 4. Sequence equality is order-sensitive.
//! 5. Checkpoint equality ignores nothing but reference identity.
//! 6. `normalize` is idempotent and only touches `Absent`.

use std::collections::BTreeMap;

use bindery_core::shape::{checkpoints_eq, mapping_eq, sequence_eq};
use bindery_core::{CheckpointIds, Shape, Value};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn id_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,4}"
}

fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Absent),
        any::<bool>().prop_map(Value::Bool),
        (-1000i32..1000).prop_map(Value::from),
        id_strategy().prop_map(Value::Text),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            proptest::collection::btree_map(id_strategy(), inner, 0..4).prop_map(Value::Map),
        ]
    })
}

fn checkpoints_strategy() -> impl Strategy<Value = Value> {
    (
        proptest::collection::vec(id_strategy(), 0..4),
        proptest::option::of(id_strategy()),
        proptest::collection::vec(id_strategy(), 0..4),
    )
        .prop_map(|(b, c, f)| Value::Checkpoints(CheckpointIds::new(b, c, f)))
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    proptest::sample::select(Shape::ALL.to_vec())
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Reflexivity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn equality_is_reflexive(shape in shape_strategy(), v in value_strategy()) {
        prop_assert!(shape.equals(&v, &v.clone()), "{:?} not equal to itself under {:?}", v, shape);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Symmetry
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn equality_is_symmetric(shape in shape_strategy(), a in value_strategy(), b in value_strategy()) {
        prop_assert_eq!(shape.equals(&a, &b), shape.equals(&b, &a));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Mapping equality is structural
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn mapping_eq_matches_structural_eq(
        a in proptest::collection::btree_map(id_strategy(), value_strategy(), 0..5),
        b in proptest::collection::btree_map(id_strategy(), value_strategy(), 0..5),
    ) {
        let (a, b) = (Value::Map(a), Value::Map(b));
        prop_assert_eq!(mapping_eq(&a, &b), a == b);
    }

    #[test]
    fn mapping_detects_single_changed_entry(
        base in proptest::collection::btree_map(id_strategy(), -50i32..50, 1..5),
    ) {
        let as_value = |m: &BTreeMap<String, i32>| Value::map(m.iter().map(|(k, v)| (k.clone(), *v)));
        let mut changed = base.clone();
        if let Some(first) = changed.values_mut().next() {
            *first += 1;
        }
        prop_assert!(mapping_eq(&as_value(&base), &as_value(&base.clone())));
        prop_assert!(!mapping_eq(&as_value(&base), &as_value(&changed)));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Sequence order matters
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reversed_sequence_equal_only_if_palindrome(
        ids in proptest::collection::vec(id_strategy(), 0..6),
    ) {
        let forward = Value::id_list(ids.clone());
        let mut rev = ids.clone();
        rev.reverse();
        let backward = Value::id_list(rev.clone());
        prop_assert_eq!(sequence_eq(&forward, &backward), ids == rev);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Checkpoint equality
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn checkpoints_eq_matches_structural_eq(a in checkpoints_strategy(), b in checkpoints_strategy()) {
        prop_assert_eq!(checkpoints_eq(&a, &b), a == b);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. normalize
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn normalize_is_idempotent(shape in shape_strategy(), v in value_strategy()) {
        let once = shape.normalize(v.clone());
        prop_assert_eq!(shape.normalize(once.clone()), once.clone());
        if !v.is_absent() {
            prop_assert_eq!(once, v);
        }
    }
}
