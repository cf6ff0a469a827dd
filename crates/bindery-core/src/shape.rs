#![forbid(unsafe_code)]

//! Shape categories: per-aspect default values and equality.
//!
//! Every readable aspect has a [`Shape`]. The shape decides what a binding
//! returns when no source is resolved ([`Shape::default_value`]) and when a
//! freshly read value counts as "unchanged" ([`Shape::equals`]), which is
//! what keeps snapshot references stable across renders.
//!
//! | Shape | Default | Equality |
//! |---|---|---|
//! | `Mapping` | empty map | recursive deep equality |
//! | `Sequence` | empty list | same length, equal element at every index |
//! | `Checkpoints` | `([], None, [])` | current ids equal, both lists sequence-equal |
//! | `Scalar` | `Absent` | value equality |
//! | `Presence` | `false` | value equality |
//! | `Count` | `0` | value equality |
//!
//! # Invariants
//!
//! 1. `equals` is reflexive for every value except NaN scalars.
//! 2. `normalize(Absent) == default_value()` for every shape.
//! 3. Sequence equality is order-sensitive.

use std::collections::BTreeMap;

use crate::value::{CheckpointIds, Id, Value};

/// The category an aspect's value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// Key to value mapping, possibly nested.
    Mapping,
    /// Ordered sequence.
    Sequence,
    /// Backward ids, current id, forward ids.
    Checkpoints,
    /// A single value or absent.
    Scalar,
    /// Boolean existence check.
    Presence,
    /// Non-negative count.
    Count,
}

impl Shape {
    /// Every shape.
    pub const ALL: [Shape; 6] = [
        Shape::Mapping,
        Shape::Sequence,
        Shape::Checkpoints,
        Shape::Scalar,
        Shape::Presence,
        Shape::Count,
    ];

    /// Value used when no source is resolved, or the source reports absence.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            Shape::Mapping => Value::Map(BTreeMap::new()),
            Shape::Sequence => Value::List(Vec::new()),
            Shape::Checkpoints => Value::Checkpoints(CheckpointIds::default()),
            Shape::Scalar => Value::Absent,
            Shape::Presence => Value::Bool(false),
            Shape::Count => Value::Number(0.0),
        }
    }

    /// Whether `a` and `b` are equal under this shape's rule.
    #[must_use]
    pub fn equals(self, a: &Value, b: &Value) -> bool {
        match self {
            Shape::Mapping => mapping_eq(a, b),
            Shape::Sequence => sequence_eq(a, b),
            Shape::Checkpoints => checkpoints_eq(a, b),
            Shape::Scalar | Shape::Presence | Shape::Count => scalar_eq(a, b),
        }
    }

    /// Whether reads of this shape go through the `has` variant of an aspect.
    #[inline]
    #[must_use]
    pub const fn is_presence(self) -> bool {
        matches!(self, Shape::Presence)
    }

    /// Replace the absence marker with this shape's default.
    #[must_use]
    pub fn normalize(self, value: Value) -> Value {
        if value.is_absent() {
            self.default_value()
        } else {
            value
        }
    }
}

/// Recursive deep equality. Nested maps recurse; anything else compares by
/// value.
#[must_use]
pub fn mapping_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Map(x), Value::Map(y)) => maps_eq(x, y),
        _ => a == b,
    }
}

fn maps_eq(x: &BTreeMap<Id, Value>, y: &BTreeMap<Id, Value>) -> bool {
    x.len() == y.len()
        && x
            .iter()
            .all(|(key, xv)| y.get(key).is_some_and(|yv| mapping_eq(xv, yv)))
}

/// Same length and equal element at every index.
#[must_use]
pub fn sequence_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(x), Value::List(y)) => id_slices_eq(x, y),
        _ => a == b,
    }
}

fn id_slices_eq<T: PartialEq>(x: &[T], y: &[T]) -> bool {
    x.len() == y.len() && x.iter().zip(y).all(|(a, b)| a == b)
}

/// Current ids equal and both id lists sequence-equal.
#[must_use]
pub fn checkpoints_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Checkpoints(x), Value::Checkpoints(y)) => {
            x.current == y.current
                && id_slices_eq(&x.backward, &y.backward)
                && id_slices_eq(&x.forward, &y.forward)
        }
        _ => a == b,
    }
}

/// Plain value equality.
#[inline]
#[must_use]
pub fn scalar_eq(a: &Value, b: &Value) -> bool {
    a == b
}
