#![forbid(unsafe_code)]

//! The eight families of observable data sources.
//!
//! A [`Family`] names one kind of source and carries a stable small-integer
//! offset. Scopes keep one slot per family, addressed through [`PerFamily`].
//!
//! # Invariants
//!
//! 1. `Family::ALL[f.offset()] == f` for every family.
//! 2. Offsets are dense in `0..Family::COUNT` and never change.

use core::fmt;
use core::ops::{Index, IndexMut};

/// One of the fixed kinds of data source the binding layer knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Family {
    /// Tabular keyed store (tables, rows, cells, values).
    Store,
    /// Aggregate metrics derived from a store.
    Metrics,
    /// Slice indexes over store rows.
    Indexes,
    /// Row-to-row relationships between tables.
    Relationships,
    /// Query result tables.
    Queries,
    /// Undo/redo checkpoints.
    Checkpoints,
    /// Persistence handle.
    Persister,
    /// Synchronization handle.
    Synchronizer,
}

impl Family {
    /// Number of families.
    pub const COUNT: usize = 8;

    /// Every family, in offset order.
    pub const ALL: [Family; Family::COUNT] = [
        Family::Store,
        Family::Metrics,
        Family::Indexes,
        Family::Relationships,
        Family::Queries,
        Family::Checkpoints,
        Family::Persister,
        Family::Synchronizer,
    ];

    /// Stable offset used for slot addressing.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self as usize
    }

    /// Inverse of [`offset`](Self::offset).
    #[must_use]
    pub const fn from_offset(offset: usize) -> Option<Self> {
        if offset < Self::COUNT {
            Some(Self::ALL[offset])
        } else {
            None
        }
    }

    /// Human-readable family name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Family::Store => "Store",
            Family::Metrics => "Metrics",
            Family::Indexes => "Indexes",
            Family::Relationships => "Relationships",
            Family::Queries => "Queries",
            Family::Checkpoints => "Checkpoints",
            Family::Persister => "Persister",
            Family::Synchronizer => "Synchronizer",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed table with one slot per [`Family`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerFamily<T>([T; Family::COUNT]);

impl<T> PerFamily<T> {
    /// Build a table by evaluating `init` for each family in offset order.
    pub fn new(mut init: impl FnMut(Family) -> T) -> Self {
        Self(std::array::from_fn(|offset| init(Family::ALL[offset])))
    }

    /// Iterate `(family, slot)` pairs in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (Family, &T)> {
        Family::ALL.into_iter().zip(self.0.iter())
    }

    /// Build a new table by mapping every slot.
    pub fn map<U>(&self, mut f: impl FnMut(Family, &T) -> U) -> PerFamily<U> {
        PerFamily::new(|family| f(family, &self.0[family.offset()]))
    }

    /// Whether `pred` holds for the slots of every family pairwise.
    pub fn all_pairs<U>(&self, other: &PerFamily<U>, mut pred: impl FnMut(&T, &U) -> bool) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| pred(a, b))
    }
}

impl<T: Default> Default for PerFamily<T> {
    fn default() -> Self {
        Self::new(|_| T::default())
    }
}

impl<T> Index<Family> for PerFamily<T> {
    type Output = T;

    fn index(&self, family: Family) -> &T {
        &self.0[family.offset()]
    }
}

impl<T> IndexMut<Family> for PerFamily<T> {
    fn index_mut(&mut self, family: Family) -> &mut T {
        &mut self.0[family.offset()]
    }
}
