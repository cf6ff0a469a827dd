#![forbid(unsafe_code)]

//! Aspects, reads, commands and the static dispatch table.
//!
//! An [`Aspect`] is one named facet of a source family (a table's cell, a
//! checkpoint list, a persister status). Sources are reached through typed
//! [`Read`] and [`Command`] values rather than by composing method names;
//! the names are still rendered for logs and diagnostics.
//!
//! The [`DispatchTable`] records, per aspect, its [`Shape`], how many
//! discriminating arguments it takes, whether a presence (`has`) variant
//! exists and whether it can be set or deleted. It is built once on first
//! use and is read-only afterwards.
//!
//! # Naming
//!
//! | Operation | Rendered name |
//! |---|---|
//! | getter | `get{Name}` or `has{Name}` |
//! | listener registration | `add{Name}Listener` or `addHas{Name}Listener` |
//! | setter | `set{Name}` |
//! | deleter | `del{Name}` |
//!
//! # Invariants
//!
//! 1. Each `(family, name)` pair appears at most once in the table.
//! 2. Presence reads are only declared for aspects with `presence == true`.

use core::fmt;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{BindError, Result};
use crate::family::{Family, PerFamily};
use crate::shape::Shape;

/// A named facet of one source family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Aspect {
    family: Family,
    name: &'static str,
}

impl Aspect {
    /// Create an aspect.
    #[must_use]
    pub const fn new(family: Family, name: &'static str) -> Self {
        Self { family, name }
    }

    /// Owning family.
    #[inline]
    #[must_use]
    pub const fn family(self) -> Family {
        self.family
    }

    /// Base name, e.g. `"Cell"`.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Catalog entry for this aspect, if it is a known one.
    #[must_use]
    pub fn spec(self) -> Option<&'static AspectSpec> {
        DispatchTable::global().get(self)
    }

    /// Rendered setter name, e.g. `setCell`.
    #[must_use]
    pub fn setter_name(self) -> String {
        format!("set{}", self.name)
    }

    /// Rendered deleter name, e.g. `delCell`.
    #[must_use]
    pub fn deleter_name(self) -> String {
        format!("del{}", self.name)
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family, self.name)
    }
}

/// A read against a source: the value of an aspect, or whether it exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Read {
    /// Current value.
    Get(Aspect),
    /// Existence check.
    Has(Aspect),
}

impl Read {
    /// The read a binding of `shape` performs on `aspect`.
    #[must_use]
    pub const fn for_shape(aspect: Aspect, shape: Shape) -> Self {
        if shape.is_presence() {
            Read::Has(aspect)
        } else {
            Read::Get(aspect)
        }
    }

    /// The aspect being read.
    #[inline]
    #[must_use]
    pub const fn aspect(self) -> Aspect {
        match self {
            Read::Get(aspect) | Read::Has(aspect) => aspect,
        }
    }

    /// Whether this is an existence check.
    #[inline]
    #[must_use]
    pub const fn is_presence(self) -> bool {
        matches!(self, Read::Has(_))
    }

    /// Rendered getter name, e.g. `getCell` or `hasCell`.
    #[must_use]
    pub fn method_name(self) -> String {
        match self {
            Read::Get(aspect) => format!("get{}", aspect.name),
            Read::Has(aspect) => format!("has{}", aspect.name),
        }
    }

    /// Rendered listener registration name, e.g. `addHasCellListener`.
    #[must_use]
    pub fn listener_name(self) -> String {
        match self {
            Read::Get(aspect) => format!("add{}Listener", aspect.name),
            Read::Has(aspect) => format!("addHas{}Listener", aspect.name),
        }
    }
}

impl fmt::Display for Read {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.aspect().family, self.method_name())
    }
}

/// Imperative operations that are neither a set nor a delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Record a checkpoint, optionally labelled.
    AddCheckpoint,
    /// Undo to the previous checkpoint.
    GoBackward,
    /// Redo to the next checkpoint.
    GoForward,
    /// Jump to a checkpoint id.
    GoTo,
    /// Open a store transaction.
    StartTransaction,
    /// Close the open store transaction.
    FinishTransaction,
}

impl Command {
    /// Family the command applies to.
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Command::AddCheckpoint | Command::GoBackward | Command::GoForward | Command::GoTo => {
                Family::Checkpoints
            }
            Command::StartTransaction | Command::FinishTransaction => Family::Store,
        }
    }

    /// Rendered method name.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Command::AddCheckpoint => "addCheckpoint",
            Command::GoBackward => "goBackward",
            Command::GoForward => "goForward",
            Command::GoTo => "goTo",
            Command::StartTransaction => "startTransaction",
            Command::FinishTransaction => "finishTransaction",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family(), self.method_name())
    }
}

/// Catalog entry describing one aspect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AspectSpec {
    pub aspect: Aspect,
    pub shape: Shape,
    /// Maximum number of discriminating arguments.
    pub arity: usize,
    /// A `has` variant exists.
    pub presence: bool,
    /// Values can be read (false for write-only partial setters).
    pub readable: bool,
    pub settable: bool,
    pub deletable: bool,
}

impl AspectSpec {
    const fn read(aspect: Aspect, shape: Shape, arity: usize) -> Self {
        Self {
            aspect,
            shape,
            arity,
            presence: false,
            readable: true,
            settable: false,
            deletable: false,
        }
    }

    const fn has(mut self) -> Self {
        self.presence = true;
        self
    }

    const fn set(mut self) -> Self {
        self.settable = true;
        self
    }

    const fn set_del(mut self) -> Self {
        self.settable = true;
        self.deletable = true;
        self
    }

    const fn write_only(mut self) -> Self {
        self.readable = false;
        self.settable = true;
        self
    }

    /// Whether `shape` is a valid way to bind this aspect.
    #[must_use]
    pub fn accepts(&self, shape: Shape) -> bool {
        self.readable && (shape == self.shape || (shape.is_presence() && self.presence))
    }
}

/// Store aspects.
pub mod store {
    use super::Aspect;
    use crate::family::Family::Store;

    pub const TABLES: Aspect = Aspect::new(Store, "Tables");
    pub const TABLE_IDS: Aspect = Aspect::new(Store, "TableIds");
    pub const TABLE: Aspect = Aspect::new(Store, "Table");
    pub const TABLE_CELL_IDS: Aspect = Aspect::new(Store, "TableCellIds");
    pub const TABLE_CELL: Aspect = Aspect::new(Store, "TableCell");
    pub const ROW_COUNT: Aspect = Aspect::new(Store, "RowCount");
    pub const ROW_IDS: Aspect = Aspect::new(Store, "RowIds");
    pub const SORTED_ROW_IDS: Aspect = Aspect::new(Store, "SortedRowIds");
    pub const ROW: Aspect = Aspect::new(Store, "Row");
    pub const PARTIAL_ROW: Aspect = Aspect::new(Store, "PartialRow");
    pub const CELL_IDS: Aspect = Aspect::new(Store, "CellIds");
    pub const CELL: Aspect = Aspect::new(Store, "Cell");
    pub const VALUES: Aspect = Aspect::new(Store, "Values");
    pub const PARTIAL_VALUES: Aspect = Aspect::new(Store, "PartialValues");
    pub const VALUE_IDS: Aspect = Aspect::new(Store, "ValueIds");
    pub const VALUE: Aspect = Aspect::new(Store, "Value");
}

/// Metrics aspects.
pub mod metrics {
    use super::Aspect;
    use crate::family::Family::Metrics;

    pub const METRIC_IDS: Aspect = Aspect::new(Metrics, "MetricIds");
    pub const METRIC: Aspect = Aspect::new(Metrics, "Metric");
}

/// Indexes aspects.
pub mod indexes {
    use super::Aspect;
    use crate::family::Family::Indexes;

    pub const INDEX_IDS: Aspect = Aspect::new(Indexes, "IndexIds");
    pub const SLICE_IDS: Aspect = Aspect::new(Indexes, "SliceIds");
    pub const SLICE_ROW_IDS: Aspect = Aspect::new(Indexes, "SliceRowIds");
}

/// Relationships aspects.
pub mod relationships {
    use super::Aspect;
    use crate::family::Family::Relationships;

    pub const RELATIONSHIP_IDS: Aspect = Aspect::new(Relationships, "RelationshipIds");
    pub const REMOTE_ROW_ID: Aspect = Aspect::new(Relationships, "RemoteRowId");
    pub const LOCAL_ROW_IDS: Aspect = Aspect::new(Relationships, "LocalRowIds");
    pub const LINKED_ROW_IDS: Aspect = Aspect::new(Relationships, "LinkedRowIds");
}

/// Queries aspects.
pub mod queries {
    use super::Aspect;
    use crate::family::Family::Queries;

    pub const QUERY_IDS: Aspect = Aspect::new(Queries, "QueryIds");
    pub const RESULT_TABLE: Aspect = Aspect::new(Queries, "ResultTable");
    pub const RESULT_TABLE_CELL_IDS: Aspect = Aspect::new(Queries, "ResultTableCellIds");
    pub const RESULT_ROW_COUNT: Aspect = Aspect::new(Queries, "ResultRowCount");
    pub const RESULT_ROW_IDS: Aspect = Aspect::new(Queries, "ResultRowIds");
    pub const RESULT_SORTED_ROW_IDS: Aspect = Aspect::new(Queries, "ResultSortedRowIds");
    pub const RESULT_ROW: Aspect = Aspect::new(Queries, "ResultRow");
    pub const RESULT_CELL_IDS: Aspect = Aspect::new(Queries, "ResultCellIds");
    pub const RESULT_CELL: Aspect = Aspect::new(Queries, "ResultCell");
}

/// Checkpoints aspects.
pub mod checkpoints {
    use super::Aspect;
    use crate::family::Family::Checkpoints;

    pub const CHECKPOINT_IDS: Aspect = Aspect::new(Checkpoints, "CheckpointIds");
    pub const CHECKPOINT: Aspect = Aspect::new(Checkpoints, "Checkpoint");
}

/// Persister aspects.
pub mod persister {
    use super::Aspect;
    use crate::family::Family::Persister;

    pub const STATUS: Aspect = Aspect::new(Persister, "Status");
}

/// Synchronizer aspects.
pub mod synchronizer {
    use super::Aspect;
    use crate::family::Family::Synchronizer;

    pub const STATUS: Aspect = Aspect::new(Synchronizer, "Status");
}

const SPECS: &[AspectSpec] = &[
    // store
    AspectSpec::read(store::TABLES, Shape::Mapping, 0).has().set_del(),
    AspectSpec::read(store::TABLE_IDS, Shape::Sequence, 0),
    AspectSpec::read(store::TABLE, Shape::Mapping, 1).has().set_del(),
    AspectSpec::read(store::TABLE_CELL_IDS, Shape::Sequence, 1),
    AspectSpec::read(store::TABLE_CELL, Shape::Presence, 2).has(),
    AspectSpec::read(store::ROW_COUNT, Shape::Count, 1),
    AspectSpec::read(store::ROW_IDS, Shape::Sequence, 1),
    AspectSpec::read(store::SORTED_ROW_IDS, Shape::Sequence, 5),
    AspectSpec::read(store::ROW, Shape::Mapping, 2).has().set_del(),
    AspectSpec::read(store::PARTIAL_ROW, Shape::Mapping, 2).write_only(),
    AspectSpec::read(store::CELL_IDS, Shape::Sequence, 2),
    AspectSpec::read(store::CELL, Shape::Scalar, 3).has().set_del(),
    AspectSpec::read(store::VALUES, Shape::Mapping, 0).has().set_del(),
    AspectSpec::read(store::PARTIAL_VALUES, Shape::Mapping, 0).write_only(),
    AspectSpec::read(store::VALUE_IDS, Shape::Sequence, 0),
    AspectSpec::read(store::VALUE, Shape::Scalar, 1).has().set_del(),
    // metrics
    AspectSpec::read(metrics::METRIC_IDS, Shape::Sequence, 0),
    AspectSpec::read(metrics::METRIC, Shape::Scalar, 1),
    // indexes
    AspectSpec::read(indexes::INDEX_IDS, Shape::Sequence, 0),
    AspectSpec::read(indexes::SLICE_IDS, Shape::Sequence, 1),
    AspectSpec::read(indexes::SLICE_ROW_IDS, Shape::Sequence, 2),
    // relationships
    AspectSpec::read(relationships::RELATIONSHIP_IDS, Shape::Sequence, 0),
    AspectSpec::read(relationships::REMOTE_ROW_ID, Shape::Scalar, 2),
    AspectSpec::read(relationships::LOCAL_ROW_IDS, Shape::Sequence, 2),
    AspectSpec::read(relationships::LINKED_ROW_IDS, Shape::Sequence, 2),
    // queries
    AspectSpec::read(queries::QUERY_IDS, Shape::Sequence, 0),
    AspectSpec::read(queries::RESULT_TABLE, Shape::Mapping, 1),
    AspectSpec::read(queries::RESULT_TABLE_CELL_IDS, Shape::Sequence, 1),
    AspectSpec::read(queries::RESULT_ROW_COUNT, Shape::Count, 1),
    AspectSpec::read(queries::RESULT_ROW_IDS, Shape::Sequence, 1),
    AspectSpec::read(queries::RESULT_SORTED_ROW_IDS, Shape::Sequence, 5),
    AspectSpec::read(queries::RESULT_ROW, Shape::Mapping, 2),
    AspectSpec::read(queries::RESULT_CELL_IDS, Shape::Sequence, 2),
    AspectSpec::read(queries::RESULT_CELL, Shape::Scalar, 3),
    // checkpoints
    AspectSpec::read(checkpoints::CHECKPOINT_IDS, Shape::Checkpoints, 0),
    AspectSpec::read(checkpoints::CHECKPOINT, Shape::Scalar, 1).set(),
    // handles
    AspectSpec::read(persister::STATUS, Shape::Scalar, 0),
    AspectSpec::read(synchronizer::STATUS, Shape::Scalar, 0),
];

static GLOBAL: LazyLock<DispatchTable> = LazyLock::new(|| DispatchTable::from_specs(SPECS));

/// Lookup table from aspect to its catalog entry.
#[derive(Debug)]
pub struct DispatchTable {
    by_aspect: HashMap<Aspect, AspectSpec>,
    by_family: PerFamily<Vec<AspectSpec>>,
}

impl DispatchTable {
    /// The built-in catalog.
    #[must_use]
    pub fn global() -> &'static DispatchTable {
        &GLOBAL
    }

    /// Build a table from catalog entries. Later duplicates replace earlier
    /// ones.
    #[must_use]
    pub fn from_specs(specs: &[AspectSpec]) -> Self {
        let mut by_aspect = HashMap::with_capacity(specs.len());
        let mut by_family: PerFamily<Vec<AspectSpec>> = PerFamily::default();
        for spec in specs {
            if by_aspect.insert(spec.aspect, *spec).is_some() {
                tracing::warn!(aspect = %spec.aspect, "duplicate aspect in dispatch table");
                by_family[spec.aspect.family()].retain(|s: &AspectSpec| s.aspect != spec.aspect);
            }
            by_family[spec.aspect.family()].push(*spec);
        }
        tracing::trace!(aspects = by_aspect.len(), "dispatch table built");
        Self {
            by_aspect,
            by_family,
        }
    }

    /// Entry for `aspect`.
    #[must_use]
    pub fn get(&self, aspect: Aspect) -> Option<&AspectSpec> {
        self.by_aspect.get(&aspect)
    }

    /// Entry for the aspect named `name` in `family`.
    pub fn lookup(&self, family: Family, name: &str) -> Result<&AspectSpec> {
        self.by_family[family]
            .iter()
            .find(|spec| spec.aspect.name() == name)
            .ok_or_else(|| BindError::UnknownAspect {
                family,
                name: name.to_owned(),
            })
    }

    /// Check that `got` arguments fit the declared arity of `aspect`.
    pub fn check_arity(&self, aspect: Aspect, got: usize) -> Result<()> {
        match self.get(aspect) {
            Some(spec) if got > spec.arity => Err(BindError::Arity {
                aspect: aspect.to_string(),
                max: spec.arity,
                got,
            }),
            Some(_) => Ok(()),
            None => Err(BindError::UnknownAspect {
                family: aspect.family(),
                name: aspect.name().to_owned(),
            }),
        }
    }

    /// Check that `aspect` can be set (or deleted, when `delete`).
    pub fn check_writable(&self, aspect: Aspect, delete: bool) -> Result<()> {
        let writable = self
            .get(aspect)
            .is_some_and(|spec| if delete { spec.deletable } else { spec.settable });
        if writable {
            Ok(())
        } else {
            Err(BindError::NotWritable {
                aspect: aspect.to_string(),
            })
        }
    }

    /// Catalog entries of one family, in declaration order.
    #[must_use]
    pub fn aspects(&self, family: Family) -> &[AspectSpec] {
        &self.by_family[family]
    }

    /// Number of aspects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_aspect.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_aspect.is_empty()
    }
}
