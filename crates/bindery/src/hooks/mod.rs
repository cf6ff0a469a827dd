#![forbid(unsafe_code)]

//! Per-family hooks.
//!
//! Each module wraps the generic adapter, write builder and lifecycle hooks
//! for one [`Family`](bindery_core::Family):
//!
//! | Module | Reads | Writes | Creation |
//! |---|---|---|---|
//! | [`store`] | tables, rows, cells, values, counts, sorted ids | set/del, partial set, transactions | `use_create_store` |
//! | [`metrics`] | metric ids, metric | - | `use_create_metrics` |
//! | [`indexes`] | index, slice and slice row ids | - | `use_create_indexes` |
//! | [`relationships`] | relationship ids, remote/local/linked rows | - | `use_create_relationships` |
//! | [`queries`] | result tables, rows, cells, counts | - | `use_create_queries` |
//! | [`checkpoints`] | checkpoint ids, labels, undo information | add, go backward/forward/to | `use_create_checkpoints` |
//! | [`persister`] | status | - | `use_create_persister` (two-phase) |
//! | [`synchronizer`] | status | - | `use_create_synchronizer` (two-phase) |
//!
//! Every read hook takes the [`Target`] last. Reads return `Rc<Value>`,
//! presence checks `bool` and counts `usize`.

use std::rc::Rc;

use bindery_core::{Arg, Aspect, Shape, Value};
use bindery_runtime::Cx;

use crate::adapter::{use_aspect, use_listenable, use_presence};
use crate::resolve::Target;

pub mod checkpoints;
pub mod indexes;
pub mod metrics;
pub mod persister;
pub mod queries;
pub mod relationships;
pub mod store;
pub mod synchronizer;

fn read(cx: &mut Cx<'_>, target: &Target, aspect: Aspect, args: &[Arg]) -> Rc<Value> {
    use_aspect(cx, target, aspect, args)
}

fn has(cx: &mut Cx<'_>, target: &Target, aspect: Aspect, args: &[Arg]) -> bool {
    use_presence(cx, target, aspect, args)
}

fn count(cx: &mut Cx<'_>, target: &Target, aspect: Aspect, args: &[Arg]) -> usize {
    let value = use_listenable(cx, target, aspect, Shape::Count, args);
    value
        .as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map_or(0, |n| n as usize)
}

/// Ordering and paging of a sorted id read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SortBy {
    /// Cell to sort by; the row id when `None`.
    pub cell: Option<String>,
    pub descending: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl SortBy {
    /// Sort by `cell`, ascending, unpaged.
    #[must_use]
    pub fn cell(cell: impl Into<String>) -> Self {
        Self {
            cell: Some(cell.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    #[must_use]
    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    fn args(&self, first: &str) -> Vec<Arg> {
        vec![
            Arg::from(first),
            Arg::from(self.cell.clone()),
            Arg::Flag(self.descending),
            Arg::Index(self.offset),
            Arg::from(self.limit),
        ]
    }
}
