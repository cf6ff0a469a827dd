#![forbid(unsafe_code)]

//! Property-test strategies for store edits.
//!
//! Ids are drawn from small pools so that generated edits collide often:
//! most sequences overwrite, delete and re-create the same cells.

use proptest::prelude::*;

use bindery_core::aspect::store::CELL;
use bindery_core::{Listenable, Value, args};

use crate::memory::MemoryStore;

const TABLES: [&str; 2] = ["pets", "toys"];
const ROWS: [&str; 3] = ["fido", "felix", "tweety"];
const CELLS: [&str; 2] = ["color", "legs"];
const KEYS: [&str; 2] = ["open", "staff"];

/// One write against a [`MemoryStore`].
#[derive(Clone, Debug, PartialEq)]
pub enum Edit {
    SetCell {
        table: &'static str,
        row: &'static str,
        cell: &'static str,
        value: Value,
    },
    DelCell {
        table: &'static str,
        row: &'static str,
        cell: &'static str,
    },
    DelRow {
        table: &'static str,
        row: &'static str,
    },
    SetValue {
        key: &'static str,
        value: Value,
    },
}

impl Edit {
    /// Apply the edit through the store's public write surface.
    pub fn apply(&self, store: &MemoryStore) {
        match self {
            Edit::SetCell {
                table,
                row,
                cell,
                value,
            } => {
                store.set_cell(table, row, cell, value.clone());
            }
            Edit::DelCell { table, row, cell } => {
                store.del(CELL, &args![*table, *row, *cell]);
            }
            Edit::DelRow { table, row } => {
                store.del_row(table, row);
            }
            Edit::SetValue { key, value } => {
                store.set_value(key, value.clone());
            }
        }
    }
}

/// A scalar cell or value: bool, small integer or short text.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (0i32..5).prop_map(Value::from),
        prop::sample::select(vec!["brown", "black", "white"]).prop_map(Value::from),
    ]
}

/// One edit drawn from the id pools.
pub fn edit() -> impl Strategy<Value = Edit> {
    let table = prop::sample::select(TABLES.to_vec());
    let row = prop::sample::select(ROWS.to_vec());
    let cell = prop::sample::select(CELLS.to_vec());
    prop_oneof![
        4 => (table.clone(), row.clone(), cell.clone(), scalar())
            .prop_map(|(table, row, cell, value)| Edit::SetCell { table, row, cell, value }),
        2 => (table.clone(), row.clone(), cell)
            .prop_map(|(table, row, cell)| Edit::DelCell { table, row, cell }),
        1 => (table, row).prop_map(|(table, row)| Edit::DelRow { table, row }),
        1 => (prop::sample::select(KEYS.to_vec()), scalar())
            .prop_map(|(key, value)| Edit::SetValue { key, value }),
    ]
}

/// A sequence of up to `max` edits.
pub fn edits(max: usize) -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(edit(), 0..=max)
}
