#![forbid(unsafe_code)]

//! Store hooks: tabular data and keyed values.

use std::rc::Rc;

use bindery_core::aspect::store::{
    CELL, CELL_IDS, PARTIAL_ROW, PARTIAL_VALUES, ROW, ROW_COUNT, ROW_IDS, SORTED_ROW_IDS, TABLE,
    TABLE_CELL, TABLE_CELL_IDS, TABLE_IDS, TABLES, VALUE, VALUE_IDS, VALUES,
};
use bindery_core::{Arg, Command, Family, Id, Read, SourceRef, Value, args};
use bindery_runtime::Cx;

use super::{SortBy, count, has, read};
use crate::lifecycle;
use crate::listener::use_listener;
use crate::mutate::{Mutator, WriteSpec, use_command_callback, use_del_callback, use_write_callback};
use crate::provider::use_source_ids;
use crate::resolve::{Target, use_source};

/// The store `id` names in the current scope, or the default store.
pub fn use_store(cx: &mut Cx<'_>, id: Option<&str>) -> Option<SourceRef> {
    use_source(cx, Family::Store, &Target::from(id))
}

/// Ids of the named stores in the current scope.
pub fn use_store_ids(cx: &mut Cx<'_>) -> Vec<Id> {
    use_source_ids(cx, Family::Store)
}

/// Create a store once per `deps`.
pub fn use_create_store(
    cx: &mut Cx<'_>,
    deps: Vec<Value>,
    create: impl FnOnce() -> SourceRef,
) -> SourceRef {
    lifecycle::use_create_store(cx, deps, create)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

pub fn use_tables(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, TABLES, &[])
}

pub fn use_has_tables(cx: &mut Cx<'_>, target: &Target) -> bool {
    has(cx, target, TABLES, &[])
}

pub fn use_table_ids(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, TABLE_IDS, &[])
}

pub fn use_table(cx: &mut Cx<'_>, table: &str, target: &Target) -> Rc<Value> {
    read(cx, target, TABLE, &args![table])
}

pub fn use_has_table(cx: &mut Cx<'_>, table: &str, target: &Target) -> bool {
    has(cx, target, TABLE, &args![table])
}

/// Ids of every cell used anywhere in `table`.
pub fn use_table_cell_ids(cx: &mut Cx<'_>, table: &str, target: &Target) -> Rc<Value> {
    read(cx, target, TABLE_CELL_IDS, &args![table])
}

pub fn use_has_table_cell(cx: &mut Cx<'_>, table: &str, cell: &str, target: &Target) -> bool {
    has(cx, target, TABLE_CELL, &args![table, cell])
}

pub fn use_row_count(cx: &mut Cx<'_>, table: &str, target: &Target) -> usize {
    count(cx, target, ROW_COUNT, &args![table])
}

pub fn use_row_ids(cx: &mut Cx<'_>, table: &str, target: &Target) -> Rc<Value> {
    read(cx, target, ROW_IDS, &args![table])
}

pub fn use_sorted_row_ids(
    cx: &mut Cx<'_>,
    table: &str,
    sort: &SortBy,
    target: &Target,
) -> Rc<Value> {
    read(cx, target, SORTED_ROW_IDS, &sort.args(table))
}

pub fn use_row(cx: &mut Cx<'_>, table: &str, row: &str, target: &Target) -> Rc<Value> {
    read(cx, target, ROW, &args![table, row])
}

pub fn use_has_row(cx: &mut Cx<'_>, table: &str, row: &str, target: &Target) -> bool {
    has(cx, target, ROW, &args![table, row])
}

pub fn use_cell_ids(cx: &mut Cx<'_>, table: &str, row: &str, target: &Target) -> Rc<Value> {
    read(cx, target, CELL_IDS, &args![table, row])
}

pub fn use_cell(cx: &mut Cx<'_>, table: &str, row: &str, cell: &str, target: &Target) -> Rc<Value> {
    read(cx, target, CELL, &args![table, row, cell])
}

pub fn use_has_cell(
    cx: &mut Cx<'_>,
    table: &str,
    row: &str,
    cell: &str,
    target: &Target,
) -> bool {
    has(cx, target, CELL, &args![table, row, cell])
}

pub fn use_values(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, VALUES, &[])
}

pub fn use_has_values(cx: &mut Cx<'_>, target: &Target) -> bool {
    has(cx, target, VALUES, &[])
}

pub fn use_value_ids(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, VALUE_IDS, &[])
}

pub fn use_value(cx: &mut Cx<'_>, value: &str, target: &Target) -> Rc<Value> {
    read(cx, target, VALUE, &args![value])
}

pub fn use_has_value(cx: &mut Cx<'_>, value: &str, target: &Target) -> bool {
    has(cx, target, VALUE, &args![value])
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Callback replacing every table with what `f` returns.
pub fn use_set_tables_callback<P: 'static>(
    cx: &mut Cx<'_>,
    f: impl Fn(&P, &SourceRef) -> Option<Value> + 'static,
    deps: Vec<Value>,
    target: &Target,
) -> Rc<Mutator<P>> {
    use_write_callback(cx, WriteSpec::set(TABLES, f, deps).target(target.clone()))
}

pub fn use_set_table_callback<P: 'static>(
    cx: &mut Cx<'_>,
    table: &str,
    f: impl Fn(&P, &SourceRef) -> Option<Value> + 'static,
    deps: Vec<Value>,
    target: &Target,
) -> Rc<Mutator<P>> {
    use_write_callback(
        cx,
        WriteSpec::set(TABLE, f, deps).target(target.clone()).arg(table),
    )
}

pub fn use_set_row_callback<P: 'static>(
    cx: &mut Cx<'_>,
    table: &str,
    row: &str,
    f: impl Fn(&P, &SourceRef) -> Option<Value> + 'static,
    deps: Vec<Value>,
    target: &Target,
) -> Rc<Mutator<P>> {
    use_write_callback(
        cx,
        WriteSpec::set(ROW, f, deps)
            .target(target.clone())
            .args(args![table, row]),
    )
}

/// Callback merging the cells `f` returns into one row.
pub fn use_set_partial_row_callback<P: 'static>(
    cx: &mut Cx<'_>,
    table: &str,
    row: &str,
    f: impl Fn(&P, &SourceRef) -> Option<Value> + 'static,
    deps: Vec<Value>,
    target: &Target,
) -> Rc<Mutator<P>> {
    use_write_callback(
        cx,
        WriteSpec::set(PARTIAL_ROW, f, deps)
            .target(target.clone())
            .args(args![table, row]),
    )
}

pub fn use_set_cell_callback<P: 'static>(
    cx: &mut Cx<'_>,
    table: &str,
    row: &str,
    cell: &str,
    f: impl Fn(&P, &SourceRef) -> Option<Value> + 'static,
    deps: Vec<Value>,
    target: &Target,
) -> Rc<Mutator<P>> {
    use_write_callback(
        cx,
        WriteSpec::set(CELL, f, deps)
            .target(target.clone())
            .args(args![table, row, cell]),
    )
}

pub fn use_set_values_callback<P: 'static>(
    cx: &mut Cx<'_>,
    f: impl Fn(&P, &SourceRef) -> Option<Value> + 'static,
    deps: Vec<Value>,
    target: &Target,
) -> Rc<Mutator<P>> {
    use_write_callback(cx, WriteSpec::set(VALUES, f, deps).target(target.clone()))
}

pub fn use_set_partial_values_callback<P: 'static>(
    cx: &mut Cx<'_>,
    f: impl Fn(&P, &SourceRef) -> Option<Value> + 'static,
    deps: Vec<Value>,
    target: &Target,
) -> Rc<Mutator<P>> {
    use_write_callback(
        cx,
        WriteSpec::set(PARTIAL_VALUES, f, deps).target(target.clone()),
    )
}

pub fn use_set_value_callback<P: 'static>(
    cx: &mut Cx<'_>,
    value: &str,
    f: impl Fn(&P, &SourceRef) -> Option<Value> + 'static,
    deps: Vec<Value>,
    target: &Target,
) -> Rc<Mutator<P>> {
    use_write_callback(
        cx,
        WriteSpec::set(VALUE, f, deps).target(target.clone()).arg(value),
    )
}

pub fn use_del_tables_callback(cx: &mut Cx<'_>, target: &Target) -> Rc<Mutator<()>> {
    use_del_callback(cx, target, TABLES, &[])
}

pub fn use_del_table_callback(cx: &mut Cx<'_>, table: &str, target: &Target) -> Rc<Mutator<()>> {
    use_del_callback(cx, target, TABLE, &args![table])
}

pub fn use_del_row_callback(
    cx: &mut Cx<'_>,
    table: &str,
    row: &str,
    target: &Target,
) -> Rc<Mutator<()>> {
    use_del_callback(cx, target, ROW, &args![table, row])
}

/// Callback deleting one cell. With `force`, the cell goes even if the
/// store's schema would supply a default.
pub fn use_del_cell_callback(
    cx: &mut Cx<'_>,
    table: &str,
    row: &str,
    cell: &str,
    force: bool,
    target: &Target,
) -> Rc<Mutator<()>> {
    use_del_callback(cx, target, CELL, &args![table, row, cell, force])
}

pub fn use_del_values_callback(cx: &mut Cx<'_>, target: &Target) -> Rc<Mutator<()>> {
    use_del_callback(cx, target, VALUES, &[])
}

pub fn use_del_value_callback(cx: &mut Cx<'_>, value: &str, target: &Target) -> Rc<Mutator<()>> {
    use_del_callback(cx, target, VALUE, &args![value])
}

pub fn use_start_transaction_callback(cx: &mut Cx<'_>, target: &Target) -> Rc<Mutator<()>> {
    use_command_callback(cx, target, Command::StartTransaction, &[])
}

pub fn use_finish_transaction_callback(cx: &mut Cx<'_>, target: &Target) -> Rc<Mutator<()>> {
    use_command_callback(cx, target, Command::FinishTransaction, &[])
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Listen to cell changes. `None` ids match any table, row or cell.
pub fn use_cell_listener(
    cx: &mut Cx<'_>,
    table: Option<&str>,
    row: Option<&str>,
    cell: Option<&str>,
    listener: impl Fn(&[Arg]) + 'static,
    deps: Vec<Value>,
    target: &Target,
) {
    use_listener(cx, target, Read::Get(CELL), &args![table, row, cell], listener, deps);
}

/// Listen to row changes. `None` ids match any table or row.
pub fn use_row_listener(
    cx: &mut Cx<'_>,
    table: Option<&str>,
    row: Option<&str>,
    listener: impl Fn(&[Arg]) + 'static,
    deps: Vec<Value>,
    target: &Target,
) {
    use_listener(cx, target, Read::Get(ROW), &args![table, row], listener, deps);
}
