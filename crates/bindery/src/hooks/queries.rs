#![forbid(unsafe_code)]

//! Queries hooks: read-only views of query result tables.

use std::rc::Rc;

use bindery_core::aspect::queries::{
    QUERY_IDS, RESULT_CELL, RESULT_CELL_IDS, RESULT_ROW, RESULT_ROW_COUNT, RESULT_ROW_IDS,
    RESULT_SORTED_ROW_IDS, RESULT_TABLE, RESULT_TABLE_CELL_IDS,
};
use bindery_core::{Family, SourceRef, Value, args};
use bindery_runtime::Cx;

use super::{SortBy, count, read};
use crate::lifecycle::use_create;
use crate::resolve::{Target, use_source};

pub fn use_queries(cx: &mut Cx<'_>, id: Option<&str>) -> Option<SourceRef> {
    use_source(cx, Family::Queries, &Target::from(id))
}

pub fn use_create_queries(
    cx: &mut Cx<'_>,
    store: Option<&SourceRef>,
    deps: Vec<Value>,
    create: impl FnOnce(&SourceRef) -> SourceRef + 'static,
) -> Option<SourceRef> {
    use_create(cx, Family::Queries, store, deps, create)
}

pub fn use_query_ids(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, QUERY_IDS, &[])
}

pub fn use_result_table(cx: &mut Cx<'_>, query: &str, target: &Target) -> Rc<Value> {
    read(cx, target, RESULT_TABLE, &args![query])
}

pub fn use_result_table_cell_ids(cx: &mut Cx<'_>, query: &str, target: &Target) -> Rc<Value> {
    read(cx, target, RESULT_TABLE_CELL_IDS, &args![query])
}

pub fn use_result_row_count(cx: &mut Cx<'_>, query: &str, target: &Target) -> usize {
    count(cx, target, RESULT_ROW_COUNT, &args![query])
}

pub fn use_result_row_ids(cx: &mut Cx<'_>, query: &str, target: &Target) -> Rc<Value> {
    read(cx, target, RESULT_ROW_IDS, &args![query])
}

pub fn use_result_sorted_row_ids(
    cx: &mut Cx<'_>,
    query: &str,
    sort: &SortBy,
    target: &Target,
) -> Rc<Value> {
    read(cx, target, RESULT_SORTED_ROW_IDS, &sort.args(query))
}

pub fn use_result_row(cx: &mut Cx<'_>, query: &str, row: &str, target: &Target) -> Rc<Value> {
    read(cx, target, RESULT_ROW, &args![query, row])
}

pub fn use_result_cell_ids(cx: &mut Cx<'_>, query: &str, row: &str, target: &Target) -> Rc<Value> {
    read(cx, target, RESULT_CELL_IDS, &args![query, row])
}

pub fn use_result_cell(
    cx: &mut Cx<'_>,
    query: &str,
    row: &str,
    cell: &str,
    target: &Target,
) -> Rc<Value> {
    read(cx, target, RESULT_CELL, &args![query, row, cell])
}
