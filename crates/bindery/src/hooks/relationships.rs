#![forbid(unsafe_code)]

//! Relationships hooks.

use std::rc::Rc;

use bindery_core::aspect::relationships::{
    LINKED_ROW_IDS, LOCAL_ROW_IDS, RELATIONSHIP_IDS, REMOTE_ROW_ID,
};
use bindery_core::{Family, SourceRef, Value, args};
use bindery_runtime::Cx;

use super::read;
use crate::lifecycle::use_create;
use crate::resolve::{Target, use_source};

pub fn use_relationships(cx: &mut Cx<'_>, id: Option<&str>) -> Option<SourceRef> {
    use_source(cx, Family::Relationships, &Target::from(id))
}

pub fn use_create_relationships(
    cx: &mut Cx<'_>,
    store: Option<&SourceRef>,
    deps: Vec<Value>,
    create: impl FnOnce(&SourceRef) -> SourceRef + 'static,
) -> Option<SourceRef> {
    use_create(cx, Family::Relationships, store, deps, create)
}

pub fn use_relationship_ids(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, RELATIONSHIP_IDS, &[])
}

/// Id of the remote row `local_row` points to, `Absent` if none.
pub fn use_remote_row_id(
    cx: &mut Cx<'_>,
    relationship: &str,
    local_row: &str,
    target: &Target,
) -> Rc<Value> {
    read(cx, target, REMOTE_ROW_ID, &args![relationship, local_row])
}

/// Ids of the local rows pointing at `remote_row`.
pub fn use_local_row_ids(
    cx: &mut Cx<'_>,
    relationship: &str,
    remote_row: &str,
    target: &Target,
) -> Rc<Value> {
    read(cx, target, LOCAL_ROW_IDS, &args![relationship, remote_row])
}

/// Ids of the rows in the linked list starting at `first_row`.
pub fn use_linked_row_ids(
    cx: &mut Cx<'_>,
    relationship: &str,
    first_row: &str,
    target: &Target,
) -> Rc<Value> {
    read(cx, target, LINKED_ROW_IDS, &args![relationship, first_row])
}
