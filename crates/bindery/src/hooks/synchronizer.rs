#![forbid(unsafe_code)]

//! Synchronizer hooks.

use std::future::Future;
use std::rc::Rc;

use bindery_core::aspect::synchronizer::STATUS;
use bindery_core::{Family, SourceRef, Value};
use bindery_runtime::Cx;

use super::read;
use crate::lifecycle::{Created, use_create_configured};
use crate::resolve::{Target, use_source};

pub fn use_synchronizer(cx: &mut Cx<'_>, id: Option<&str>) -> Option<SourceRef> {
    use_source(cx, Family::Synchronizer, &Target::from(id))
}

/// Current synchronization status, as reported by the synchronizer.
pub fn use_synchronizer_status(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, STATUS, &[])
}

/// Create a synchronizer for `store` asynchronously, then run `configure`
/// (typically starting synchronization).
pub fn use_create_synchronizer<F, C, G>(
    cx: &mut Cx<'_>,
    store: Option<&SourceRef>,
    deps: Vec<Value>,
    create: impl FnOnce(SourceRef) -> F + 'static,
    configure: C,
) -> Created
where
    F: Future<Output = Result<SourceRef, String>> + 'static,
    C: FnOnce(SourceRef) -> G + 'static,
    G: Future<Output = Result<(), String>> + 'static,
{
    use_create_configured(cx, Family::Synchronizer, store, deps, create, Some(configure))
}
