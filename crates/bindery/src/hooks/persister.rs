#![forbid(unsafe_code)]

//! Persister hooks.

use std::future::Future;
use std::rc::Rc;

use bindery_core::aspect::persister::STATUS;
use bindery_core::{Family, SourceRef, Value};
use bindery_runtime::Cx;

use super::read;
use crate::lifecycle::{Created, use_create_configured};
use crate::resolve::{Target, use_source};

pub fn use_persister(cx: &mut Cx<'_>, id: Option<&str>) -> Option<SourceRef> {
    use_source(cx, Family::Persister, &Target::from(id))
}

/// Current persistence status, as reported by the persister.
pub fn use_persister_status(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, STATUS, &[])
}

/// Create a persister for `store` asynchronously, then run `configure`
/// (typically an initial load and enabling auto-save).
pub fn use_create_persister<F, C, G>(
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
    use_create_configured(cx, Family::Persister, store, deps, create, Some(configure))
}
