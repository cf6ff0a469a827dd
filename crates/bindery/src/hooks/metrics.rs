#![forbid(unsafe_code)]

//! Metrics hooks.

use std::rc::Rc;

use bindery_core::aspect::metrics::{METRIC, METRIC_IDS};
use bindery_core::{Family, SourceRef, Value, args};
use bindery_runtime::Cx;

use super::read;
use crate::lifecycle::use_create;
use crate::resolve::{Target, use_source};

/// The metrics object `id` names in the current scope, or the default one.
pub fn use_metrics(cx: &mut Cx<'_>, id: Option<&str>) -> Option<SourceRef> {
    use_source(cx, Family::Metrics, &Target::from(id))
}

/// Create a metrics object over `store`, recreated when the store or
/// `deps` change and destroyed on unmount.
pub fn use_create_metrics(
    cx: &mut Cx<'_>,
    store: Option<&SourceRef>,
    deps: Vec<Value>,
    create: impl FnOnce(&SourceRef) -> SourceRef + 'static,
) -> Option<SourceRef> {
    use_create(cx, Family::Metrics, store, deps, create)
}

pub fn use_metric_ids(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, METRIC_IDS, &[])
}

/// Current value of one metric; `Absent` until it is defined.
pub fn use_metric(cx: &mut Cx<'_>, metric: &str, target: &Target) -> Rc<Value> {
    read(cx, target, METRIC, &args![metric])
}
