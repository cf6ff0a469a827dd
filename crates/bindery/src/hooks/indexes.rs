#![forbid(unsafe_code)]

//! Indexes hooks.

use std::rc::Rc;

use bindery_core::aspect::indexes::{INDEX_IDS, SLICE_IDS, SLICE_ROW_IDS};
use bindery_core::{Family, SourceRef, Value, args};
use bindery_runtime::Cx;

use super::read;
use crate::lifecycle::use_create;
use crate::resolve::{Target, use_source};

pub fn use_indexes(cx: &mut Cx<'_>, id: Option<&str>) -> Option<SourceRef> {
    use_source(cx, Family::Indexes, &Target::from(id))
}

/// Create an indexes object over `store`; see
/// [`use_create_metrics`](super::metrics::use_create_metrics).
pub fn use_create_indexes(
    cx: &mut Cx<'_>,
    store: Option<&SourceRef>,
    deps: Vec<Value>,
    create: impl FnOnce(&SourceRef) -> SourceRef + 'static,
) -> Option<SourceRef> {
    use_create(cx, Family::Indexes, store, deps, create)
}

pub fn use_index_ids(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, INDEX_IDS, &[])
}

pub fn use_slice_ids(cx: &mut Cx<'_>, index: &str, target: &Target) -> Rc<Value> {
    read(cx, target, SLICE_IDS, &args![index])
}

pub fn use_slice_row_ids(cx: &mut Cx<'_>, index: &str, slice: &str, target: &Target) -> Rc<Value> {
    read(cx, target, SLICE_ROW_IDS, &args![index, slice])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Stub;
    use bindery_core::Read;
    use bindery_runtime::Component;

    #[test]
    fn slice_rows_rerender_on_change() {
        let stub = Stub::new(Family::Indexes);
        let source: SourceRef = stub.clone();
        let target = Target::Source(source);
        let read = Read::Get(SLICE_ROW_IDS);
        stub.put(read, args!["bySpecies", "dog"], Value::id_list(["fido"]));
        let mut c = Component::new("slice");
        let render = |c: &mut Component| {
            c.render(|cx| use_slice_row_ids(cx, "bySpecies", "dog", &target))
                .expect("mounted")
        };
        assert_eq!(render(&mut c).ids(), vec!["fido"]);
        stub.put(read, args!["bySpecies", "dog"], Value::id_list(["fido", "rex"]));
        assert!(c.needs_render());
        assert_eq!(render(&mut c).ids(), vec!["fido", "rex"]);
    }
}
