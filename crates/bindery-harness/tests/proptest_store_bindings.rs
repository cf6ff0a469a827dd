//! Property-based invariant tests for store bindings.
//!
//! 1. After any edit sequence, every binding equals a direct read once the
//!    component has caught up.
//! 2. A component is only asked to re-render when a bound value changed.
//! 3. Edits never add or drop subscriptions.

use std::rc::Rc;

use bindery::{Arg, Aspect, Listenable, Read, Shape, Target, Value, args, use_aspect};
use bindery_core::aspect::store::{CELL, CELL_IDS, ROW, ROW_COUNT, ROW_IDS, TABLE_IDS, VALUES};
use bindery_harness::MemoryStore;
use bindery_harness::strategy::edits;
use bindery_runtime::{Component, Cx};
use proptest::prelude::*;

fn watched() -> Vec<(Aspect, Vec<Arg>)> {
    vec![
        (CELL, args!["pets", "fido", "color"]),
        (ROW, args!["pets", "felix"]),
        (ROW_IDS, args!["toys"]),
        (ROW_COUNT, args!["pets"]),
        (CELL_IDS, args!["pets", "tweety"]),
        (TABLE_IDS, vec![]),
        (VALUES, vec![]),
    ]
}

fn direct(store: &MemoryStore, watched: &[(Aspect, Vec<Arg>)]) -> Vec<Value> {
    watched
        .iter()
        .map(|(aspect, args)| {
            let shape = aspect.spec().map_or(Shape::Scalar, |spec| spec.shape);
            shape.normalize(store.read(Read::Get(*aspect), args))
        })
        .collect()
}

fn bound(held: &[Rc<Value>]) -> Vec<Value> {
    held.iter().map(|value| Value::clone(value)).collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Bindings track the store
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn bindings_track_direct_reads(script in edits(24)) {
        let (store, source) = MemoryStore::new()
            .with_cell("pets", "fido", "color", "brown")
            .with_cell("pets", "felix", "legs", 4)
            .shared();
        let target = Target::Source(source);
        let watched = watched();
        let view = |cx: &mut Cx<'_>| {
            watched
                .iter()
                .map(|(aspect, args)| use_aspect(cx, &target, *aspect, args))
                .collect::<Vec<_>>()
        };
        let mut pane = Component::new("pane");
        let mut held = pane.render(view).expect("mounted");
        let subscriptions = store.listener_count();
        prop_assert_eq!(subscriptions, watched.len());

        for edit in &script {
            let before = bound(&held);
            edit.apply(&store);
            let now = direct(&store, &watched);
            prop_assert_eq!(pane.needs_render(), before != now, "after {:?}", edit);
            if let Some(next) = pane.render_if_needed(view) {
                held = next;
            }
            prop_assert_eq!(bound(&held), now);
            prop_assert_eq!(store.listener_count(), subscriptions);
        }

        pane.unmount();
        prop_assert_eq!(store.listener_count(), 0);
    }
}
