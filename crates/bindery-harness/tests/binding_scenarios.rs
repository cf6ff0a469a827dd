#![forbid(unsafe_code)]

//! Integration tests: reading store aspects through component bindings.

use std::cell::RefCell;
use std::rc::Rc;

use bindery::hooks::SortBy;
use bindery::hooks::checkpoints::use_checkpoint_ids;
use bindery::hooks::store::{
    use_cell, use_cell_listener, use_has_row, use_row, use_row_count, use_row_ids,
    use_sorted_row_ids, use_table_ids, use_values,
};
use bindery::{Arg, Family, ScopeProps, Target, Value, args, root_contexts, use_scope_provider};
use bindery_core::CheckpointIds;
use bindery_harness::MemoryStore;
use bindery_runtime::{Component, Contexts};
use serde_json::json;

fn pets() -> MemoryStore {
    MemoryStore::from_json(&json!({
        "tables": {"pets": {
            "fido": {"color": "brown", "legs": 4.0},
            "felix": {"color": "black", "legs": 4.0},
            "tweety": {"color": "yellow", "legs": 2.0},
        }},
        "values": {"open": true},
    }))
}

/// Mount a provider making `store` the default and return the contexts its
/// children render under.
fn provide(store: &bindery::SourceRef) -> (Component, Contexts) {
    let props = ScopeProps::new().default_source(Family::Store, Rc::clone(store));
    let mut app = Component::with_contexts("app", root_contexts());
    let provided = app
        .render(|cx| use_scope_provider(cx, &props))
        .expect("mounted");
    (app, provided.contexts)
}

// ============================================================================
// Single cell
// ============================================================================

#[test]
fn cell_binding_rerenders_only_on_change() {
    let (store, source) = MemoryStore::new()
        .with_cell("pets", "fido", "color", "brown")
        .shared();
    let (_app, contexts) = provide(&source);
    let mut pane = Component::with_contexts("pane", contexts);
    let render = |pane: &mut Component| {
        pane.render(|cx| use_cell(cx, "pets", "fido", "color", &Target::Default))
            .expect("mounted")
    };

    assert_eq!(*render(&mut pane), Value::from("brown"));
    assert_eq!(store.listener_count(), 1);

    store.set_cell("pets", "fido", "color", "brown");
    assert!(!pane.needs_render());

    store.set_cell("pets", "fido", "color", "walnut");
    assert!(pane.needs_render());
    assert_eq!(*render(&mut pane), Value::from("walnut"));
    assert_eq!(pane.render_count(), 2);
    assert_eq!(store.listener_count(), 1);
}

#[test]
fn deleting_a_cell_falls_back_to_absent() {
    let (store, source) = pets().shared();
    let target = Target::Source(source);
    let mut pane = Component::new("pane");
    let value = pane
        .render(|cx| use_cell(cx, "pets", "fido", "legs", &target))
        .expect("mounted");
    assert_eq!(*value, Value::from(4));
    store.del_row("pets", "fido");
    let value = pane
        .render_if_needed(|cx| use_cell(cx, "pets", "fido", "legs", &target))
        .expect("re-render requested");
    assert!(value.is_absent());
}

// ============================================================================
// Reference stability
// ============================================================================

#[test]
fn unrelated_changes_keep_snapshots() {
    let (store, source) = pets().shared();
    let target = Target::Source(source);
    let mut pane = Component::new("pane");
    let render = |pane: &mut Component| {
        pane.render(|cx| {
            (
                use_table_ids(cx, &target),
                use_row_ids(cx, "pets", &target),
                use_row(cx, "pets", "felix", &target),
                use_values(cx, &target),
            )
        })
        .expect("mounted")
    };
    let (tables, rows, felix, values) = render(&mut pane);

    // Notified (the store reports coarsely) but equal under each shape.
    store.set_cell("pets", "fido", "color", "walnut");
    assert!(!pane.needs_render());

    let (tables2, rows2, felix2, values2) = render(&mut pane);
    assert!(Rc::ptr_eq(&tables, &tables2));
    assert!(Rc::ptr_eq(&rows, &rows2));
    assert!(Rc::ptr_eq(&felix, &felix2));
    assert!(Rc::ptr_eq(&values, &values2));

    store.set_cell("pets", "felix", "legs", 3.0);
    assert!(pane.needs_render());
    let (_, rows3, felix3, _) = render(&mut pane);
    assert!(Rc::ptr_eq(&rows, &rows3));
    assert!(!Rc::ptr_eq(&felix, &felix3));
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn defaults_without_any_store() {
    let mut pane = Component::with_contexts("pane", root_contexts());
    let (row, ids, count, has, cell, checkpoints) = pane
        .render(|cx| {
            let target = Target::Default;
            (
                use_row(cx, "pets", "fido", &target),
                use_row_ids(cx, "pets", &target),
                use_row_count(cx, "pets", &target),
                use_has_row(cx, "pets", "fido", &target),
                use_cell(cx, "pets", "fido", "color", &target),
                use_checkpoint_ids(cx, &target),
            )
        })
        .expect("mounted");
    assert_eq!(*row, Value::map(Vec::<(String, Value)>::new()));
    assert_eq!(*ids, Value::List(Vec::new()));
    assert_eq!(count, 0);
    assert!(!has);
    assert!(cell.is_absent());
    assert_eq!(*checkpoints, Value::Checkpoints(CheckpointIds::default()));
}

#[test]
fn unknown_id_reads_defaults_and_subscribes_nothing() {
    let (store, source) = pets().shared();
    let (_app, contexts) = provide(&source);
    let mut pane = Component::with_contexts("pane", contexts);
    let count = pane
        .render(|cx| use_row_count(cx, "pets", &Target::from("missing")))
        .expect("mounted");
    assert_eq!(count, 0);
    assert_eq!(store.listener_count(), 0);
}

// ============================================================================
// Derived reads
// ============================================================================

#[test]
fn counts_presence_and_sorting_follow_writes() {
    let (store, source) = pets().shared();
    let target = Target::Source(source);
    let by_legs = SortBy::cell("legs").descending();
    let mut pane = Component::new("pane");
    let render = |pane: &mut Component| {
        pane.render(|cx| {
            (
                use_row_count(cx, "pets", &target),
                use_has_row(cx, "pets", "tweety", &target),
                use_sorted_row_ids(cx, "pets", &by_legs, &target),
            )
        })
        .expect("mounted")
    };

    let (count, has_tweety, sorted) = render(&mut pane);
    assert_eq!(count, 3);
    assert!(has_tweety);
    assert_eq!(sorted.ids(), vec!["fido", "felix", "tweety"]);

    store.set_cell("pets", "tweety", "legs", 6.0);
    let (_, _, sorted) = render(&mut pane);
    assert_eq!(sorted.ids(), vec!["tweety", "fido", "felix"]);

    store.del_row("pets", "tweety");
    assert!(pane.needs_render());
    let (count, has_tweety, sorted) = render(&mut pane);
    assert_eq!(count, 2);
    assert!(!has_tweety);
    assert_eq!(sorted.ids(), vec!["fido", "felix"]);
}

// ============================================================================
// Listeners and teardown
// ============================================================================

#[test]
fn wildcard_cell_listener_hears_concrete_ids() {
    let (store, source) = pets().shared();
    let target = Target::Source(source);
    let heard: Rc<RefCell<Vec<Vec<Arg>>>> = Rc::default();
    let sink = Rc::clone(&heard);
    let mut pane = Component::new("pane");
    pane.render(|cx| {
        use_cell_listener(
            cx,
            Some("pets"),
            None,
            Some("color"),
            move |args| sink.borrow_mut().push(args.to_vec()),
            vec![],
            &target,
        );
    });

    store.set_cell("pets", "felix", "legs", 3.0);
    store.set_cell("pets", "felix", "color", "grey");
    store.set_cell("pets", "rex", "color", "tan");
    assert_eq!(
        *heard.borrow(),
        vec![args!["pets", "felix", "color"], args!["pets", "rex", "color"]]
    );
    assert!(!pane.needs_render());
}

#[test]
fn unmount_releases_every_listener() {
    let (store, source) = pets().shared();
    let target = Target::Source(source);
    let mut pane = Component::new("pane");
    pane.render(|cx| {
        use_cell(cx, "pets", "fido", "color", &target);
        use_row_ids(cx, "pets", &target);
        use_has_row(cx, "pets", "fido", &target);
        use_cell_listener(cx, None, None, None, |_| {}, vec![], &target);
    });
    assert_eq!(store.listener_count(), 4);
    pane.unmount();
    assert_eq!(store.listener_count(), 0);
    assert_eq!(store.call_count("delListener"), 4);

    store.set_cell("pets", "fido", "color", "walnut");
    assert!(!pane.needs_render());
}
