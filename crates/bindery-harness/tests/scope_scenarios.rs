#![forbid(unsafe_code)]

//! Integration tests: nested providers, named instances and runtime
//! registration.

use std::rc::Rc;

use bindery::hooks::store::{use_cell, use_store, use_store_ids};
use bindery::{
    Family, ScopeProps, SourceRef, Target, Value, root_contexts, use_provide_source,
    use_scope_provider,
};
use bindery_core::{same_opt_source, same_source};
use bindery_harness::MemoryStore;
use bindery_runtime::{Component, Contexts};

const STORE: Family = Family::Store;

fn store(color: &str) -> SourceRef {
    MemoryStore::new()
        .with_cell("pets", "fido", "color", color)
        .shared()
        .1
}

struct Tree {
    outer: Component,
    outer_props: ScopeProps,
    inner: Component,
    inner_props: ScopeProps,
}

impl Tree {
    /// Outer provider: default `a`, named `x`. Inner provider: named `y` and
    /// its own `x`.
    fn new(a: &SourceRef, x: &SourceRef, x2: &SourceRef, y: &SourceRef) -> Self {
        Self {
            outer: Component::with_contexts("outer", root_contexts()),
            outer_props: ScopeProps::new()
                .default_source(STORE, Rc::clone(a))
                .named_source(STORE, "x", Rc::clone(x)),
            inner: Component::new("inner"),
            inner_props: ScopeProps::new()
                .named_source(STORE, "y", Rc::clone(y))
                .named_source(STORE, "x", Rc::clone(x2)),
        }
    }

    /// Render both providers top-down; returns (outer, inner) child contexts.
    fn render(&mut self) -> (Contexts, Contexts) {
        let props = &self.outer_props;
        let outer = self
            .outer
            .render(|cx| use_scope_provider(cx, props))
            .expect("mounted");
        self.inner.set_contexts(outer.contexts.clone());
        let props = &self.inner_props;
        let inner = self
            .inner
            .render(|cx| use_scope_provider(cx, props))
            .expect("mounted");
        (outer.contexts, inner.contexts)
    }
}

fn lookup(contexts: &Contexts, id: Option<&str>) -> Option<SourceRef> {
    let mut reader = Component::with_contexts("reader", contexts.clone());
    reader.render(|cx| use_store(cx, id)).expect("mounted")
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn nearest_provider_wins_and_defaults_inherit() {
    let (a, x, x2, y) = (store("a"), store("x"), store("x2"), store("y"));
    let mut tree = Tree::new(&a, &x, &x2, &y);
    let (outer, inner) = tree.render();

    assert!(same_opt_source(lookup(&inner, None).as_ref(), Some(&a)));
    assert!(same_opt_source(lookup(&inner, Some("x")).as_ref(), Some(&x2)));
    assert!(same_opt_source(lookup(&inner, Some("y")).as_ref(), Some(&y)));
    assert!(same_opt_source(lookup(&outer, Some("x")).as_ref(), Some(&x)));
    assert!(lookup(&outer, Some("y")).is_none());

    let mut reader = Component::with_contexts("reader", inner);
    let ids = reader.render(use_store_ids).expect("mounted");
    assert_eq!(ids, vec!["x".to_owned(), "y".to_owned()]);
}

#[test]
fn unchanged_providers_hand_down_identical_contexts() {
    let (a, x, x2, y) = (store("a"), store("x"), store("x2"), store("y"));
    let mut tree = Tree::new(&a, &x, &x2, &y);
    let (outer1, inner1) = tree.render();
    let (outer2, inner2) = tree.render();
    assert!(outer1.same_as(&outer2));
    assert!(inner1.same_as(&inner2));
}

// ============================================================================
// Runtime registration
// ============================================================================

#[test]
fn registered_instance_is_visible_while_mounted() {
    let (a, x, x2, y) = (store("a"), store("x"), store("x2"), store("y"));
    let z = store("walnut");
    let mut tree = Tree::new(&a, &x, &x2, &y);
    let (outer, inner) = tree.render();

    let mut reader = Component::with_contexts("reader", inner.clone());
    let read = |reader: &mut Component| {
        reader
            .render(|cx| use_cell(cx, "pets", "fido", "color", &Target::from("z")))
            .expect("mounted")
    };
    assert!(read(&mut reader).is_absent());

    let mut registrar = Component::with_contexts("registrar", inner);
    registrar.render(|cx| use_provide_source(cx, STORE, "z", Some(&z)));
    assert!(tree.inner.needs_render());
    assert!(!tree.outer.needs_render());

    let (outer2, inner) = tree.render();
    assert!(outer.same_as(&outer2));
    assert!(same_opt_source(lookup(&inner, Some("z")).as_ref(), Some(&z)));
    assert!(lookup(&outer2, Some("z")).is_none());

    reader.set_contexts(inner.clone());
    assert_eq!(*read(&mut reader), Value::from("walnut"));

    registrar.unmount();
    assert!(tree.inner.needs_render());
    let (_, inner) = tree.render();
    assert!(lookup(&inner, Some("z")).is_none());
    reader.set_contexts(inner);
    assert!(read(&mut reader).is_absent());
}

#[test]
fn dynamic_registration_overrides_static_names() {
    let (a, x, x2, y) = (store("a"), store("x"), store("x2"), store("y"));
    let w = store("w");
    let mut tree = Tree::new(&a, &x, &x2, &y);
    let (_, inner) = tree.render();

    let mut registrar = Component::with_contexts("registrar", inner);
    registrar.render(|cx| use_provide_source(cx, STORE, "y", Some(&w)));
    let (_, inner) = tree.render();
    assert!(same_opt_source(lookup(&inner, Some("y")).as_ref(), Some(&w)));

    drop(registrar);
    let (_, inner) = tree.render();
    assert!(same_opt_source(lookup(&inner, Some("y")).as_ref(), Some(&y)));
}

#[test]
fn re_registering_with_a_new_instance_replaces_it() {
    let (a, x, x2, y) = (store("a"), store("x"), store("x2"), store("y"));
    let (z1, z2) = (store("z1"), store("z2"));
    let mut tree = Tree::new(&a, &x, &x2, &y);
    let (_, inner) = tree.render();

    let mut registrar = Component::with_contexts("registrar", inner);
    registrar.render(|cx| use_provide_source(cx, STORE, "z", Some(&z1)));
    registrar.render(|cx| use_provide_source(cx, STORE, "z", Some(&z2)));
    let (_, inner) = tree.render();
    let resolved = lookup(&inner, Some("z")).expect("registered");
    assert!(same_source(&resolved, &z2));

    registrar.render(|cx| use_provide_source(cx, STORE, "z", None));
    let (_, inner) = tree.render();
    assert!(lookup(&inner, Some("z")).is_none());
}
