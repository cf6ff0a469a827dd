#![forbid(unsafe_code)]

//! Integration tests: derived objects created, replaced and destroyed by
//! components.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;

use bindery::hooks::checkpoints::{
    use_create_checkpoints, use_set_checkpoint_callback, use_undo_information,
};
use bindery::hooks::metrics::{use_create_metrics, use_metric};
use bindery::hooks::persister::{use_create_persister, use_persister_status};
use bindery::hooks::store::use_cell;
use bindery::hooks::synchronizer::use_create_synchronizer;
use bindery::{BindError, Family, Listenable, Read, SourceRef, Target, Value, args};
use bindery_core::aspect::metrics::METRIC;
use bindery_core::aspect::persister::STATUS;
use bindery_harness::{MemoryCheckpoints, MemoryStore, ScriptedSource};
use bindery_runtime::{Component, TaskPool};

// ============================================================================
// Synchronous creation
// ============================================================================

#[test]
fn created_checkpoints_drive_undo_and_redo() {
    let (store, source) = MemoryStore::new()
        .with_cell("pets", "fido", "color", "brown")
        .shared();
    let made: Rc<RefCell<Option<Rc<MemoryCheckpoints>>>> = Rc::default();
    let mut pane = Component::new("history");
    let render = |pane: &mut Component| {
        let slot = Rc::clone(&made);
        let tracked = Rc::clone(&store);
        pane.render(|cx| {
            let checkpoints = use_create_checkpoints(cx, Some(&source), vec![], move |_| {
                let checkpoints = MemoryCheckpoints::new(tracked);
                *slot.borrow_mut() = Some(Rc::clone(&checkpoints));
                let instance: SourceRef = checkpoints;
                instance
            });
            let info = use_undo_information(cx, &Target::from(checkpoints));
            let color = use_cell(cx, "pets", "fido", "color", &Target::Source(source.clone()));
            (info, color)
        })
        .expect("mounted")
    };

    let (info, _) = render(&mut pane);
    assert!(info.undo.is_bound());
    assert!(!info.can_undo);
    assert_eq!(info.undo_checkpoint.as_deref(), Some("0"));
    assert!(!pane.needs_render());

    store.set_cell("pets", "fido", "color", "walnut");
    assert!(pane.needs_render());
    let (info, color) = render(&mut pane);
    assert!(info.can_undo);
    assert!(info.undo_checkpoint.is_none());
    assert_eq!(*color, Value::from("walnut"));

    info.undo.fire();
    let (info, color) = render(&mut pane);
    assert_eq!(*color, Value::from("brown"));
    assert!(!info.can_undo);
    assert_eq!(info.undo_checkpoint.as_deref(), Some("0"));
    assert!(info.can_redo);
    assert_eq!(info.redo_checkpoint.as_deref(), Some("1"));

    info.redo.fire();
    let (_, color) = render(&mut pane);
    assert_eq!(*color, Value::from("walnut"));

    pane.unmount();
    let checkpoints = made.borrow().clone().expect("created");
    assert!(checkpoints.is_destroyed());
    assert_eq!(store.listener_count(), 0);
}

#[test]
fn labelled_checkpoint_shows_in_undo_information() {
    let (store, _) = MemoryStore::new()
        .with_cell("pets", "fido", "color", "brown")
        .shared();
    let checkpoints = MemoryCheckpoints::new(Rc::clone(&store));
    let handle: SourceRef = checkpoints.clone();
    let target = Target::Source(handle);
    let mut pane = Component::new("history");
    let render = |pane: &mut Component| {
        pane.render(|cx| {
            (
                use_undo_information(cx, &target),
                use_set_checkpoint_callback(cx, |label: &String| label.clone(), vec![], &target),
            )
        })
        .expect("mounted")
    };

    let (_, add) = render(&mut pane);
    store.set_cell("pets", "fido", "color", "walnut");
    add.call(&"recolor".to_owned());
    let (info, _) = render(&mut pane);
    assert!(info.can_undo);
    assert_eq!(info.undo_checkpoint.as_deref(), Some("1"));
    assert_eq!(*info.undo_label, Value::from("recolor"));

    store.set_cell("pets", "fido", "color", "black");
    let (info, _) = render(&mut pane);
    assert!(info.undo_checkpoint.is_none());
    assert!(info.undo_label.is_absent());
}

#[test]
fn changed_deps_replace_and_destroy_the_instance() {
    let (_store, source) = MemoryStore::new().shared();
    let made: Rc<RefCell<Vec<Rc<ScriptedSource>>>> = Rc::default();
    let mut pane = Component::new("metrics");
    let render = |pane: &mut Component, version: i32| {
        let made = Rc::clone(&made);
        pane.render(|cx| {
            let metrics = use_create_metrics(cx, Some(&source), vec![Value::from(version)], move |_| {
                let (metrics, handle) = ScriptedSource::named(Family::Metrics, format!("v{version}"))
                    .with(Read::Get(METRIC), args!["total"], version)
                    .shared();
                made.borrow_mut().push(metrics);
                handle
            });
            use_metric(cx, "total", &Target::from(metrics))
        })
        .expect("mounted")
    };

    assert_eq!(*render(&mut pane, 1), Value::from(1));
    assert!(!pane.needs_render());
    assert_eq!(*render(&mut pane, 1), Value::from(1));
    assert_eq!(made.borrow().len(), 1);
    assert_eq!(*render(&mut pane, 2), Value::from(2));
    assert!(!pane.needs_render());

    let made_now = made.borrow().clone();
    assert_eq!(made_now.len(), 2);
    assert_eq!(made_now[0].name(), "v1");
    assert_eq!(made_now[0].destroy_count(), 1);
    assert_eq!(made_now[0].listener_count(), 0);
    assert_eq!(made_now[1].destroy_count(), 0);

    pane.unmount();
    assert_eq!(made_now[1].destroy_count(), 1);
}

// ============================================================================
// Asynchronous creation
// ============================================================================

fn persister(status: &str) -> (Rc<ScriptedSource>, SourceRef) {
    ScriptedSource::named(Family::Persister, status)
        .with(Read::Get(STATUS), vec![], status)
        .shared()
}

#[test]
fn late_result_for_replaced_request_is_destroyed() {
    let mut pool = TaskPool::new();
    let (_store, source) = MemoryStore::new().shared();
    let (tx1, rx1) = oneshot::channel::<SourceRef>();
    let (tx2, rx2) = oneshot::channel::<SourceRef>();
    let pending = Rc::new(RefCell::new(VecDeque::from([rx1, rx2])));
    let configured: Rc<RefCell<Vec<Value>>> = Rc::default();
    let mut pane = Component::new("persist").with_spawner(pool.spawner());
    let render = |pane: &mut Component, version: i32| {
        let pending = Rc::clone(&pending);
        let log = Rc::clone(&configured);
        pane.render(|cx| {
            let created = use_create_persister(
                cx,
                Some(&source),
                vec![Value::from(version)],
                move |_| {
                    let next = pending.borrow_mut().pop_front();
                    async move {
                        match next {
                            Some(rx) => rx.await.map_err(|_| "creation cancelled".to_owned()),
                            None => Err("no instance left".to_owned()),
                        }
                    }
                },
                move |persister: SourceRef| async move {
                    log.borrow_mut().push(persister.read(Read::Get(STATUS), &[]));
                    Ok(())
                },
            );
            let status = use_persister_status(cx, &Target::from(created.instance.clone()));
            (created, status)
        })
        .expect("mounted")
    };

    render(&mut pane, 1);
    pool.run_until_stalled();
    render(&mut pane, 2);
    pool.run_until_stalled();

    let (first, first_handle) = persister("one");
    let (second, second_handle) = persister("two");
    assert!(tx2.send(second_handle).is_ok());
    pool.run_until_stalled();
    assert!(pane.needs_render());
    assert!(tx1.send(first_handle).is_ok());
    pool.run_until_stalled();

    assert_eq!(first.destroy_count(), 1);
    assert_eq!(*configured.borrow(), vec![Value::from("two")]);

    let (created, status) = render(&mut pane, 2);
    assert!(created.configured);
    assert!(created.error.is_none());
    assert_eq!(*status, Value::from("two"));
    assert_eq!(second.listener_count(), 1);

    pane.unmount();
    assert_eq!(second.destroy_count(), 1);
    assert_eq!(second.listener_count(), 0);
}

#[test]
fn persister_replaced_while_loading_is_never_shown() {
    let mut pool = TaskPool::new();
    let (_store, source) = MemoryStore::new().shared();
    let (first, first_handle) = persister("one");
    let (second, second_handle) = persister("two");
    let (loaded_tx, loaded_rx) = oneshot::channel::<()>();
    let mut first_load = Some(loaded_rx);
    let mut pane = Component::new("persist").with_spawner(pool.spawner());
    let mut render = |pane: &mut Component, version: i32| {
        let (instance, load) = match version {
            1 => (SourceRef::clone(&first_handle), first_load.take()),
            _ => (SourceRef::clone(&second_handle), None),
        };
        pane.render(|cx| {
            let created = use_create_persister(
                cx,
                Some(&source),
                vec![Value::from(version)],
                move |_| async move { Ok::<SourceRef, String>(instance) },
                move |_| async move {
                    match load {
                        Some(load) => load.await.map_err(|_| "load abandoned".to_owned()),
                        None => Ok(()),
                    }
                },
            );
            let status = use_persister_status(cx, &Target::from(created.instance.clone()));
            (created, status)
        })
        .expect("mounted")
    };

    render(&mut pane, 1);
    pool.run_until_stalled();
    assert!(!pane.needs_render());
    let (loading, status) = render(&mut pane, 1);
    assert!(loading.instance.is_none());
    assert!(status.is_absent());
    assert_eq!(first.listener_count(), 0);

    render(&mut pane, 2);
    pool.run_until_stalled();
    assert!(pane.needs_render());
    let (created, status) = render(&mut pane, 2);
    assert!(created.configured);
    assert_eq!(*status, Value::from("two"));

    assert!(loaded_tx.send(()).is_ok());
    pool.run_until_stalled();
    assert_eq!(first.destroy_count(), 1);
    assert_eq!(first.listener_count(), 0);
    assert!(!pane.needs_render());
    let (created, status) = render(&mut pane, 2);
    assert_eq!(*status, Value::from("two"));
    assert_eq!(second.destroy_count(), 0);
    assert!(created.error.is_none());

    pane.unmount();
    assert_eq!(first.destroy_count(), 1);
    assert_eq!(second.destroy_count(), 1);
}

#[test]
fn creation_failure_is_reported() {
    let mut pool = TaskPool::new();
    let (_store, source) = MemoryStore::new().shared();
    let mut pane = Component::new("persist").with_spawner(pool.spawner());
    let render = |pane: &mut Component| {
        pane.render(|cx| {
            use_create_persister(
                cx,
                Some(&source),
                vec![],
                |_| async { Err::<SourceRef, String>("offline".to_owned()) },
                |_| async { Ok(()) },
            )
        })
        .expect("mounted")
    };
    render(&mut pane);
    pool.run_until_stalled();
    assert!(pane.needs_render());
    let created = render(&mut pane);
    assert!(created.instance.is_none());
    assert_eq!(
        created.error,
        Some(BindError::Creation {
            family: Family::Persister,
            reason: "offline".to_owned(),
        })
    );
}

#[test]
fn configuration_failure_keeps_the_instance() {
    let mut pool = TaskPool::new();
    let (_store, source) = MemoryStore::new().shared();
    let (sync, sync_handle) = ScriptedSource::new(Family::Synchronizer).shared();
    let mut offer = Some(sync_handle);
    let mut pane = Component::new("sync").with_spawner(pool.spawner());
    let mut render = |pane: &mut Component| {
        let instance = offer.take();
        pane.render(|cx| {
            use_create_synchronizer(
                cx,
                Some(&source),
                vec![],
                move |_| async move { instance.ok_or_else(|| "already created".to_owned()) },
                |_| async { Err("handshake refused".to_owned()) },
            )
        })
        .expect("mounted")
    };
    render(&mut pane);
    pool.run_until_stalled();
    let created = render(&mut pane);
    assert!(created.instance.is_some());
    assert!(!created.configured);
    assert!(matches!(
        created.error,
        Some(BindError::Configuration { family: Family::Synchronizer, .. })
    ));
    drop(pane);
    assert_eq!(sync.destroy_count(), 1);
}

#[test]
fn missing_executor_is_reported() {
    let (_store, source) = MemoryStore::new().shared();
    let mut pane = Component::new("persist");
    let render = |pane: &mut Component| {
        pane.render(|cx| {
            use_create_persister(
                cx,
                Some(&source),
                vec![],
                |_| async { Err::<SourceRef, String>("never polled".to_owned()) },
                |_| async { Ok(()) },
            )
        })
        .expect("mounted")
    };
    render(&mut pane);
    assert!(pane.needs_render());
    let created = render(&mut pane);
    assert_eq!(created.error, Some(BindError::NoExecutor));
    assert!(created.instance.is_none());
}
