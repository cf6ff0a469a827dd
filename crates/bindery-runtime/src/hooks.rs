#![forbid(unsafe_code)]

//! Hook primitives available during a render pass.
//!
//! A [`Cx`] is handed to a component's render function. Hooks are addressed
//! by call order: the n-th hook call of every render maps to the n-th slot.
//!
//! | Hook | Slot | Behavior |
//! |---|---|---|
//! | [`Cx::use_ref`] | value | created once, returned every render |
//! | [`Cx::use_memo`] | value | recomputed when deps change |
//! | [`Cx::use_effect`] | effect | runs after render when deps change; cleanup before re-run and on unmount |
//! | [`Cx::use_sync_external_store`] | store | subscribes when the key changes; re-render when the snapshot reference changes |
//!
//! # Invariants
//!
//! 1. Every render calls the same hooks in the same order.
//! 2. Effects run after the render function returns. All cleanups of
//!    changed effects run before any of their new bodies.
//! 3. A store's previous subscription is torn down before its replacement is
//!    established.
//!
//! # Failure Modes
//!
//! - Calling hooks in a different order than the previous render panics with
//!   a message naming the slot index.
//! - Panics inside memo, effect, subscribe or snapshot closures propagate to
//!   the caller of `render`.

use std::any::Any;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::executor::LocalSpawner;
use futures::task::{LocalSpawnExt, SpawnError};

use crate::context::Contexts;
use crate::reactive::{Invalidator, Subscription};

/// Cleanup returned by an effect.
pub type Cleanup = Box<dyn FnOnce()>;

/// Change callback handed to an external store's subscribe function.
pub type Notify = Rc<dyn Fn()>;

/// Snapshot reader of an external store.
pub type GetSnapshot<T> = Rc<dyn Fn() -> Rc<T>>;

pub(crate) enum Slot {
    Value(Box<dyn Any>),
    Effect(EffectSlot),
    Store(Box<dyn Any>),
}

impl Slot {
    fn kind(&self) -> &'static str {
        match self {
            Slot::Value(_) => "value",
            Slot::Effect(_) => "effect",
            Slot::Store(_) => "store",
        }
    }
}

pub(crate) struct EffectSlot {
    deps: Box<dyn Any>,
    pub(crate) cleanup: Option<Cleanup>,
}

pub(crate) struct PendingEffect {
    pub(crate) index: usize,
    pub(crate) run: Box<dyn FnOnce() -> Option<Cleanup>>,
}

struct MemoSlot<D, T> {
    deps: D,
    value: Rc<T>,
}

struct StoreSlot<K, T> {
    key: K,
    getter: Rc<RefCell<GetSnapshot<T>>>,
    last: Rc<RefCell<Rc<T>>>,
    // Dropped with the slot; replaced (old one first) on key change.
    subscription: Subscription,
}

/// Render context: hook slots, contexts and the component's invalidator.
pub struct Cx<'a> {
    pub(crate) slots: &'a mut Vec<Slot>,
    pub(crate) cursor: usize,
    pub(crate) pending: Vec<PendingEffect>,
    pub(crate) contexts: &'a Contexts,
    pub(crate) invalidator: &'a Invalidator,
    pub(crate) spawner: Option<&'a LocalSpawner>,
    pub(crate) name: &'static str,
}

impl<'a> Cx<'a> {
    /// Contexts visible to this component.
    #[must_use]
    pub fn contexts(&self) -> &Contexts {
        self.contexts
    }

    /// Nearest context value of type `T`.
    #[must_use]
    pub fn context<T: 'static>(&self) -> Option<Rc<T>> {
        self.contexts.get::<T>()
    }

    /// Handle requesting a re-render of this component.
    #[must_use]
    pub fn invalidator(&self) -> Invalidator {
        self.invalidator.clone()
    }

    /// Component name used in diagnostics.
    #[must_use]
    pub fn component_name(&self) -> &'static str {
        self.name
    }

    /// Run `future` on the host's local executor.
    pub fn spawn_local(&self, future: impl Future<Output = ()> + 'static) -> Result<(), SpawnError> {
        match self.spawner {
            Some(spawner) => spawner.spawn_local(future),
            None => Err(SpawnError::shutdown()),
        }
    }

    /// Whether an executor is attached.
    #[must_use]
    pub fn has_executor(&self) -> bool {
        self.spawner.is_some()
    }

    /// Owned spawner, for effects that start work after the render ends.
    #[must_use]
    pub fn spawner(&self) -> Option<LocalSpawner> {
        self.spawner.cloned()
    }

    /// A value created on first render and kept for the component's lifetime.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<T> {
        self.use_memo((), |()| init())
    }

    /// A value recomputed only when `deps` differs from the previous render.
    pub fn use_memo<D, T>(&mut self, deps: D, compute: impl FnOnce(&D) -> T) -> Rc<T>
    where
        D: PartialEq + 'static,
        T: 'static,
    {
        let index = self.next_index();
        if let Some(slot) = self.slots.get_mut(index) {
            let kind = slot.kind();
            let Slot::Value(boxed) = slot else {
                hook_order_violation(self.name, index, "value", kind);
            };
            let Some(memo) = boxed.downcast_mut::<MemoSlot<D, T>>() else {
                hook_order_violation(self.name, index, "value", "value of another type");
            };
            if memo.deps != deps {
                memo.value = Rc::new(compute(&deps));
                memo.deps = deps;
            }
            return Rc::clone(&memo.value);
        }
        let value = Rc::new(compute(&deps));
        self.slots.push(Slot::Value(Box::new(MemoSlot {
            deps,
            value: Rc::clone(&value),
        })));
        value
    }

    /// Schedule `effect` to run after this render when `deps` changed.
    ///
    /// The effect's returned cleanup runs before the next run and on unmount.
    pub fn use_effect<D>(&mut self, deps: D, effect: impl FnOnce() -> Option<Cleanup> + 'static)
    where
        D: PartialEq + 'static,
    {
        let index = self.next_index();
        let changed = match self.slots.get_mut(index) {
            Some(slot) => {
                let kind = slot.kind();
                let Slot::Effect(effect_slot) = slot else {
                    hook_order_violation(self.name, index, "effect", kind);
                };
                let changed = effect_slot
                    .deps
                    .downcast_ref::<D>()
                    .is_none_or(|previous| *previous != deps);
                if changed {
                    effect_slot.deps = Box::new(deps);
                }
                changed
            }
            None => {
                self.slots.push(Slot::Effect(EffectSlot {
                    deps: Box::new(deps),
                    cleanup: None,
                }));
                true
            }
        };
        if changed {
            self.pending.push(PendingEffect {
                index,
                run: Box::new(effect),
            });
        }
    }

    /// Read an external store and re-render when its snapshot changes.
    ///
    /// `subscribe` is called when `key` differs from the previous render (and
    /// on first render), after the previous subscription has been dropped.
    /// The notify callback re-reads the snapshot and requests a re-render
    /// only if the returned reference differs from the last one.
    pub fn use_sync_external_store<K, T>(
        &mut self,
        key: K,
        subscribe: impl FnOnce(Notify) -> Subscription,
        get_snapshot: GetSnapshot<T>,
    ) -> Rc<T>
    where
        K: PartialEq + 'static,
        T: 'static,
    {
        let index = self.next_index();
        if index >= self.slots.len() {
            let snapshot = get_snapshot();
            let getter = Rc::new(RefCell::new(get_snapshot));
            let last = Rc::new(RefCell::new(Rc::clone(&snapshot)));
            let subscription = subscribe(self.notifier(&getter, &last));
            self.slots.push(Slot::Store(Box::new(StoreSlot {
                key,
                getter,
                last,
                subscription,
            })));
            return snapshot;
        }

        let notify_parts = {
            let slot = &mut self.slots[index];
            let kind = slot.kind();
            let Slot::Store(boxed) = slot else {
                hook_order_violation(self.name, index, "store", kind);
            };
            let Some(store) = boxed.downcast_mut::<StoreSlot<K, T>>() else {
                hook_order_violation(self.name, index, "store", "store of another type");
            };
            *store.getter.borrow_mut() = get_snapshot;
            if store.key != key {
                store.subscription.cancel();
                store.key = key;
                Some((Rc::clone(&store.getter), Rc::clone(&store.last)))
            } else {
                None
            }
        };

        if let Some((getter, last)) = notify_parts {
            let subscription = subscribe(self.notifier(&getter, &last));
            if let Slot::Store(boxed) = &mut self.slots[index]
                && let Some(store) = boxed.downcast_mut::<StoreSlot<K, T>>()
            {
                store.subscription = subscription;
            }
        }

        let slot = &self.slots[index];
        let Slot::Store(boxed) = slot else {
            hook_order_violation(self.name, index, "store", slot.kind());
        };
        let Some(store) = boxed.downcast_ref::<StoreSlot<K, T>>() else {
            hook_order_violation(self.name, index, "store", "store of another type");
        };
        let getter = Rc::clone(&*store.getter.borrow());
        let snapshot = getter();
        *store.last.borrow_mut() = Rc::clone(&snapshot);
        snapshot
    }

    fn notifier<T: 'static>(
        &self,
        getter: &Rc<RefCell<GetSnapshot<T>>>,
        last: &Rc<RefCell<Rc<T>>>,
    ) -> Notify {
        let getter = Rc::clone(getter);
        let last = Rc::clone(last);
        let invalidator = self.invalidator.clone();
        let name = self.name;
        Rc::new(move || {
            let read = Rc::clone(&*getter.borrow());
            let fresh = read();
            let changed = !Rc::ptr_eq(&fresh, &last.borrow());
            if changed {
                *last.borrow_mut() = fresh;
                tracing::trace!(component = name, "external store changed");
                invalidator.invalidate();
            }
        })
    }

    fn next_index(&mut self) -> usize {
        let index = self.cursor;
        self.cursor += 1;
        index
    }
}

#[track_caller]
fn hook_order_violation(component: &str, index: usize, expected: &str, found: &str) -> ! {
    panic!(
        "hook order changed in component `{component}`: slot {index} expected {expected}, found {found}"
    );
}
