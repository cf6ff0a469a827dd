#![forbid(unsafe_code)]

//! Subscription adapter: one aspect of one source, read as a snapshot.
//!
//! A [`Binding`] pairs a resolved source with an aspect, a shape category
//! and the discriminating arguments. It provides the two callbacks the
//! host's external-store primitive needs:
//!
//! - [`Binding::get_snapshot`] reads the current value and keeps returning
//!   the same `Rc` for as long as the value stays equal under the shape's
//!   equality, so consumers can compare by reference.
//! - [`Binding::subscribe`] registers a listener and returns a
//!   [`Subscription`] that deregisters it exactly once.
//!
//! [`use_listenable`] wires both into a component render.
//!
//! # Invariants
//!
//! 1. Without a source, the snapshot is the shape default and subscribing is
//!    a no-op.
//! 2. `Absent` reads are normalized to the shape default.
//! 3. A change of [`BindingKey`] (source identity, read, shape or any
//!    argument) drops the old subscription before the new one is created.
//!
//! # Failure Modes
//!
//! - A source that refuses a listener (returns no handle) is logged at
//!   `warn` and the binding behaves as if unsubscribed.
//! - Too many arguments, or a shape the aspect cannot be read as, are logged
//!   at `warn`; the read still goes to the source.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bindery_core::{
    Arg, Aspect, DispatchTable, Listenable, Listener, Read, Shape, SourceRef, Value,
};
use bindery_runtime::{ByPtr, Cx, GetSnapshot, Notify, Subscription};

use crate::resolve::{Target, use_source};

/// Everything a binding's subscription depends on.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingKey {
    pub source: Option<ByPtr<dyn Listenable>>,
    pub read: Read,
    pub shape: Shape,
    pub args: Vec<Arg>,
}

/// One aspect of one (possibly absent) source.
pub struct Binding {
    source: Option<SourceRef>,
    read: Read,
    shape: Shape,
    args: Vec<Arg>,
    cache: RefCell<Rc<Value>>,
}

impl Binding {
    /// Bind `aspect` of `source` as `shape`.
    #[must_use]
    pub fn new(source: Option<SourceRef>, aspect: Aspect, shape: Shape, args: Vec<Arg>) -> Self {
        Self {
            source,
            read: Read::for_shape(aspect, shape),
            shape,
            args,
            cache: RefCell::new(Rc::new(shape.default_value())),
        }
    }

    /// Identity of what this binding listens to.
    #[must_use]
    pub fn key(&self) -> BindingKey {
        BindingKey {
            source: ByPtr::opt(self.source.as_ref()),
            read: self.read,
            shape: self.shape,
            args: self.args.clone(),
        }
    }

    /// The bound source, if resolved.
    #[must_use]
    pub fn source(&self) -> Option<&SourceRef> {
        self.source.as_ref()
    }

    /// Current value. Returns the previously returned `Rc` when the fresh
    /// value is equal to it under the shape's equality.
    pub fn get_snapshot(&self) -> Rc<Value> {
        let fresh = match &self.source {
            Some(source) => self.shape.normalize(source.read(self.read, &self.args)),
            None => self.shape.default_value(),
        };
        let mut cache = self.cache.borrow_mut();
        if self.shape.equals(&cache, &fresh) {
            return Rc::clone(&cache);
        }
        *cache = Rc::new(fresh);
        Rc::clone(&cache)
    }

    /// Register `on_change` with the source.
    pub fn subscribe(&self, on_change: Notify) -> Subscription {
        let Some(source) = &self.source else {
            return Subscription::noop();
        };
        let listener: Listener = Rc::new(move |_args: &[Arg]| on_change());
        let Some(handle) = source.add_listener(self.read, &self.args, listener) else {
            tracing::warn!(
                read = %self.read,
                listener = %self.read.listener_name(),
                "source refused listener"
            );
            return Subscription::noop();
        };
        tracing::trace!(read = %self.read, handle = handle.raw(), "subscribed");
        let source = SourceRef::clone(source);
        let read = self.read;
        Subscription::new(move || {
            tracing::trace!(%read, handle = handle.raw(), "unsubscribed");
            source.del_listener(handle);
        })
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("read", &self.read)
            .field("shape", &self.shape)
            .field("args", &self.args)
            .field("resolved", &self.source.is_some())
            .finish()
    }
}

fn check_binding(aspect: Aspect, shape: Shape, args: &[Arg]) {
    let table = DispatchTable::global();
    if let Err(err) = table.check_arity(aspect, args.len()) {
        tracing::warn!(%err, "binding arguments");
    }
    if let Some(spec) = table.get(aspect)
        && !spec.accepts(shape)
    {
        tracing::warn!(%aspect, ?shape, "aspect is not readable as this shape");
    }
}

/// Subscribe the rendering component to `aspect` of the source `target`
/// resolves to, and return its current value.
pub fn use_listenable(
    cx: &mut Cx<'_>,
    target: &Target,
    aspect: Aspect,
    shape: Shape,
    args: &[Arg],
) -> Rc<Value> {
    let source = use_source(cx, aspect.family(), target);
    let key = BindingKey {
        source: ByPtr::opt(source.as_ref()),
        read: Read::for_shape(aspect, shape),
        shape,
        args: args.to_vec(),
    };
    let binding = cx.use_memo(key.clone(), |key| {
        check_binding(aspect, shape, &key.args);
        Binding::new(source, aspect, shape, key.args.clone())
    });
    let subscriber = Rc::clone(&binding);
    let getter: GetSnapshot<Value> = Rc::new(move || binding.get_snapshot());
    cx.use_sync_external_store(key, move |notify| subscriber.subscribe(notify), getter)
}

/// [`use_listenable`] with the aspect's catalog shape.
pub fn use_aspect(cx: &mut Cx<'_>, target: &Target, aspect: Aspect, args: &[Arg]) -> Rc<Value> {
    let shape = aspect.spec().map_or(Shape::Scalar, |spec| spec.shape);
    use_listenable(cx, target, aspect, shape, args)
}

/// Whether `aspect` exists for `args`.
pub fn use_presence(cx: &mut Cx<'_>, target: &Target, aspect: Aspect, args: &[Arg]) -> bool {
    use_listenable(cx, target, aspect, Shape::Presence, args)
        .as_bool()
        .unwrap_or(false)
}
