#![forbid(unsafe_code)]

//! Re-render requests.
//!
//! An [`Invalidator`] is a cloneable handle that marks its component dirty.
//! Listener callbacks hold one so they can request a re-render from outside
//! a render pass; the host decides when to actually render.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
struct State {
    dirty: Cell<bool>,
    requests: Cell<u64>,
    detached: Cell<bool>,
}

/// Handle requesting a re-render of one component.
#[derive(Clone, Default)]
pub struct Invalidator {
    state: Rc<State>,
}

impl Invalidator {
    /// Create a handle for a fresh component.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the component dirty. Ignored once detached.
    pub fn invalidate(&self) {
        if self.state.detached.get() {
            tracing::trace!("invalidate after unmount ignored");
            return;
        }
        self.state.dirty.set(true);
        self.state.requests.set(self.state.requests.get() + 1);
    }

    /// Whether a re-render has been requested since the last render.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.dirty.get()
    }

    /// Total number of accepted re-render requests.
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.state.requests.get()
    }

    /// Whether the owning component has been unmounted.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.state.detached.get()
    }

    /// Whether two handles belong to the same component.
    #[must_use]
    pub fn ptr_eq(&self, other: &Invalidator) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn clear(&self) {
        self.state.dirty.set(false);
    }

    pub(crate) fn detach(&self) {
        self.state.detached.set(true);
        self.state.dirty.set(false);
    }
}

impl fmt::Debug for Invalidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invalidator")
            .field("dirty", &self.is_dirty())
            .field("requests", &self.requests())
            .field("detached", &self.is_detached())
            .finish()
    }
}
