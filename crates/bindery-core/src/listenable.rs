#![forbid(unsafe_code)]

//! The contract every observable data source implements.
//!
//! A source exposes typed reads, listener registration keyed by the same
//! read and arguments, a single shared listener removal, and optional
//! writes. Sources are shared as [`SourceRef`] (`Rc<dyn Listenable>`) and
//! compared by pointer identity, never by value.
//!
//! # Invariants
//!
//! 1. A [`ListenerId`] returned by `add_listener` is valid for exactly one
//!    `del_listener` call.
//! 2. `destroy` is idempotent.
//! 3. Listeners may be invoked at any time, including outside a render.
//!    Implementations must not hold interior borrows while calling them.

use core::fmt;
use std::rc::Rc;

use crate::aspect::{Aspect, Command, Read};
use crate::family::Family;
use crate::value::{Arg, Value};

/// Change callback. Receives the concrete arguments of the change.
pub type Listener = Rc<dyn Fn(&[Arg])>;

/// Handle returned by listener registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a raw handle.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// An observable data source.
pub trait Listenable {
    /// Family this source belongs to.
    fn family(&self) -> Family;

    /// Read the current value (or presence) of an aspect. Returns
    /// [`Value::Absent`] when there is nothing to report.
    fn read(&self, read: Read, args: &[Arg]) -> Value;

    /// Register `listener` for changes to `read` at `args`. `Arg::Absent`
    /// positions match any concrete argument. Returns `None` if the source
    /// does not support listening to this read.
    fn add_listener(&self, read: Read, args: &[Arg], listener: Listener) -> Option<ListenerId>;

    /// Remove a listener registered by `add_listener`.
    fn del_listener(&self, id: ListenerId);

    /// Write `value` to `aspect` at `args`. Returns the source's result.
    fn set(&self, aspect: Aspect, args: &[Arg], value: Value) -> Value {
        let _ = (args, value);
        tracing::debug!(method = %aspect.setter_name(), "source does not support writes");
        Value::Absent
    }

    /// Delete `aspect` at `args`. Returns the source's result.
    fn del(&self, aspect: Aspect, args: &[Arg]) -> Value {
        let _ = args;
        tracing::debug!(method = %aspect.deleter_name(), "source does not support deletes");
        Value::Absent
    }

    /// Run an imperative command.
    fn command(&self, command: Command, args: &[Arg]) -> Value {
        let _ = args;
        tracing::debug!(%command, "source does not support commands");
        Value::Absent
    }

    /// Release everything the source owns. Called by lifecycle management
    /// for derived objects.
    fn destroy(&self) {}
}

/// Shared handle to a source.
pub type SourceRef = Rc<dyn Listenable>;

/// Whether two handles refer to the same source instance.
#[inline]
#[must_use]
pub fn same_source(a: &SourceRef, b: &SourceRef) -> bool {
    Rc::ptr_eq(a, b)
}

/// Whether two optional handles are both absent or the same instance.
#[must_use]
pub fn same_opt_source(a: Option<&SourceRef>, b: Option<&SourceRef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => same_source(a, b),
        _ => false,
    }
}

impl fmt::Debug for dyn Listenable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listenable")
            .field("family", &self.family())
            .finish_non_exhaustive()
    }
}
