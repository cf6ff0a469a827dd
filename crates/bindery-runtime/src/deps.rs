#![forbid(unsafe_code)]

//! Dependency-list helpers.
//!
//! Hook dependencies are compared with `PartialEq`. Shared objects are
//! dependencies by identity, not by value; [`ByPtr`] provides that.

use std::fmt;
use std::rc::Rc;

/// Wraps an `Rc` so equality is pointer identity.
pub struct ByPtr<T: ?Sized>(pub Rc<T>);

impl<T: ?Sized> ByPtr<T> {
    /// Wrap a shared handle.
    #[must_use]
    pub fn new(rc: Rc<T>) -> Self {
        Self(rc)
    }

    /// Wrap an optional shared handle.
    #[must_use]
    pub fn opt(rc: Option<&Rc<T>>) -> Option<Self> {
        rc.map(|rc| Self(Rc::clone(rc)))
    }
}

impl<T: ?Sized> Clone for ByPtr<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for ByPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for ByPtr<T> {}

impl<T: ?Sized> fmt::Debug for ByPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByPtr({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}
