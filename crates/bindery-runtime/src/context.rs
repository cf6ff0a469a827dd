#![forbid(unsafe_code)]

//! Typed context map passed down the component tree.
//!
//! [`Contexts`] maps a Rust type to one shared value of that type. Providers
//! derive a child map with [`Contexts::with`]; descendants read the nearest
//! value with [`Contexts::get`]. Maps are persistent (`im::HashMap`), so
//! deriving a child never disturbs the parent.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

/// Persistent type-indexed context map.
#[derive(Clone, Default)]
pub struct Contexts {
    entries: im::HashMap<TypeId, Rc<dyn Any>>,
}

impl Contexts {
    /// Empty context map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a map in which `T` resolves to `value`.
    #[must_use]
    pub fn with<T: 'static>(&self, value: T) -> Self {
        self.with_rc(Rc::new(value))
    }

    /// Derive a map in which `T` resolves to an already shared value.
    #[must_use]
    pub fn with_rc<T: 'static>(&self, value: Rc<T>) -> Self {
        let value: Rc<dyn Any> = value;
        Self {
            entries: self.entries.update(TypeId::of::<T>(), value),
        }
    }

    /// Nearest value of type `T`.
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<Rc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| Rc::clone(value).downcast::<T>().ok())
    }

    /// Whether a value of type `T` is present.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether both maps hold the same shared values under the same types.
    #[must_use]
    pub fn same_as(&self, other: &Contexts) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(key, value)| {
                other
                    .entries
                    .get(key)
                    .is_some_and(|theirs| Rc::ptr_eq(value, theirs))
            })
    }
}

impl fmt::Debug for Contexts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contexts")
            .field("len", &self.entries.len())
            .finish()
    }
}
