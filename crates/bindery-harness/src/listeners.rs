#![forbid(unsafe_code)]

//! Listener bookkeeping shared by the in-memory sources.
//!
//! Registrations keep their arguments as given; `Arg::Absent` positions
//! match any concrete argument. Matching listeners are cloned out before
//! they are called, so a listener may add or remove registrations (or read
//! the source) while it runs.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

use bindery_core::{Arg, Listener, ListenerId, Read};

struct Entry {
    read: Read,
    args: Vec<Arg>,
    listener: Listener,
}

/// Registered listeners of one source.
#[derive(Default)]
pub struct ListenerTable {
    next: Cell<u64>,
    entries: RefCell<BTreeMap<ListenerId, Entry>>,
}

impl ListenerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and return its handle.
    pub fn add(&self, read: Read, args: &[Arg], listener: Listener) -> ListenerId {
        let id = ListenerId::new(self.next.get());
        self.next.set(self.next.get() + 1);
        self.entries.borrow_mut().insert(
            id,
            Entry {
                read,
                args: args.to_vec(),
                listener,
            },
        );
        id
    }

    /// Remove a registration. Returns whether it existed.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.entries.borrow_mut().remove(&id).is_some()
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of registrations for `read`, regardless of arguments.
    #[must_use]
    pub fn count_for(&self, read: Read) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|entry| entry.read == read)
            .count()
    }

    /// Listeners registered for `read` whose arguments match `concrete`.
    #[must_use]
    pub fn matching(&self, read: Read, concrete: &[Arg]) -> Vec<Listener> {
        self.entries
            .borrow()
            .values()
            .filter(|entry| entry.read == read && args_match(&entry.args, concrete))
            .map(|entry| Listener::clone(&entry.listener))
            .collect()
    }

    /// Call every listener matching `read` at `concrete`. Returns how many
    /// were called.
    pub fn notify(&self, read: Read, concrete: &[Arg]) -> usize {
        let listeners = self.matching(read, concrete);
        for listener in &listeners {
            listener(concrete);
        }
        listeners.len()
    }
}

impl fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerTable")
            .field("len", &self.len())
            .finish()
    }
}

/// Positional wildcard match. Registration arguments beyond the concrete
/// ones (sort order, paging) do not take part.
#[must_use]
pub fn args_match(registered: &[Arg], concrete: &[Arg]) -> bool {
    registered
        .iter()
        .zip(concrete)
        .all(|(registered, concrete)| registered.matches(concrete))
}
