#![forbid(unsafe_code)]

//! Minimal in-crate source double for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use bindery_core::{
    Arg, Aspect, Command, Family, Listenable, Listener, ListenerId, Read, SourceRef, Value,
};

#[derive(Default)]
pub(crate) struct Stub {
    family: Cell<Option<Family>>,
    values: RefCell<BTreeMap<(Read, Vec<Arg>), Value>>,
    listeners: RefCell<BTreeMap<ListenerId, (Read, Vec<Arg>, Listener)>>,
    next: Cell<u64>,
    pub(crate) writes: RefCell<Vec<(String, Vec<Arg>, Value)>>,
    pub(crate) destroyed: Cell<u32>,
}

impl Stub {
    pub(crate) fn new(family: Family) -> Rc<Self> {
        let stub = Self::default();
        stub.family.set(Some(family));
        Rc::new(stub)
    }

    pub(crate) fn put(&self, read: Read, args: Vec<Arg>, value: Value) {
        self.values.borrow_mut().insert((read, args.clone()), value);
        let matching: Vec<Listener> = self
            .listeners
            .borrow()
            .values()
            .filter(|(r, a, _)| *r == read && *a == args)
            .map(|(_, _, l)| Rc::clone(l))
            .collect();
        for listener in matching {
            listener(&args);
        }
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl Listenable for Stub {
    fn family(&self) -> Family {
        self.family.get().unwrap_or(Family::Store)
    }

    fn read(&self, read: Read, args: &[Arg]) -> Value {
        self.values
            .borrow()
            .get(&(read, args.to_vec()))
            .cloned()
            .unwrap_or_default()
    }

    fn add_listener(&self, read: Read, args: &[Arg], listener: Listener) -> Option<ListenerId> {
        let id = ListenerId::new(self.next.get());
        self.next.set(self.next.get() + 1);
        self.listeners
            .borrow_mut()
            .insert(id, (read, args.to_vec(), listener));
        Some(id)
    }

    fn del_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id);
    }

    fn set(&self, aspect: Aspect, args: &[Arg], value: Value) -> Value {
        self.writes
            .borrow_mut()
            .push((aspect.setter_name(), args.to_vec(), value));
        Value::Bool(true)
    }

    fn del(&self, aspect: Aspect, args: &[Arg]) -> Value {
        self.writes
            .borrow_mut()
            .push((aspect.deleter_name(), args.to_vec(), Value::Absent));
        Value::Bool(true)
    }

    fn command(&self, command: Command, args: &[Arg]) -> Value {
        self.writes
            .borrow_mut()
            .push((command.method_name().to_owned(), args.to_vec(), Value::Absent));
        Value::Absent
    }

    fn destroy(&self) {
        self.destroyed.set(self.destroyed.get() + 1);
    }
}

/// A fresh source of `family`, as a shared handle.
pub(crate) fn stub(family: Family) -> SourceRef {
    Stub::new(family)
}
