#![forbid(unsafe_code)]

//! A source of any family whose reads are scripted by the test.
//!
//! Values are stored per exact `(read, args)` pair and changed with
//! [`ScriptedSource::put`], which notifies matching listeners (wildcards
//! included). Writes and commands are only recorded.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use bindery_core::{
    Arg, Aspect, Command, Family, Listenable, Listener, ListenerId, Read, SourceRef, Value,
};

use crate::calls::{Call, CallLog};
use crate::listeners::ListenerTable;

/// Scripted source for metrics, indexes, relationships, queries,
/// persisters and synchronizers (or any other family).
pub struct ScriptedSource {
    family: Family,
    name: String,
    values: RefCell<BTreeMap<(Read, Vec<Arg>), Value>>,
    listeners: ListenerTable,
    log: CallLog,
    refuse_listeners: Cell<bool>,
    destroyed: Cell<u32>,
}

impl ScriptedSource {
    #[must_use]
    pub fn new(family: Family) -> Self {
        Self::named(family, "")
    }

    /// A source carrying a name, to tell instances apart in assertions.
    #[must_use]
    pub fn named(family: Family, name: impl Into<String>) -> Self {
        Self {
            family,
            name: name.into(),
            values: RefCell::default(),
            listeners: ListenerTable::new(),
            log: CallLog::default(),
            refuse_listeners: Cell::new(false),
            destroyed: Cell::new(0),
        }
    }

    /// Builder: seed a value without notifying anyone.
    #[must_use]
    pub fn with(self, read: Read, args: Vec<Arg>, value: impl Into<Value>) -> Self {
        self.values.borrow_mut().insert((read, args), value.into());
        self
    }

    /// Builder: make `add_listener` return `None`.
    #[must_use]
    pub fn refusing_listeners(self) -> Self {
        self.refuse_listeners.set(true);
        self
    }

    /// Wrap in an `Rc` and return it along with a [`SourceRef`] to the same
    /// instance.
    #[must_use]
    pub fn shared(self) -> (Rc<Self>, SourceRef) {
        let source = Rc::new(self);
        let handle: SourceRef = source.clone();
        (source, handle)
    }

    /// Change a value and notify matching listeners.
    pub fn put(&self, read: Read, args: Vec<Arg>, value: impl Into<Value>) {
        self.values.borrow_mut().insert((read, args.clone()), value.into());
        self.listeners.notify(read, &args);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.log.calls()
    }

    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.log.count(method)
    }

    /// How many times `destroy` was called.
    #[must_use]
    pub fn destroy_count(&self) -> u32 {
        self.destroyed.get()
    }
}

impl Listenable for ScriptedSource {
    fn family(&self) -> Family {
        self.family
    }

    fn read(&self, read: Read, args: &[Arg]) -> Value {
        self.values
            .borrow()
            .get(&(read, args.to_vec()))
            .cloned()
            .unwrap_or_default()
    }

    fn add_listener(&self, read: Read, args: &[Arg], listener: Listener) -> Option<ListenerId> {
        if self.refuse_listeners.get() {
            return None;
        }
        self.log.record(read.listener_name(), args, Value::Absent);
        Some(self.listeners.add(read, args, listener))
    }

    fn del_listener(&self, id: ListenerId) {
        self.log.record("delListener", &[], Value::Absent);
        self.listeners.remove(id);
    }

    fn set(&self, aspect: Aspect, args: &[Arg], value: Value) -> Value {
        self.log.record(aspect.setter_name(), args, value);
        Value::Bool(true)
    }

    fn del(&self, aspect: Aspect, args: &[Arg]) -> Value {
        self.log.record(aspect.deleter_name(), args, Value::Absent);
        Value::Bool(true)
    }

    fn command(&self, command: Command, args: &[Arg]) -> Value {
        self.log.record(command.method_name(), args, Value::Absent);
        Value::Absent
    }

    fn destroy(&self) {
        self.destroyed.set(self.destroyed.get() + 1);
        if self.destroyed.get() == 1 {
            self.log.record("destroy", &[], Value::Absent);
            self.listeners.clear();
        }
    }
}

impl fmt::Debug for ScriptedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedSource")
            .field("family", &self.family)
            .field("name", &self.name)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
