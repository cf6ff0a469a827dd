#![forbid(unsafe_code)]

//! Undo/redo history over a [`MemoryStore`].
//!
//! Checkpoint `"0"` is taken on creation. Any later change to the store
//! moves the current checkpoint behind and leaves the history with no
//! current id until [`Command::AddCheckpoint`] records one. Going backward
//! with uncheckpointed changes records them first, so they can be redone.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use bindery_core::aspect::checkpoints::{CHECKPOINT, CHECKPOINT_IDS};
use bindery_core::aspect::store::{TABLES, VALUES};
use bindery_core::{
    Arg, Aspect, CheckpointIds, Command, Family, Id, Listenable, Listener, ListenerId, Read, Value,
    args,
};

use crate::calls::{Call, CallLog};
use crate::listeners::ListenerTable;
use crate::memory::{MemoryStore, StoreContents};

struct Snapshot {
    contents: StoreContents,
    label: Option<String>,
}

#[derive(Default)]
struct History {
    snapshots: BTreeMap<Id, Snapshot>,
    backward: Vec<Id>,
    current: Option<Id>,
    forward: Vec<Id>,
    next: u64,
}

impl History {
    fn ids(&self) -> CheckpointIds {
        CheckpointIds::new(self.backward.clone(), self.current.clone(), self.forward.clone())
    }

    fn record(&mut self, contents: StoreContents, label: Option<String>) -> Id {
        let id = self.next.to_string();
        self.next += 1;
        self.snapshots.insert(id.clone(), Snapshot { contents, label });
        self.current = Some(id.clone());
        id
    }
}

/// Checkpoints of one [`MemoryStore`].
pub struct MemoryCheckpoints {
    store: Rc<MemoryStore>,
    history: RefCell<History>,
    listeners: ListenerTable,
    log: CallLog,
    store_listeners: RefCell<Vec<ListenerId>>,
    restoring: Cell<bool>,
    destroyed: Cell<bool>,
}

impl MemoryCheckpoints {
    /// Start tracking `store`, with its current contents as checkpoint `"0"`.
    #[must_use]
    pub fn new(store: Rc<MemoryStore>) -> Rc<Self> {
        let checkpoints = Rc::new_cyclic(|weak: &Weak<Self>| {
            let mut history = History::default();
            history.record(store.contents(), None);
            Self {
                store: Rc::clone(&store),
                history: RefCell::new(history),
                listeners: ListenerTable::new(),
                log: CallLog::default(),
                store_listeners: RefCell::new(Vec::new()),
                restoring: Cell::new(false),
                destroyed: Cell::new(false),
            }
            .watching(weak)
        });
        tracing::debug!("checkpoints created");
        checkpoints
    }

    fn watching(self, weak: &Weak<Self>) -> Self {
        let ids: Vec<ListenerId> = [TABLES, VALUES]
            .into_iter()
            .filter_map(|aspect| {
                let weak = Weak::clone(weak);
                let listener: Listener = Rc::new(move |_: &[Arg]| {
                    if let Some(checkpoints) = weak.upgrade() {
                        checkpoints.store_changed();
                    }
                });
                self.store.add_listener(Read::Get(aspect), &[], listener)
            })
            .collect();
        *self.store_listeners.borrow_mut() = ids;
        self
    }

    /// The tracked store.
    #[must_use]
    pub fn store(&self) -> &Rc<MemoryStore> {
        &self.store
    }

    /// Backward ids, current id and forward ids.
    #[must_use]
    pub fn ids(&self) -> CheckpointIds {
        self.history.borrow().ids()
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
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn store_changed(&self) {
        if self.restoring.get() {
            return;
        }
        let moved = {
            let mut history = self.history.borrow_mut();
            let contents = self.store.contents();
            match history.current.take() {
                Some(current)
                    if history
                        .snapshots
                        .get(&current)
                        .is_some_and(|snapshot| snapshot.contents == contents) =>
                {
                    history.current = Some(current);
                    false
                }
                Some(current) => {
                    history.backward.push(current);
                    history.forward.clear();
                    true
                }
                None => false,
            }
        };
        if moved {
            self.notify_ids();
        }
    }

    fn add_checkpoint(&self, label: Option<String>) -> Value {
        let id = {
            let mut history = self.history.borrow_mut();
            match history.current.clone() {
                Some(current) => {
                    if label.is_some() {
                        if let Some(snapshot) = history.snapshots.get_mut(&current) {
                            snapshot.label = label;
                        }
                    }
                    return Value::Text(current);
                }
                None => history.record(self.store.contents(), label),
            }
        };
        self.notify_ids();
        Value::Text(id)
    }

    fn go_backward(&self) -> bool {
        if self.history.borrow().current.is_none() {
            self.add_checkpoint(None);
        }
        let target = {
            let mut history = self.history.borrow_mut();
            let Some(previous) = history.backward.pop() else {
                return false;
            };
            if let Some(current) = history.current.replace(previous.clone()) {
                history.forward.insert(0, current);
            }
            previous
        };
        self.restore(&target);
        true
    }

    fn go_forward(&self) -> bool {
        let target = {
            let mut history = self.history.borrow_mut();
            if history.forward.is_empty() || history.current.is_none() {
                return false;
            }
            let next = history.forward.remove(0);
            if let Some(current) = history.current.replace(next.clone()) {
                history.backward.push(current);
            }
            next
        };
        self.restore(&target);
        true
    }

    fn go_to(&self, id: &str) -> bool {
        let (behind, ahead) = {
            let history = self.history.borrow();
            (
                history.backward.iter().any(|b| b == id),
                history.forward.iter().any(|f| f == id),
            )
        };
        let step: fn(&Self) -> bool = if behind {
            Self::go_backward
        } else if ahead {
            Self::go_forward
        } else {
            return self.history.borrow().current.as_deref() == Some(id);
        };
        while self.history.borrow().current.as_deref() != Some(id) {
            if !step(self) {
                return false;
            }
        }
        true
    }

    fn restore(&self, id: &Id) {
        let contents = self.history.borrow().snapshots.get(id).map(|s| s.contents.clone());
        if let Some(contents) = contents {
            self.restoring.set(true);
            self.store.restore(contents);
            self.restoring.set(false);
        }
        self.notify_ids();
    }

    fn notify_ids(&self) {
        self.listeners.notify(Read::Get(CHECKPOINT_IDS), &[]);
    }
}

impl Listenable for MemoryCheckpoints {
    fn family(&self) -> Family {
        Family::Checkpoints
    }

    fn read(&self, read: Read, args: &[Arg]) -> Value {
        let history = self.history.borrow();
        match read {
            Read::Get(CHECKPOINT_IDS) => Value::Checkpoints(history.ids()),
            Read::Get(CHECKPOINT) => args
                .first()
                .and_then(Arg::as_id)
                .and_then(|id| history.snapshots.get(id))
                .and_then(|snapshot| snapshot.label.clone())
                .map_or(Value::Absent, Value::Text),
            _ => Value::Absent,
        }
    }

    fn add_listener(&self, read: Read, args: &[Arg], listener: Listener) -> Option<ListenerId> {
        match read {
            Read::Get(CHECKPOINT_IDS | CHECKPOINT) if !self.destroyed.get() => {
                self.log.record(read.listener_name(), args, Value::Absent);
                Some(self.listeners.add(read, args, listener))
            }
            _ => None,
        }
    }

    fn del_listener(&self, id: ListenerId) {
        self.log.record("delListener", &[], Value::Absent);
        self.listeners.remove(id);
    }

    fn set(&self, aspect: Aspect, args: &[Arg], value: Value) -> Value {
        self.log.record(aspect.setter_name(), args, value.clone());
        let (CHECKPOINT, Some(id), Value::Text(label)) =
            (aspect, args.first().and_then(Arg::as_id), &value)
        else {
            return Value::Bool(false);
        };
        let labelled = match self.history.borrow_mut().snapshots.get_mut(id) {
            Some(snapshot) => {
                snapshot.label = Some(label.clone());
                true
            }
            None => false,
        };
        if labelled {
            self.listeners.notify(Read::Get(CHECKPOINT), &args![id]);
        }
        Value::Bool(labelled)
    }

    fn command(&self, command: Command, args: &[Arg]) -> Value {
        self.log.record(command.method_name(), args, Value::Absent);
        if self.destroyed.get() {
            return Value::Absent;
        }
        match command {
            Command::AddCheckpoint => {
                let label = args.first().and_then(Arg::as_id).map(str::to_owned);
                self.add_checkpoint(label)
            }
            Command::GoBackward => Value::Bool(self.go_backward()),
            Command::GoForward => Value::Bool(self.go_forward()),
            Command::GoTo => match args.first().and_then(Arg::as_id) {
                Some(id) => Value::Bool(self.go_to(id)),
                None => Value::Bool(false),
            },
            other => {
                tracing::debug!(command = %other, "not a checkpoints command");
                Value::Absent
            }
        }
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.log.record("destroy", &[], Value::Absent);
        for id in self.store_listeners.borrow_mut().drain(..) {
            self.store.del_listener(id);
        }
        self.listeners.clear();
    }
}

impl fmt::Debug for MemoryCheckpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCheckpoints")
            .field("ids", &self.ids())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}
