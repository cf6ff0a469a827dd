#![forbid(unsafe_code)]

//! In-memory tabular store implementing the store family.
//!
//! [`MemoryStore`] keeps tables of rows of scalar cells plus a flat set of
//! key/value pairs, answers every store read, and notifies listeners after
//! each effective write (or once when the outermost transaction finishes).
//!
//! # Invariants
//!
//! 1. Cells and values are scalars: `Bool`, `Number` or `Text`.
//! 2. Empty rows and empty tables do not exist; removing the last cell of a
//!    row removes the row, and so on upward.
//! 3. A write that leaves the contents unchanged notifies nobody.
//! 4. Listeners run after every interior borrow has been released.
//!
//! # Failure Modes
//!
//! - Writes with a malformed value (a non-scalar cell, a row that is not a
//!   map of scalars) change nothing and return `Bool(false)`.
//! - Writes after [`Listenable::destroy`] are rejected the same way.
//! - Listener notifications are coarse: a listener may be called when the
//!   value it observes did not change. Bindings compare by shape, so this
//!   never causes a spurious re-render.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use bindery_core::aspect::store::{
    CELL, CELL_IDS, PARTIAL_ROW, PARTIAL_VALUES, ROW, ROW_COUNT, ROW_IDS, SORTED_ROW_IDS, TABLE,
    TABLE_CELL, TABLE_CELL_IDS, TABLE_IDS, TABLES, VALUE, VALUE_IDS, VALUES,
};
use bindery_core::{
    Arg, Aspect, Command, Family, Id, Listenable, Listener, ListenerId, Read, SourceRef, Value,
    args,
};

use crate::calls::{Call, CallLog};
use crate::json;
use crate::listeners::ListenerTable;

type Row = BTreeMap<Id, Value>;
type Table = BTreeMap<Id, Row>;

// ---------------------------------------------------------------------------
// Contents
// ---------------------------------------------------------------------------

/// Plain store data: tables and values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoreContents {
    tables: BTreeMap<Id, Table>,
    values: BTreeMap<Id, Value>,
}

/// One changed cell or value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Change {
    Cell { table: Id, row: Id, cell: Id },
    Value(Id),
}

impl StoreContents {
    /// Load contents from `{"tables": {...}, "values": {...}}`. Entries of
    /// the wrong shape are skipped.
    #[must_use]
    pub fn from_json(doc: &serde_json::Value) -> Self {
        let mut contents = Self::default();
        if let Some(tables) = doc.get("tables") {
            match as_tables(&json::from_json(tables)) {
                Some(tables) => contents.tables = tables,
                None => tracing::warn!("fixture tables are not maps of rows of scalars; skipped"),
            }
        }
        if let Some(values) = doc.get("values") {
            match as_row(&json::from_json(values)) {
                Some(values) => contents.values = values,
                None => tracing::warn!("fixture values are not a map of scalars; skipped"),
            }
        }
        contents.prune();
        contents
    }

    /// Contents as `{"tables": {...}, "values": {...}}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "tables": json::to_json(&tables_value(&self.tables)),
            "values": json::to_json(&Value::Map(self.values.clone())),
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.values.is_empty()
    }

    fn table(&self, id: Option<&str>) -> Option<&Table> {
        self.tables.get(id?)
    }

    fn row(&self, table: Option<&str>, row: Option<&str>) -> Option<&Row> {
        self.table(table)?.get(row?)
    }

    fn get(&self, aspect: Aspect, args: &[Arg]) -> Value {
        let id = |i: usize| args.get(i).and_then(Arg::as_id);
        match aspect {
            TABLES => tables_value(&self.tables),
            TABLE_IDS => Value::id_list(self.tables.keys()),
            TABLE => self.table(id(0)).map_or(Value::Absent, table_value),
            TABLE_CELL_IDS => self.table(id(0)).map_or(Value::Absent, |table| {
                let ids: BTreeSet<&Id> = table.values().flat_map(BTreeMap::keys).collect();
                Value::id_list(ids)
            }),
            ROW_COUNT => Value::from(self.table(id(0)).map_or(0, BTreeMap::len)),
            ROW_IDS => self
                .table(id(0))
                .map_or(Value::Absent, |table| Value::id_list(table.keys())),
            SORTED_ROW_IDS => self
                .table(id(0))
                .map_or(Value::Absent, |table| sorted_row_ids(table, args)),
            ROW => self
                .row(id(0), id(1))
                .map_or(Value::Absent, |row| Value::Map(row.clone())),
            CELL_IDS => self
                .row(id(0), id(1))
                .map_or(Value::Absent, |row| Value::id_list(row.keys())),
            CELL => self
                .row(id(0), id(1))
                .and_then(|row| row.get(id(2)?))
                .cloned()
                .unwrap_or_default(),
            VALUES => Value::Map(self.values.clone()),
            VALUE_IDS => Value::id_list(self.values.keys()),
            VALUE => id(0)
                .and_then(|value| self.values.get(value))
                .cloned()
                .unwrap_or_default(),
            _ => Value::Absent,
        }
    }

    fn has(&self, aspect: Aspect, args: &[Arg]) -> bool {
        let id = |i: usize| args.get(i).and_then(Arg::as_id);
        match aspect {
            TABLES => !self.tables.is_empty(),
            TABLE => self.table(id(0)).is_some(),
            TABLE_CELL => match (self.table(id(0)), id(1)) {
                (Some(table), Some(cell)) => table.values().any(|row| row.contains_key(cell)),
                _ => false,
            },
            ROW => self.row(id(0), id(1)).is_some(),
            CELL => self
                .row(id(0), id(1))
                .zip(id(2))
                .is_some_and(|(row, cell)| row.contains_key(cell)),
            VALUES => !self.values.is_empty(),
            VALUE => id(0).is_some_and(|value| self.values.contains_key(value)),
            _ => false,
        }
    }

    /// Apply a set. Returns `false` when the arguments or value are
    /// malformed.
    fn set(&mut self, aspect: Aspect, args: &[Arg], value: &Value) -> bool {
        let id = |i: usize| args.get(i).and_then(Arg::as_id).map(str::to_owned);
        let applied = match aspect {
            TABLES => as_tables(value).map(|tables| self.tables = tables).is_some(),
            TABLE => match (id(0), as_table(value)) {
                (Some(table_id), Some(table)) => {
                    self.tables.insert(table_id, table);
                    true
                }
                _ => false,
            },
            ROW => match (id(0), id(1), as_row(value)) {
                (Some(table), Some(row_id), Some(row)) => {
                    self.tables.entry(table).or_default().insert(row_id, row);
                    true
                }
                _ => false,
            },
            PARTIAL_ROW => match (id(0), id(1), as_row(value)) {
                (Some(table), Some(row_id), Some(cells)) => {
                    self.tables
                        .entry(table)
                        .or_default()
                        .entry(row_id)
                        .or_default()
                        .extend(cells);
                    true
                }
                _ => false,
            },
            CELL => match (id(0), id(1), id(2)) {
                (Some(table), Some(row), Some(cell)) if is_scalar(value) => {
                    self.tables
                        .entry(table)
                        .or_default()
                        .entry(row)
                        .or_default()
                        .insert(cell, value.clone());
                    true
                }
                _ => false,
            },
            VALUES => as_row(value).map(|values| self.values = values).is_some(),
            PARTIAL_VALUES => as_row(value).map(|values| self.values.extend(values)).is_some(),
            VALUE => match id(0) {
                Some(key) if is_scalar(value) => {
                    self.values.insert(key, value.clone());
                    true
                }
                _ => false,
            },
            _ => false,
        };
        self.prune();
        applied
    }

    /// Apply a delete. Deleting something missing is not an error.
    fn del(&mut self, aspect: Aspect, args: &[Arg]) -> bool {
        let id = |i: usize| args.get(i).and_then(Arg::as_id);
        let applied = match aspect {
            TABLES => {
                self.tables.clear();
                true
            }
            TABLE => id(0).map(|table| self.tables.remove(table)).is_some(),
            ROW => match (id(0), id(1)) {
                (Some(table), Some(row)) => {
                    if let Some(table) = self.tables.get_mut(table) {
                        table.remove(row);
                    }
                    true
                }
                _ => false,
            },
            CELL => match (id(0), id(1), id(2)) {
                (Some(table), Some(row), Some(cell)) => {
                    if let Some(row) = self.tables.get_mut(table).and_then(|t| t.get_mut(row)) {
                        row.remove(cell);
                    }
                    true
                }
                _ => false,
            },
            VALUES => {
                self.values.clear();
                true
            }
            VALUE => id(0).map(|value| self.values.remove(value)).is_some(),
            _ => false,
        };
        self.prune();
        applied
    }

    fn prune(&mut self) {
        for table in self.tables.values_mut() {
            table.retain(|_, row| !row.is_empty());
        }
        self.tables.retain(|_, table| !table.is_empty());
    }

    /// Every cell or value that differs between `self` and `other`.
    fn diff(&self, other: &StoreContents) -> BTreeSet<Change> {
        let mut changes = BTreeSet::new();
        let mut cells = |from: &StoreContents, to: &StoreContents| {
            for (table_id, table) in &from.tables {
                for (row_id, row) in table {
                    for (cell_id, value) in row {
                        let other = to
                            .tables
                            .get(table_id)
                            .and_then(|t| t.get(row_id))
                            .and_then(|r| r.get(cell_id));
                        if other != Some(value) {
                            changes.insert(Change::Cell {
                                table: table_id.clone(),
                                row: row_id.clone(),
                                cell: cell_id.clone(),
                            });
                        }
                    }
                }
            }
            for (key, value) in &from.values {
                if to.values.get(key) != Some(value) {
                    changes.insert(Change::Value(key.clone()));
                }
            }
        };
        cells(self, other);
        cells(other, self);
        changes
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::Text(_))
}

fn as_row(value: &Value) -> Option<Row> {
    let map = value.as_map()?;
    map.values().all(is_scalar).then(|| map.clone())
}

fn as_table(value: &Value) -> Option<Table> {
    value
        .as_map()?
        .iter()
        .map(|(id, row)| Some((id.clone(), as_row(row)?)))
        .collect()
}

fn as_tables(value: &Value) -> Option<BTreeMap<Id, Table>> {
    value
        .as_map()?
        .iter()
        .map(|(id, table)| Some((id.clone(), as_table(table)?)))
        .collect()
}

fn table_value(table: &Table) -> Value {
    Value::Map(
        table
            .iter()
            .map(|(id, row)| (id.clone(), Value::Map(row.clone())))
            .collect(),
    )
}

fn tables_value(tables: &BTreeMap<Id, Table>) -> Value {
    Value::Map(
        tables
            .iter()
            .map(|(id, table)| (id.clone(), table_value(table)))
            .collect(),
    )
}

/// Rank used to order mixed cell types: missing, bool, number, text.
fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Absent) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::Text(_)) => 3,
        Some(_) => 4,
    }
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x.total_cmp(y),
        (Some(Value::Text(x)), Some(Value::Text(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Row ids of `table` ordered by the cell in `args[1]` (row id when
/// absent), reversed when `args[2]` is `true`, then paged by `args[3]`
/// (offset) and `args[4]` (limit).
fn sorted_row_ids(table: &Table, args: &[Arg]) -> Value {
    let cell = args.get(1).and_then(Arg::as_id);
    let descending = matches!(args.get(2), Some(Arg::Flag(true)));
    let offset = match args.get(3) {
        Some(Arg::Index(offset)) => *offset,
        _ => 0,
    };
    let limit = match args.get(4) {
        Some(Arg::Index(limit)) => *limit,
        _ => usize::MAX,
    };
    let mut rows: Vec<(&Id, Option<&Value>)> = table
        .iter()
        .map(|(id, row)| (id, cell.and_then(|cell| row.get(cell))))
        .collect();
    rows.sort_by(|a, b| {
        let ordering = compare_cells(a.1, b.1).then_with(|| a.0.cmp(b.0));
        if descending { ordering.reverse() } else { ordering }
    });
    Value::id_list(rows.into_iter().skip(offset).take(limit).map(|(id, _)| id))
}

/// The reads a change may affect, with the concrete arguments listeners
/// are called with.
fn affected(change: &Change, out: &mut BTreeSet<(Read, Vec<Arg>)>) {
    let both = |aspect: Aspect, args: Vec<Arg>, out: &mut BTreeSet<(Read, Vec<Arg>)>| {
        out.insert((Read::Get(aspect), args.clone()));
        out.insert((Read::Has(aspect), args));
    };
    match change {
        Change::Cell { table, row, cell } => {
            both(CELL, args![table, row, cell], out);
            both(ROW, args![table, row], out);
            out.insert((Read::Get(CELL_IDS), args![table, row]));
            both(TABLE, args![table], out);
            out.insert((Read::Has(TABLE_CELL), args![table, cell]));
            for aspect in [TABLE_CELL_IDS, ROW_COUNT, ROW_IDS, SORTED_ROW_IDS] {
                out.insert((Read::Get(aspect), args![table]));
            }
            both(TABLES, args![], out);
            out.insert((Read::Get(TABLE_IDS), args![]));
        }
        Change::Value(value) => {
            both(VALUE, args![value], out);
            both(VALUES, args![], out);
            out.insert((Read::Get(VALUE_IDS), args![]));
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// A store held entirely in memory.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use bindery_core::aspect::store::CELL;
/// use bindery_core::{Listenable, Read, Value, args};
/// use bindery_harness::MemoryStore;
///
/// let store = Rc::new(MemoryStore::new().with_cell("pets", "fido", "color", "brown"));
/// assert_eq!(store.read(Read::Get(CELL), &args!["pets", "fido", "color"]), Value::from("brown"));
/// assert!(store.set_cell("pets", "fido", "color", "walnut"));
/// assert_eq!(store.cell("pets", "fido", "color"), Value::from("walnut"));
/// ```
#[derive(Default)]
pub struct MemoryStore {
    contents: RefCell<StoreContents>,
    listeners: ListenerTable,
    log: CallLog,
    transactions: Cell<u32>,
    pending: RefCell<BTreeSet<Change>>,
    destroyed: Cell<bool>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding `contents`.
    #[must_use]
    pub fn with_contents(contents: StoreContents) -> Self {
        Self {
            contents: RefCell::new(contents),
            ..Self::default()
        }
    }

    /// A store loaded from a JSON fixture; see [`StoreContents::from_json`].
    #[must_use]
    pub fn from_json(doc: &serde_json::Value) -> Self {
        Self::with_contents(StoreContents::from_json(doc))
    }

    /// Builder: add a cell before the store is shared.
    #[must_use]
    pub fn with_cell(self, table: &str, row: &str, cell: &str, value: impl Into<Value>) -> Self {
        self.contents
            .borrow_mut()
            .set(CELL, &args![table, row, cell], &value.into());
        self
    }

    /// Builder: add a value before the store is shared.
    #[must_use]
    pub fn with_value(self, key: &str, value: impl Into<Value>) -> Self {
        self.contents
            .borrow_mut()
            .set(VALUE, &args![key], &value.into());
        self
    }

    /// Wrap in an `Rc` and return it along with a [`SourceRef`] to the same
    /// instance.
    #[must_use]
    pub fn shared(self) -> (Rc<Self>, SourceRef) {
        let store = Rc::new(self);
        let source: SourceRef = store.clone();
        (store, source)
    }

    // -- convenience writes --------------------------------------------------

    pub fn set_cell(&self, table: &str, row: &str, cell: &str, value: impl Into<Value>) -> bool {
        self.set(CELL, &args![table, row, cell], value.into()) == Value::Bool(true)
    }

    pub fn set_row(&self, table: &str, row: &str, cells: Value) -> bool {
        self.set(ROW, &args![table, row], cells) == Value::Bool(true)
    }

    pub fn del_row(&self, table: &str, row: &str) -> bool {
        self.del(ROW, &args![table, row]) == Value::Bool(true)
    }

    pub fn set_value(&self, key: &str, value: impl Into<Value>) -> bool {
        self.set(VALUE, &args![key], value.into()) == Value::Bool(true)
    }

    /// Run `f` inside a transaction; listeners hear about its writes once,
    /// when it returns.
    pub fn transaction<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        self.command(Command::StartTransaction, &[]);
        let result = f(self);
        self.command(Command::FinishTransaction, &[]);
        result
    }

    // -- inspection ----------------------------------------------------------

    #[must_use]
    pub fn cell(&self, table: &str, row: &str, cell: &str) -> Value {
        self.read(Read::Get(CELL), &args![table, row, cell])
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn contents(&self) -> StoreContents {
        self.contents.borrow().clone()
    }

    /// Current contents as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.contents.borrow().to_json()
    }

    /// Replace the contents wholesale, notifying for everything that
    /// changed.
    pub fn restore(&self, contents: StoreContents) {
        self.log.record("restore", &[], Value::Absent);
        self.apply(|current| {
            *current = contents;
            true
        });
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners registered for `read`, regardless of arguments.
    #[must_use]
    pub fn listeners_for(&self, read: Read) -> usize {
        self.listeners.count_for(read)
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.log.calls()
    }

    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.log.count(method)
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.transactions.get() > 0
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    // -- internals -----------------------------------------------------------

    /// Apply a mutation, queue what changed, and notify unless a transaction
    /// is open.
    fn apply(&self, mutate: impl FnOnce(&mut StoreContents) -> bool) -> Value {
        if self.destroyed.get() {
            tracing::warn!("write to a destroyed store ignored");
            return Value::Bool(false);
        }
        let changes = {
            let mut contents = self.contents.borrow_mut();
            let before = contents.clone();
            if !mutate(&mut contents) {
                *contents = before;
                return Value::Bool(false);
            }
            before.diff(&contents)
        };
        self.pending.borrow_mut().extend(changes);
        if !self.in_transaction() {
            self.flush();
        }
        Value::Bool(true)
    }

    fn flush(&self) {
        let changes = std::mem::take(&mut *self.pending.borrow_mut());
        if changes.is_empty() {
            return;
        }
        let mut reads = BTreeSet::new();
        for change in &changes {
            affected(change, &mut reads);
        }
        let mut called = 0;
        for (read, args) in &reads {
            called += self.listeners.notify(*read, args);
        }
        tracing::trace!(changes = changes.len(), listeners = called, "store changed");
    }
}

impl Listenable for MemoryStore {
    fn family(&self) -> Family {
        Family::Store
    }

    fn read(&self, read: Read, args: &[Arg]) -> Value {
        let contents = self.contents.borrow();
        match read {
            Read::Get(aspect) => contents.get(aspect, args),
            Read::Has(aspect) => Value::Bool(contents.has(aspect, args)),
        }
    }

    fn add_listener(&self, read: Read, args: &[Arg], listener: Listener) -> Option<ListenerId> {
        if read.aspect().family() != Family::Store || self.destroyed.get() {
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
        self.log.record(aspect.setter_name(), args, value.clone());
        self.apply(|contents| contents.set(aspect, args, &value))
    }

    fn del(&self, aspect: Aspect, args: &[Arg]) -> Value {
        self.log.record(aspect.deleter_name(), args, Value::Absent);
        self.apply(|contents| contents.del(aspect, args))
    }

    fn command(&self, command: Command, args: &[Arg]) -> Value {
        self.log.record(command.method_name(), args, Value::Absent);
        match command {
            Command::StartTransaction => {
                self.transactions.set(self.transactions.get() + 1);
                Value::Bool(true)
            }
            Command::FinishTransaction => {
                let Some(depth) = self.transactions.get().checked_sub(1) else {
                    tracing::warn!("finishTransaction without an open transaction");
                    return Value::Bool(false);
                };
                self.transactions.set(depth);
                if depth == 0 {
                    self.flush();
                }
                Value::Bool(true)
            }
            other => {
                tracing::debug!(command = %other, "not a store command");
                Value::Absent
            }
        }
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.log.record("destroy", &[], Value::Absent);
        self.listeners.clear();
        self.pending.borrow_mut().clear();
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contents = self.contents.borrow();
        f.debug_struct("MemoryStore")
            .field("tables", &contents.tables.len())
            .field("values", &contents.values.len())
            .field("listeners", &self.listeners.len())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}
