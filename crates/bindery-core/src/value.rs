#![forbid(unsafe_code)]

//! Values and arguments exchanged with data sources.
//!
//! A [`Value`] is whatever a source getter returns: a scalar, an id list, a
//! nested mapping or a checkpoint triple. An [`Arg`] is one discriminating or
//! positional argument passed to a getter, listener registration or setter.
//!
//! # Invariants
//!
//! 1. `Value::Absent` is the single "no value" marker; getters never signal
//!    absence any other way.
//! 2. `Arg::Absent` inside a listener registration matches any concrete
//!    argument at that position (wildcard).

use std::collections::BTreeMap;

/// Identifier of a table, row, cell, metric, index, slice, query, checkpoint
/// or named source.
pub type Id = String;

/// A value read from, or written to, a data source.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// No value.
    #[default]
    Absent,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar.
    Number(f64),
    /// String scalar.
    Text(String),
    /// Ordered sequence (typically ids).
    List(Vec<Value>),
    /// Keyed mapping, possibly nested.
    Map(BTreeMap<Id, Value>),
    /// Backward ids, current id, forward ids.
    Checkpoints(CheckpointIds),
}

impl Value {
    /// Whether this is the absence marker.
    #[inline]
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric payload, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Sequence payload, if any.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Mapping payload, if any.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<Id, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Checkpoint payload, if any.
    #[must_use]
    pub fn as_checkpoints(&self) -> Option<&CheckpointIds> {
        match self {
            Value::Checkpoints(ids) => Some(ids),
            _ => None,
        }
    }

    /// The string elements of a sequence, skipping anything that is not text.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.as_list()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Build a sequence of text ids.
    pub fn id_list<I, S>(ids: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(ids.into_iter().map(|id| Value::Text(id.into())).collect())
    }

    /// Build a mapping from key/value pairs.
    pub fn map<I, K, V>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Id>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<Id, Value>> for Value {
    fn from(map: BTreeMap<Id, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<CheckpointIds> for Value {
    fn from(ids: CheckpointIds) -> Self {
        Value::Checkpoints(ids)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Absent, Into::into)
    }
}

/// Checkpoint history: ids behind the current one, the current id, and ids
/// ahead of it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckpointIds {
    /// Checkpoints that can be gone back to, oldest first.
    pub backward: Vec<Id>,
    /// The current checkpoint, absent when there are uncheckpointed changes.
    pub current: Option<Id>,
    /// Checkpoints that can be gone forward to, nearest first.
    pub forward: Vec<Id>,
}

impl CheckpointIds {
    /// Create a checkpoint triple.
    #[must_use]
    pub fn new(backward: Vec<Id>, current: Option<Id>, forward: Vec<Id>) -> Self {
        Self {
            backward,
            current,
            forward,
        }
    }

    /// Whether there is anything to undo.
    #[must_use]
    pub fn can_go_backward(&self) -> bool {
        !self.backward.is_empty()
    }

    /// Whether there is anything to redo.
    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }
}

/// One discriminating or positional argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arg {
    /// Unspecified; a wildcard in listener registrations.
    Absent,
    /// An id.
    Id(Id),
    /// A boolean flag (e.g. descending order).
    Flag(bool),
    /// An index or count (e.g. offset, limit).
    Index(usize),
}

impl Arg {
    /// Id payload, if any.
    #[must_use]
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Arg::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Whether this registration argument matches a concrete argument.
    #[must_use]
    pub fn matches(&self, concrete: &Arg) -> bool {
        matches!(self, Arg::Absent) || self == concrete
    }
}

impl From<&str> for Arg {
    fn from(id: &str) -> Self {
        Arg::Id(id.to_owned())
    }
}

impl From<String> for Arg {
    fn from(id: String) -> Self {
        Arg::Id(id)
    }
}

impl From<&String> for Arg {
    fn from(id: &String) -> Self {
        Arg::Id(id.clone())
    }
}

impl From<bool> for Arg {
    fn from(flag: bool) -> Self {
        Arg::Flag(flag)
    }
}

impl From<usize> for Arg {
    fn from(index: usize) -> Self {
        Arg::Index(index)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(arg: Option<T>) -> Self {
        arg.map_or(Arg::Absent, Into::into)
    }
}

/// Build a `Vec<Arg>` from heterogeneous argument expressions.
///
/// # Examples
///
/// ```
/// use bindery_core::{Arg, args};
///
/// let a = args!["pets", "fido", true, 3usize];
/// assert_eq!(a[0], Arg::Id("pets".into()));
/// assert_eq!(a[2], Arg::Flag(true));
/// assert_eq!(a[3], Arg::Index(3));
/// assert!(args![].is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::value::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::value::Arg::from($arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_is_default() {
        assert!(Value::default().is_absent());
        assert!(!Value::Bool(false).is_absent());
    }

    #[test]
    fn accessors_match_variants() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::from("brown").as_str(), Some("brown"));
        assert_eq!(Value::from("brown").as_f64(), None);
        assert!(Value::id_list(["a"]).as_list().is_some());
        assert!(Value::map([("x", 1)]).as_map().is_some());
    }

    #[test]
    fn id_list_round_trips_ids() {
        let ids = Value::id_list(["fido", "felix"]);
        assert_eq!(ids.ids(), vec!["fido", "felix"]);
        assert!(Value::Absent.ids().is_empty());
    }

    #[test]
    fn option_conversions() {
        assert_eq!(Value::from(None::<&str>), Value::Absent);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
        assert_eq!(Arg::from(None::<&str>), Arg::Absent);
        assert_eq!(Arg::from(Some("t")), Arg::Id("t".into()));
    }

    #[test]
    fn wildcard_matching() {
        let concrete = Arg::from("pets");
        assert!(Arg::Absent.matches(&concrete));
        assert!(Arg::from("pets").matches(&concrete));
        assert!(!Arg::from("toys").matches(&concrete));
        assert!(!concrete.matches(&Arg::Absent));
    }

    #[test]
    fn checkpoint_navigation_flags() {
        let ids = CheckpointIds::new(vec!["0".into()], Some("1".into()), vec![]);
        assert!(ids.can_go_backward());
        assert!(!ids.can_go_forward());
    }

    #[test]
    fn args_macro_builds_heterogeneous_args() {
        let a = args!["t", false, 10usize, None::<&str>];
        assert_eq!(
            a,
            vec![
                Arg::Id("t".into()),
                Arg::Flag(false),
                Arg::Index(10),
                Arg::Absent
            ]
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_of_nested_map() {
        let v = Value::map([("fido", Value::map([("color", "brown")]))]);
        let json = serde_json::to_string(&v).expect("serialize");
        let back: Value = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, v);
    }
}
