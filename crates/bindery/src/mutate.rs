#![forbid(unsafe_code)]

//! Memoized write callbacks: set, delete and imperative commands.
//!
//! A [`WriteSpec`] describes one write: the operation, how to compute the
//! value from the call parameter, the positional arguments and an optional
//! follow-up. [`use_write_callback`] resolves the target at render time and
//! returns a [`Mutator`] that stays the same `Rc` until its [`MutatorKey`]
//! changes.
//!
//! Positional arguments come in two forms:
//!
//! - [`WriteSpec::arg`] literals are part of the key; changing one yields a
//!   new callback.
//! - [`WriteSpec::arg_with`] functions run on every call and are not part of
//!   the key; only their position is.
//!
//! # Failure Modes
//!
//! - Calling a mutator whose target did not resolve does nothing and
//!   returns `None`.
//! - A value function returning `None` stops the write; no argument function
//!   and no follow-up runs.
//! - Panics inside supplied functions propagate to the caller of
//!   [`Mutator::call`].
//! - Writing an aspect the catalog marks read-only is logged at `warn`; the
//!   call is still forwarded to the source.

use std::fmt;
use std::rc::Rc;

use bindery_core::{
    Arg, Aspect, Command, DispatchTable, Family, Listenable, SourceRef, Value,
};
use bindery_runtime::{ByPtr, Cx};

use crate::resolve::{Target, use_source};

/// Computes the value to write. `None` cancels the write.
pub type ValueFn<P> = Rc<dyn Fn(&P, &SourceRef) -> Option<Value>>;

/// Computes one positional argument at call time.
pub type ArgFn<P> = Rc<dyn Fn(&P, &SourceRef) -> Arg>;

/// Follow-up receiving the source's result and the written value.
pub type ThenFn = Rc<dyn Fn(&Value, &Value)>;

/// What a write does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOp {
    Set(Aspect),
    Del(Aspect),
    Command(Command),
}

impl WriteOp {
    /// Family the operation targets.
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            WriteOp::Set(aspect) | WriteOp::Del(aspect) => aspect.family(),
            WriteOp::Command(command) => command.family(),
        }
    }
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Set(aspect) => write!(f, "{}.{}", aspect.family(), aspect.setter_name()),
            WriteOp::Del(aspect) => write!(f, "{}.{}", aspect.family(), aspect.deleter_name()),
            WriteOp::Command(command) => write!(f, "{command}"),
        }
    }
}

/// One positional argument.
pub enum ArgSpec<P> {
    Literal(Arg),
    Computed(ArgFn<P>),
}

impl<P> ArgSpec<P> {
    fn literal(&self) -> Option<Arg> {
        match self {
            ArgSpec::Literal(arg) => Some(arg.clone()),
            ArgSpec::Computed(_) => None,
        }
    }

    fn evaluate(&self, param: &P, source: &SourceRef) -> Arg {
        match self {
            ArgSpec::Literal(arg) => arg.clone(),
            ArgSpec::Computed(f) => f(param, source),
        }
    }
}

impl<P> Clone for ArgSpec<P> {
    fn clone(&self) -> Self {
        match self {
            ArgSpec::Literal(arg) => ArgSpec::Literal(arg.clone()),
            ArgSpec::Computed(f) => ArgSpec::Computed(Rc::clone(f)),
        }
    }
}

impl<P> fmt::Debug for ArgSpec<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgSpec::Literal(arg) => f.debug_tuple("Literal").field(arg).finish(),
            ArgSpec::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// Memo key of a mutator.
#[derive(Clone, Debug, PartialEq)]
pub struct MutatorKey {
    pub source: Option<ByPtr<dyn Listenable>>,
    pub op: WriteOp,
    pub value_deps: Vec<Value>,
    pub then_deps: Vec<Value>,
    /// Literal arguments by position; computed positions are `None`.
    pub args: Vec<Option<Arg>>,
}

// ---------------------------------------------------------------------------
// WriteSpec: builder
// ---------------------------------------------------------------------------

/// Description of one write callback.
pub struct WriteSpec<P> {
    op: WriteOp,
    target: Target,
    value: Option<ValueFn<P>>,
    value_deps: Vec<Value>,
    args: Vec<ArgSpec<P>>,
    then: Option<ThenFn>,
    then_deps: Vec<Value>,
}

impl<P: 'static> WriteSpec<P> {
    fn with_op(op: WriteOp, value: Option<ValueFn<P>>, value_deps: Vec<Value>) -> Self {
        Self {
            op,
            target: Target::Default,
            value,
            value_deps,
            args: Vec::new(),
            then: None,
            then_deps: Vec::new(),
        }
    }

    /// Set `aspect` to the value `f` computes from the call parameter.
    #[must_use]
    pub fn set(
        aspect: Aspect,
        f: impl Fn(&P, &SourceRef) -> Option<Value> + 'static,
        deps: Vec<Value>,
    ) -> Self {
        Self::with_op(WriteOp::Set(aspect), Some(Rc::new(f)), deps)
    }

    /// Delete `aspect`. The call parameter is only seen by argument
    /// functions.
    #[must_use]
    pub fn del(aspect: Aspect) -> Self {
        Self::with_op(WriteOp::Del(aspect), None, Vec::new())
    }

    /// Run an imperative command.
    #[must_use]
    pub fn command(command: Command) -> Self {
        Self::with_op(WriteOp::Command(command), None, Vec::new())
    }

    /// Replace the value dependencies. Useful for commands whose computed
    /// arguments capture render-time data.
    #[must_use]
    pub fn deps(mut self, deps: Vec<Value>) -> Self {
        self.value_deps = deps;
        self
    }

    /// Which instance to write to. Defaults to the scope's default.
    #[must_use]
    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = target.into();
        self
    }

    /// Append a literal positional argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(ArgSpec::Literal(arg.into()));
        self
    }

    /// Append literal positional arguments.
    #[must_use]
    pub fn args(mut self, args: impl IntoIterator<Item = Arg>) -> Self {
        self.args.extend(args.into_iter().map(ArgSpec::Literal));
        self
    }

    /// Append a positional argument computed on every call.
    #[must_use]
    pub fn arg_with(mut self, f: impl Fn(&P, &SourceRef) -> Arg + 'static) -> Self {
        self.args.push(ArgSpec::Computed(Rc::new(f)));
        self
    }

    /// Run `f(result, value)` after each completed write.
    #[must_use]
    pub fn then(mut self, f: impl Fn(&Value, &Value) + 'static, deps: Vec<Value>) -> Self {
        self.then = Some(Rc::new(f));
        self.then_deps = deps;
        self
    }

    /// The operation.
    #[must_use]
    pub fn op(&self) -> WriteOp {
        self.op
    }

    /// Memo key for this write against `source`.
    #[must_use]
    pub fn key(&self, source: Option<&SourceRef>) -> MutatorKey {
        MutatorKey {
            source: ByPtr::opt(source),
            op: self.op,
            value_deps: self.value_deps.clone(),
            then_deps: self.then_deps.clone(),
            args: self.args.iter().map(ArgSpec::literal).collect(),
        }
    }

    /// Bind to `source`.
    #[must_use]
    pub fn build(self, source: Option<SourceRef>) -> Mutator<P> {
        Mutator {
            source,
            op: self.op,
            value: self.value,
            args: self.args,
            then: self.then,
        }
    }

    fn check(&self) {
        let table = DispatchTable::global();
        let checked = match self.op {
            WriteOp::Set(aspect) => table.check_writable(aspect, false),
            WriteOp::Del(aspect) => table.check_writable(aspect, true),
            WriteOp::Command(_) => Ok(()),
        };
        if let Err(err) = checked {
            tracing::warn!(%err, "write callback");
        }
    }
}

impl<P: 'static> WriteSpec<P>
where
    P: Clone + Into<Value>,
{
    /// Set `aspect` to the call parameter itself.
    #[must_use]
    pub fn set_from_param(aspect: Aspect) -> Self {
        Self::set(aspect, |param: &P, _| Some(param.clone().into()), Vec::new())
    }
}

impl<P> fmt::Debug for WriteSpec<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSpec")
            .field("op", &self.op)
            .field("target", &self.target)
            .field("args", &self.args)
            .field("value_deps", &self.value_deps)
            .field("then", &self.then.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Mutator: the callback
// ---------------------------------------------------------------------------

/// A write callback bound to a resolved (or absent) source.
pub struct Mutator<P> {
    source: Option<SourceRef>,
    op: WriteOp,
    value: Option<ValueFn<P>>,
    args: Vec<ArgSpec<P>>,
    then: Option<ThenFn>,
}

impl<P> Mutator<P> {
    /// Perform the write. Returns the source's result, or `None` when there
    /// is no target or the value function declined.
    pub fn call(&self, param: &P) -> Option<Value> {
        let Some(source) = &self.source else {
            tracing::trace!(op = %self.op, "write without target ignored");
            return None;
        };
        let value = match &self.value {
            Some(f) => match f(param, source) {
                Some(value) => value,
                None => {
                    tracing::trace!(op = %self.op, "value function declined write");
                    return None;
                }
            },
            None => Value::Absent,
        };
        let args: Vec<Arg> = self
            .args
            .iter()
            .map(|arg| arg.evaluate(param, source))
            .collect();
        tracing::debug!(op = %self.op, ?args, "write");
        let result = match self.op {
            WriteOp::Set(aspect) => source.set(aspect, &args, value.clone()),
            WriteOp::Del(aspect) => source.del(aspect, &args),
            WriteOp::Command(command) => source.command(command, &args),
        };
        if let Some(then) = &self.then {
            then(&result, &value);
        }
        Some(result)
    }

    /// Whether a target was resolved.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    /// The operation.
    #[must_use]
    pub fn op(&self) -> WriteOp {
        self.op
    }
}

impl Mutator<()> {
    /// Call a parameterless mutator.
    pub fn fire(&self) -> Option<Value> {
        self.call(&())
    }
}

impl<P> fmt::Debug for Mutator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutator")
            .field("op", &self.op)
            .field("bound", &self.source.is_some())
            .field("args", &self.args)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// A memoized callback performing `spec`.
pub fn use_write_callback<P: 'static>(cx: &mut Cx<'_>, spec: WriteSpec<P>) -> Rc<Mutator<P>> {
    let source = use_source(cx, spec.op.family(), &spec.target);
    let key = spec.key(source.as_ref());
    cx.use_memo(key, move |_| {
        spec.check();
        spec.build(source)
    })
}

/// A memoized setter of `aspect` with literal `args`.
pub fn use_set_callback<P: 'static>(
    cx: &mut Cx<'_>,
    target: &Target,
    aspect: Aspect,
    args: &[Arg],
    f: impl Fn(&P, &SourceRef) -> Option<Value> + 'static,
    deps: Vec<Value>,
) -> Rc<Mutator<P>> {
    let spec = WriteSpec::set(aspect, f, deps)
        .target(target.clone())
        .args(args.iter().cloned());
    use_write_callback(cx, spec)
}

/// A memoized deleter of `aspect` with literal `args`.
pub fn use_del_callback(
    cx: &mut Cx<'_>,
    target: &Target,
    aspect: Aspect,
    args: &[Arg],
) -> Rc<Mutator<()>> {
    let spec = WriteSpec::del(aspect)
        .target(target.clone())
        .args(args.iter().cloned());
    use_write_callback(cx, spec)
}

/// A memoized imperative command with literal `args`.
pub fn use_command_callback(
    cx: &mut Cx<'_>,
    target: &Target,
    command: Command,
    args: &[Arg],
) -> Rc<Mutator<()>> {
    let spec = WriteSpec::command(command)
        .target(target.clone())
        .args(args.iter().cloned());
    use_write_callback(cx, spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Stub;
    use bindery_core::aspect::{checkpoints, metrics, store};
    use bindery_core::args;
    use bindery_runtime::Component;
    use std::cell::Cell;

    fn stub() -> (Rc<Stub>, Target) {
        let stub = Stub::new(Family::Store);
        let source: SourceRef = stub.clone();
        (stub, Target::Source(source))
    }

    #[test]
    fn absent_target_is_a_noop() {
        let called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&called);
        let mutator: Mutator<i32> = WriteSpec::set(
            store::CELL,
            move |n: &i32, _| {
                flag.set(true);
                Some(Value::from(*n))
            },
            vec![],
        )
        .build(None);
        assert_eq!(mutator.call(&1), None);
        assert!(!called.get());
        assert!(!mutator.is_bound());
    }

    #[test]
    fn set_evaluates_value_then_args_then_follow_up() {
        let (stub, target) = stub();
        let seen = Rc::new(Cell::new(0.0));
        let sink = Rc::clone(&seen);
        let mutator = WriteSpec::set(store::CELL, |n: &f64, _| Some(Value::from(*n * 2.0)), vec![])
            .target(target)
            .arg("pets")
            .arg_with(|n: &f64, _| Arg::from(format!("row{n}")))
            .arg("legs")
            .then(
                move |result, value| {
                    assert_eq!(*result, Value::Bool(true));
                    sink.set(value.as_f64().unwrap_or_default());
                },
                vec![],
            )
            .build_for_test();
        assert_eq!(mutator.call(&2.0), Some(Value::Bool(true)));
        assert_eq!(seen.get(), 4.0);
        let writes = stub.writes.borrow();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "setCell");
        assert_eq!(writes[0].1, args!["pets", "row2", "legs"]);
        assert_eq!(writes[0].2, Value::Number(4.0));
    }

    #[test]
    fn declined_value_skips_write() {
        let (stub, target) = stub();
        let followed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&followed);
        let mutator = WriteSpec::set(store::VALUE, |_: &(), _| None, vec![])
            .target(target)
            .arg("open")
            .then(move |_, _| flag.set(true), vec![])
            .build_for_test();
        assert_eq!(mutator.fire(), None);
        assert!(stub.writes.borrow().is_empty());
        assert!(!followed.get());
    }

    #[test]
    fn delete_and_command_route_to_source() {
        let (stub, target) = stub();
        WriteSpec::<()>::del(store::ROW)
            .target(target.clone())
            .args(args!["pets", "fido"])
            .build_for_test()
            .fire();
        WriteSpec::<()>::command(Command::StartTransaction)
            .target(target)
            .build_for_test()
            .fire();
        let names: Vec<String> = stub.writes.borrow().iter().map(|w| w.0.clone()).collect();
        assert_eq!(names, vec!["delRow", "startTransaction"]);
    }

    #[test]
    fn key_records_literal_positions() {
        let spec = WriteSpec::<()>::del(store::CELL)
            .arg("t")
            .arg_with(|_, _| Arg::from("r"))
            .arg("c");
        assert_eq!(
            spec.key(None).args,
            vec![Some(Arg::from("t")), None, Some(Arg::from("c"))]
        );
    }

    #[test]
    fn set_from_param_writes_parameter() {
        let (stub, target) = stub();
        WriteSpec::<String>::set_from_param(store::VALUE)
            .target(target)
            .arg("mood")
            .build_for_test()
            .call(&"calm".to_owned());
        assert_eq!(stub.writes.borrow()[0].2, Value::from("calm"));
    }

    #[test]
    fn literal_args_invalidate_memo_computed_do_not() {
        let (_stub, target) = stub();
        let mut c = Component::new("writer");
        let mut render = |row: &'static str, suffix: &'static str| {
            let target = target.clone();
            c.render(move |cx| {
                use_write_callback(
                    cx,
                    WriteSpec::<()>::del(store::ROW)
                        .target(target)
                        .arg(row)
                        .arg_with(move |_, _| Arg::from(suffix)),
                )
            })
            .expect("mounted")
        };
        let first = render("a", "x");
        let same = render("a", "y");
        let changed = render("b", "y");
        assert!(Rc::ptr_eq(&first, &same));
        assert!(!Rc::ptr_eq(&same, &changed));
    }

    #[test]
    fn value_deps_invalidate_memo() {
        let (_stub, target) = stub();
        let mut c = Component::new("setter");
        let mut render = |dep: i32| {
            let target = target.clone();
            c.render(move |cx| {
                use_set_callback(
                    cx,
                    &target,
                    checkpoints::CHECKPOINT,
                    &args!["c1"],
                    move |_: &(), _| Some(Value::from(dep)),
                    vec![Value::from(dep)],
                )
            })
            .expect("mounted")
        };
        let a = render(1);
        let b = render(1);
        let c2 = render(2);
        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&b, &c2));
    }

    #[test]
    fn unresolved_target_callback_does_nothing() {
        let mut c = Component::new("orphan");
        let mutator = c
            .render(|cx| use_del_callback(cx, &Target::from("missing"), store::TABLE, &args!["t"]))
            .expect("mounted");
        assert!(!mutator.is_bound());
        assert_eq!(mutator.fire(), None);
    }

    #[test]
    fn read_only_aspect_still_forwards() {
        let (stub, target) = stub();
        let mut c = Component::new("metric");
        let mutator = c
            .render(|cx| use_del_callback(cx, &target, metrics::METRIC, &args!["m"]))
            .expect("mounted");
        assert_eq!(mutator.fire(), Some(Value::Bool(true)));
        assert_eq!(stub.writes.borrow()[0].0, "delMetric");
    }

    impl<P: 'static> WriteSpec<P> {
        fn build_for_test(self) -> Mutator<P> {
            let source = match &self.target {
                Target::Source(source) => Some(SourceRef::clone(source)),
                _ => None,
            };
            self.build(source)
        }
    }
}
