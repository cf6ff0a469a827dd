#![forbid(unsafe_code)]

//! Creation and destruction of derived objects owned by a component.
//!
//! A [`Lifecycle`] tracks one owned instance through
//!
//! ```text
//! Uninitialized -> Creating -> Ready -> Recreating -> Creating -> ...
//!                                    \-> Destroying -> Destroyed
//! ```
//!
//! Every creation attempt gets a [`Ticket`] stamped with the current
//! generation. Starting a new attempt, releasing or destroying bumps the
//! generation, so a result that arrives for an older ticket is stale: it is
//! destroyed on arrival instead of being installed.
//!
//! # Invariants
//!
//! 1. At most one instance is current; the previous one is destroyed before
//!    a replacement is attempted.
//! 2. An instance handed to [`Lifecycle::complete`] is either installed or
//!    destroyed, never leaked.
//! 3. After [`Lifecycle::destroy`] nothing is installed again.
//!
//! # Failure Modes
//!
//! - A creation error leaves the state `Uninitialized` with the error in
//!   [`Lifecycle::last_error`]. It is not retried.
//! - A configuration error leaves the instance installed but unconfigured.
//!   Until configuration ends either way, the instance is not current.
//! - Without a local executor, asynchronous creation fails with
//!   [`BindError::NoExecutor`].

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use bindery_core::{BindError, Family, Listenable, SourceRef, Value};
use bindery_runtime::{ByPtr, Cleanup, Cx, Invalidator, LocalSpawner};
use futures::task::LocalSpawnExt;

/// Where an owned instance is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Creating,
    Ready,
    Recreating,
    Destroying,
    Destroyed,
}

/// Generation stamp of one creation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    /// Generation this ticket was issued for.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

struct LifecycleInner {
    state: LifecycleState,
    generation: u64,
    current: Option<SourceRef>,
    configured: bool,
    last_error: Option<BindError>,
}

/// Owner of at most one derived instance.
pub struct Lifecycle {
    family: Family,
    inner: RefCell<LifecycleInner>,
}

impl Lifecycle {
    /// Nothing created yet.
    #[must_use]
    pub fn new(family: Family) -> Self {
        Self {
            family,
            inner: RefCell::new(LifecycleInner {
                state: LifecycleState::Uninitialized,
                generation: 0,
                current: None,
                configured: false,
                last_error: None,
            }),
        }
    }

    /// Start a creation attempt, destroying the current instance first.
    pub fn begin(&self) -> Ticket {
        let (ticket, previous) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == LifecycleState::Destroyed {
                tracing::warn!(family = %self.family, "creation attempt after destroy");
            }
            inner.generation += 1;
            inner.configured = false;
            inner.last_error = None;
            let previous = inner.current.take();
            inner.state = if previous.is_some() {
                LifecycleState::Recreating
            } else {
                LifecycleState::Creating
            };
            (Ticket(inner.generation), previous)
        };
        if let Some(previous) = previous {
            tracing::debug!(family = %self.family, "destroying previous instance");
            previous.destroy();
        }
        let mut inner = self.inner.borrow_mut();
        if inner.generation == ticket.0 {
            inner.state = LifecycleState::Creating;
        }
        tracing::trace!(family = %self.family, generation = ticket.0, "creation started");
        ticket
    }

    /// Whether `ticket` belongs to the latest attempt.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        let inner = self.inner.borrow();
        inner.generation == ticket.0 && inner.state != LifecycleState::Destroyed
    }

    /// Install `instance` if `ticket` is current; otherwise destroy it.
    /// Returns whether it was installed.
    pub fn complete(&self, ticket: Ticket, instance: SourceRef) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                family = %self.family,
                generation = ticket.0,
                "discarding stale instance"
            );
            instance.destroy();
            return false;
        }
        let mut inner = self.inner.borrow_mut();
        inner.current = Some(instance);
        inner.state = LifecycleState::Ready;
        tracing::debug!(family = %self.family, generation = ticket.0, "instance ready");
        true
    }

    /// Install `instance` already configured if `ticket` is current;
    /// otherwise destroy it. Returns whether it was installed.
    pub fn complete_configured(&self, ticket: Ticket, instance: SourceRef) -> bool {
        if !self.complete(ticket, instance) {
            return false;
        }
        self.inner.borrow_mut().configured = true;
        true
    }

    /// Record a failure of the attempt `ticket`. Stale failures are ignored.
    pub fn fail(&self, ticket: Ticket, error: BindError) {
        if !self.is_current(ticket) {
            tracing::trace!(family = %self.family, %error, "stale failure ignored");
            return;
        }
        tracing::warn!(family = %self.family, %error, "lifecycle failure");
        let mut inner = self.inner.borrow_mut();
        if !matches!(error, BindError::Configuration { .. }) {
            inner.state = LifecycleState::Uninitialized;
        }
        inner.last_error = Some(error);
    }

    /// Mark the instance of `ticket` configured. Returns whether it was.
    pub fn mark_configured(&self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let mut inner = self.inner.borrow_mut();
        if inner.current.is_none() {
            return false;
        }
        inner.configured = true;
        true
    }

    /// Destroy the current instance and go back to `Uninitialized`.
    pub fn release(&self) {
        self.teardown(LifecycleState::Uninitialized);
    }

    /// Destroy the current instance for good; in-flight attempts become
    /// stale.
    pub fn destroy(&self) {
        self.teardown(LifecycleState::Destroyed);
    }

    fn teardown(&self, end: LifecycleState) {
        let previous = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == LifecycleState::Destroyed {
                return;
            }
            inner.generation += 1;
            inner.configured = false;
            inner.state = LifecycleState::Destroying;
            inner.current.take()
        };
        if let Some(previous) = previous {
            previous.destroy();
        }
        self.inner.borrow_mut().state = end;
        tracing::trace!(family = %self.family, state = ?end, "lifecycle torn down");
    }

    /// Current instance.
    #[must_use]
    pub fn current(&self) -> Option<SourceRef> {
        self.inner.borrow().current.clone()
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.inner.borrow().state
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.borrow().configured
    }

    /// Error of the latest attempt, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<BindError> {
        self.inner.borrow().last_error.clone()
    }

    #[must_use]
    pub fn family(&self) -> Family {
        self.family
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Lifecycle")
            .field("family", &self.family)
            .field("state", &inner.state)
            .field("generation", &inner.generation)
            .field("configured", &inner.configured)
            .field("last_error", &inner.last_error)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Outcome of a two-phase creation, as seen by one render.
#[derive(Clone, Debug, Default)]
pub struct Created {
    pub instance: Option<SourceRef>,
    pub configured: bool,
    pub error: Option<BindError>,
}

type CreationKey = (Option<ByPtr<dyn Listenable>>, Vec<Value>);

fn use_lifecycle(cx: &mut Cx<'_>, family: Family) -> Rc<Lifecycle> {
    let lifecycle = cx.use_ref(|| Lifecycle::new(family));
    let on_unmount = Rc::clone(&lifecycle);
    cx.use_effect((), move || {
        Some(Box::new(move || on_unmount.destroy()) as Cleanup)
    });
    lifecycle
}

/// Create an instance derived from `input` during render, and recreate it
/// whenever `input` (by identity) or `deps` change. The previous instance is
/// destroyed before its replacement is created, and the current one on
/// unmount.
pub fn use_create(
    cx: &mut Cx<'_>,
    family: Family,
    input: Option<&SourceRef>,
    deps: Vec<Value>,
    create: impl FnOnce(&SourceRef) -> SourceRef + 'static,
) -> Option<SourceRef> {
    let lifecycle = use_lifecycle(cx, family);
    let runner = Rc::clone(&lifecycle);
    let input = input.cloned();
    let key: CreationKey = (ByPtr::opt(input.as_ref()), deps);
    cx.use_memo(key, move |_| match input {
        Some(input) => {
            let ticket = runner.begin();
            runner.complete(ticket, create(&input));
        }
        None => runner.release(),
    });
    lifecycle.current()
}

/// [`use_create`] with a single asynchronous creation step run on the
/// component's local executor.
pub fn use_create_async<F>(
    cx: &mut Cx<'_>,
    family: Family,
    input: Option<&SourceRef>,
    deps: Vec<Value>,
    create: impl FnOnce(SourceRef) -> F + 'static,
) -> Option<SourceRef>
where
    F: Future<Output = Result<SourceRef, String>> + 'static,
{
    use_create_configured(cx, family, input, deps, create, None::<NoConfigure>).instance
}

type NoConfigure = fn(SourceRef) -> std::future::Ready<Result<(), String>>;

/// Two-phase asynchronous creation: create, then configure.
///
/// With a `configure` step the instance stays off [`Created::instance`]
/// until configuration finished, and a single re-render is requested then.
/// An instance whose attempt was replaced while it was being configured is
/// destroyed and never shown. A failed configuration installs the instance
/// unconfigured alongside the error.
pub fn use_create_configured<F, C, G>(
    cx: &mut Cx<'_>,
    family: Family,
    input: Option<&SourceRef>,
    deps: Vec<Value>,
    create: impl FnOnce(SourceRef) -> F + 'static,
    configure: Option<C>,
) -> Created
where
    F: Future<Output = Result<SourceRef, String>> + 'static,
    C: FnOnce(SourceRef) -> G + 'static,
    G: Future<Output = Result<(), String>> + 'static,
{
    let lifecycle = use_lifecycle(cx, family);
    let invalidator = cx.invalidator();
    let spawner = cx.spawner();
    let runner = Rc::clone(&lifecycle);
    let input = input.cloned();
    let key: CreationKey = (ByPtr::opt(input.as_ref()), deps);
    cx.use_effect(key, move || {
        let Some(input) = input else {
            let had_instance = runner.current().is_some();
            runner.release();
            if had_instance {
                invalidator.invalidate();
            }
            return None;
        };
        let ticket = runner.begin();
        let task = creation_task(
            Rc::clone(&runner),
            ticket,
            invalidator.clone(),
            create(input),
            configure,
        );
        if !spawn(spawner.as_ref(), task) {
            runner.fail(ticket, BindError::NoExecutor);
            invalidator.invalidate();
        }
        None
    });
    Created {
        instance: lifecycle.current(),
        configured: lifecycle.is_configured(),
        error: lifecycle.last_error(),
    }
}

async fn creation_task<F, C, G>(
    lifecycle: Rc<Lifecycle>,
    ticket: Ticket,
    invalidator: Invalidator,
    created: F,
    configure: Option<C>,
) where
    F: Future<Output = Result<SourceRef, String>>,
    C: FnOnce(SourceRef) -> G,
    G: Future<Output = Result<(), String>>,
{
    let family = lifecycle.family();
    let instance = match created.await {
        Ok(instance) => instance,
        Err(reason) => {
            lifecycle.fail(ticket, BindError::Creation { family, reason });
            invalidator.invalidate();
            return;
        }
    };
    let Some(configure) = configure else {
        if lifecycle.complete(ticket, instance) {
            invalidator.invalidate();
        }
        return;
    };
    if !lifecycle.is_current(ticket) {
        lifecycle.complete(ticket, instance);
        return;
    }
    let outcome = configure(SourceRef::clone(&instance)).await;
    if !lifecycle.is_current(ticket) {
        tracing::trace!(%family, "configuration finished for a replaced instance");
        lifecycle.complete(ticket, instance);
        return;
    }
    match outcome {
        Ok(()) => {
            lifecycle.complete_configured(ticket, instance);
            tracing::debug!(%family, "instance configured");
        }
        Err(reason) => {
            lifecycle.complete(ticket, instance);
            lifecycle.fail(ticket, BindError::Configuration { family, reason });
        }
    }
    invalidator.invalidate();
}

fn spawn(spawner: Option<&LocalSpawner>, task: impl Future<Output = ()> + 'static) -> bool {
    match spawner {
        Some(spawner) => spawner.spawn_local(task).is_ok(),
        None => false,
    }
}

/// Create a root instance once per `deps`. The instance is not destroyed by
/// the hook.
pub fn use_create_store(
    cx: &mut Cx<'_>,
    deps: Vec<Value>,
    create: impl FnOnce() -> SourceRef,
) -> SourceRef {
    SourceRef::clone(&cx.use_memo(deps, |_| create()))
}
