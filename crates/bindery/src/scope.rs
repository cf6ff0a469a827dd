#![forbid(unsafe_code)]

//! Hierarchical scopes of source instances.
//!
//! A [`Scope`] answers "which instance does this component mean" for every
//! [`Family`]: an optional default instance and an ordered map of named
//! instances. Each provider level composes a new scope from its parent, its
//! own props and whatever descendants registered at runtime:
//!
//! ```text
//! default = own default ?? parent default
//! named   = parent named  <- own named  <- dynamic     (right wins per id)
//! ```
//!
//! Scopes are immutable. [`ScopeProvider`] memoizes composition against the
//! identity of every input, so an unchanged provider hands the same scope
//! object to its descendants render after render.
//!
//! Runtime registration goes through a [`DynamicRegistry`]. Every change
//! publishes a fresh snapshot (copy-on-write); a snapshot already handed out
//! is never mutated. [`DynamicRegistry::register`] returns a
//! [`Registration`] guard that unregisters on drop.
//!
//! # Invariants
//!
//! 1. `Scope::compose` never mutates its inputs.
//! 2. `ScopeProvider::scope` returns the previous scope (same `Rc`) when the
//!    parent scope, each own default, each own named map and the dynamic
//!    snapshot are all unchanged by identity.
//! 3. A registry snapshot, once returned by `snapshot()`, never changes.
//! 4. Dropping a `Registration` removes its entry at most once, and only if
//!    the entry still maps to the instance it registered.
//!
//! # Failure Modes
//!
//! None observable. Re-registering an id replaces the previous entry (last
//! writer wins); registering without a provider is ignored.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use bindery_core::{Family, Id, PerFamily, SourceRef, same_opt_source, same_source};
use bindery_runtime::Invalidator;

/// Ordered id to instance map for one family.
pub type NamedSources = im::OrdMap<Id, SourceRef>;

/// Per-family dynamic registrations, as published by a registry.
pub type DynamicSnapshot = Rc<PerFamily<NamedSources>>;

#[derive(Clone, Default)]
struct FamilySlot {
    default: Option<SourceRef>,
    named: NamedSources,
}

struct ScopeInner {
    slots: PerFamily<FamilySlot>,
    registry: Option<DynamicRegistry>,
}

/// Effective per-family registry visible at one nesting level.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    /// A new empty root scope, with no registry. A tree builds one at its
    /// top and passes it down through [`crate::root_contexts`]; scopes built
    /// by separate calls are distinct.
    #[must_use]
    pub fn root() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                slots: PerFamily::default(),
                registry: None,
            }),
        }
    }

    /// Compose a child scope. The child inherits the parent's registry.
    #[must_use]
    pub fn compose(
        parent: &Scope,
        own_defaults: &PerFamily<Option<SourceRef>>,
        own_named: &PerFamily<Option<Rc<NamedSources>>>,
        own_dynamic: &PerFamily<NamedSources>,
    ) -> Self {
        Self::compose_with_registry(
            parent,
            own_defaults,
            own_named,
            own_dynamic,
            parent.inner.registry.clone(),
        )
    }

    fn compose_with_registry(
        parent: &Scope,
        own_defaults: &PerFamily<Option<SourceRef>>,
        own_named: &PerFamily<Option<Rc<NamedSources>>>,
        own_dynamic: &PerFamily<NamedSources>,
        registry: Option<DynamicRegistry>,
    ) -> Self {
        let slots = PerFamily::new(|family| {
            let inherited = &parent.inner.slots[family];
            let default = own_defaults[family]
                .clone()
                .or_else(|| inherited.default.clone());
            let mut named = inherited.named.clone();
            if let Some(own) = &own_named[family] {
                named = NamedSources::clone(own).union(named);
            }
            if !own_dynamic[family].is_empty() {
                named = own_dynamic[family].clone().union(named);
            }
            FamilySlot { default, named }
        });
        Self {
            inner: Rc::new(ScopeInner { slots, registry }),
        }
    }

    /// Effective default instance of `family`.
    #[must_use]
    pub fn default_source(&self, family: Family) -> Option<SourceRef> {
        self.inner.slots[family].default.clone()
    }

    /// Effective instance registered as `id` for `family`.
    #[must_use]
    pub fn named_source(&self, family: Family, id: &str) -> Option<SourceRef> {
        self.inner.slots[family].named.get(id).cloned()
    }

    /// Effective named map of `family`.
    #[must_use]
    pub fn named_sources(&self, family: Family) -> &NamedSources {
        &self.inner.slots[family].named
    }

    /// Ids of the effective named map of `family`, in order.
    #[must_use]
    pub fn source_ids(&self, family: Family) -> Vec<Id> {
        self.inner.slots[family].named.keys().cloned().collect()
    }

    /// Registry of the nearest provider, if any.
    #[must_use]
    pub fn registry(&self) -> Option<&DynamicRegistry> {
        self.inner.registry.as_ref()
    }

    /// Whether both handles are the same scope object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for (family, slot) in self.inner.slots.iter() {
            if slot.default.is_some() || !slot.named.is_empty() {
                let ids: Vec<&Id> = slot.named.keys().collect();
                list.entry(&family, &(slot.default.is_some(), ids));
            }
        }
        list.finish()
    }
}

// ---------------------------------------------------------------------------
// ScopeProps: a provider's own inputs
// ---------------------------------------------------------------------------

/// Explicit instances supplied to one provider.
///
/// Named maps are held behind `Rc` so that their identity can be compared;
/// reuse the same `Rc` across renders to avoid recomposition.
#[derive(Clone, Default)]
pub struct ScopeProps {
    defaults: PerFamily<Option<SourceRef>>,
    named: PerFamily<Option<Rc<NamedSources>>>,
}

impl ScopeProps {
    /// No explicit instances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default instance of `family`.
    #[must_use]
    pub fn default_source(mut self, family: Family, source: SourceRef) -> Self {
        self.defaults[family] = Some(source);
        self
    }

    /// Set the named map of `family`.
    #[must_use]
    pub fn named(mut self, family: Family, sources: Rc<NamedSources>) -> Self {
        self.named[family] = Some(sources);
        self
    }

    /// Add one named instance to `family`'s map.
    #[must_use]
    pub fn named_source(mut self, family: Family, id: impl Into<Id>, source: SourceRef) -> Self {
        let map = self.named[family]
            .as_deref()
            .cloned()
            .unwrap_or_default()
            .update(id.into(), source);
        self.named[family] = Some(Rc::new(map));
        self
    }

    /// Whether every input is identical (by reference) to `other`'s.
    #[must_use]
    pub fn same_as(&self, other: &ScopeProps) -> bool {
        self.defaults
            .all_pairs(&other.defaults, |a, b| same_opt_source(a.as_ref(), b.as_ref()))
            && self.named.all_pairs(&other.named, |a, b| match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                _ => false,
            })
    }
}

impl fmt::Debug for ScopeProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let defaults: Vec<Family> = self
            .defaults
            .iter()
            .filter_map(|(family, d)| d.as_ref().map(|_| family))
            .collect();
        let named: Vec<Family> = self
            .named
            .iter()
            .filter_map(|(family, n)| n.as_ref().map(|_| family))
            .collect();
        f.debug_struct("ScopeProps")
            .field("defaults", &defaults)
            .field("named", &named)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// DynamicRegistry: runtime registrations
// ---------------------------------------------------------------------------

struct RegistryInner {
    snapshot: RefCell<DynamicSnapshot>,
    owner: Option<Invalidator>,
}

/// Copy-on-write per-family map of runtime registrations.
#[derive(Clone)]
pub struct DynamicRegistry {
    inner: Rc<RegistryInner>,
}

impl DynamicRegistry {
    /// A registry nobody is notified about.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A registry that requests a re-render of `owner` on every change.
    #[must_use]
    pub fn with_owner(owner: Invalidator) -> Self {
        Self::build(Some(owner))
    }

    fn build(owner: Option<Invalidator>) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                snapshot: RefCell::new(Rc::new(PerFamily::default())),
                owner,
            }),
        }
    }

    /// Current snapshot. Later changes publish a new one.
    #[must_use]
    pub fn snapshot(&self) -> DynamicSnapshot {
        Rc::clone(&self.inner.snapshot.borrow())
    }

    /// Instance registered as `id` under `family`.
    #[must_use]
    pub fn get(&self, family: Family, id: &str) -> Option<SourceRef> {
        self.inner.snapshot.borrow()[family].get(id).cloned()
    }

    /// Register `source` as `id` under `family`, replacing any previous entry.
    pub fn insert(&self, family: Family, id: impl Into<Id>, source: SourceRef) {
        let id = id.into();
        tracing::debug!(%family, id = %id, "register source");
        self.publish(|next| {
            next[family] = next[family].update(id, source);
            true
        });
    }

    /// Remove the entry for `id` under `family`. Returns whether one existed.
    pub fn unregister(&self, family: Family, id: &str) -> bool {
        let removed = self.publish(|next| next[family].remove(id).is_some());
        if removed {
            tracing::debug!(%family, id, "unregister source");
        }
        removed
    }

    /// Register for as long as the returned guard lives.
    #[must_use = "dropping the Registration immediately unregisters the source"]
    pub fn register(&self, family: Family, id: impl Into<Id>, source: SourceRef) -> Registration {
        let id = id.into();
        self.insert(family, id.clone(), Rc::clone(&source));
        Registration {
            registry: Rc::downgrade(&self.inner),
            family,
            id,
            source,
        }
    }

    /// Whether both handles are the same registry.
    #[must_use]
    pub fn ptr_eq(&self, other: &DynamicRegistry) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn publish(&self, change: impl FnOnce(&mut PerFamily<NamedSources>) -> bool) -> bool {
        let changed = {
            let mut current = self.inner.snapshot.borrow_mut();
            let mut next = PerFamily::clone(&current);
            let changed = change(&mut next);
            if changed {
                *current = Rc::new(next);
            }
            changed
        };
        if changed && let Some(owner) = &self.inner.owner {
            owner.invalidate();
        }
        changed
    }
}

impl Default for DynamicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for DynamicRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for DynamicRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        let counts: Vec<(Family, usize)> = snapshot
            .iter()
            .filter(|(_, named)| !named.is_empty())
            .map(|(family, named)| (family, named.len()))
            .collect();
        f.debug_struct("DynamicRegistry")
            .field("entries", &counts)
            .finish()
    }
}

/// Guard for one runtime registration.
#[must_use = "dropping the Registration immediately unregisters the source"]
pub struct Registration {
    registry: Weak<RegistryInner>,
    family: Family,
    id: Id,
    source: SourceRef,
}

impl Registration {
    /// Family registered under.
    #[must_use]
    pub fn family(&self) -> Family {
        self.family
    }

    /// Id registered as.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let registry = DynamicRegistry { inner };
        let still_ours = registry
            .get(self.family, &self.id)
            .is_some_and(|current| same_source(&current, &self.source));
        if still_ours {
            registry.unregister(self.family, &self.id);
        } else {
            tracing::trace!(family = %self.family, id = %self.id, "registration superseded; leaving entry");
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("family", &self.family)
            .field("id", &self.id)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ScopeProvider: memoized composition
// ---------------------------------------------------------------------------

struct Composed {
    parent: Scope,
    props: ScopeProps,
    dynamic: DynamicSnapshot,
    scope: Scope,
}

/// One provider level: owns the registry descendants register into and
/// memoizes composition of its scope.
pub struct ScopeProvider {
    registry: DynamicRegistry,
    last: RefCell<Option<Composed>>,
    compositions: Cell<u64>,
}

impl ScopeProvider {
    /// Provider whose registry changes re-render `owner`.
    #[must_use]
    pub fn new(owner: Invalidator) -> Self {
        Self::with_registry(DynamicRegistry::with_owner(owner))
    }

    /// Provider around an existing registry.
    #[must_use]
    pub fn with_registry(registry: DynamicRegistry) -> Self {
        Self {
            registry,
            last: RefCell::new(None),
            compositions: Cell::new(0),
        }
    }

    /// Registry descendants register into.
    #[must_use]
    pub fn registry(&self) -> &DynamicRegistry {
        &self.registry
    }

    /// How many times a scope was actually composed.
    #[must_use]
    pub fn compositions(&self) -> u64 {
        self.compositions.get()
    }

    /// The effective scope for `parent` and `props`, recomposed only when an
    /// input changed by identity.
    pub fn scope(&self, parent: &Scope, props: &ScopeProps) -> Scope {
        let dynamic = self.registry.snapshot();
        if let Some(last) = self.last.borrow().as_ref()
            && last.parent.ptr_eq(parent)
            && last.props.same_as(props)
            && Rc::ptr_eq(&last.dynamic, &dynamic)
        {
            return last.scope.clone();
        }
        let scope = Scope::compose_with_registry(
            parent,
            &props.defaults,
            &props.named,
            &dynamic,
            Some(self.registry.clone()),
        );
        self.compositions.set(self.compositions.get() + 1);
        tracing::debug!(compositions = self.compositions.get(), "scope composed");
        *self.last.borrow_mut() = Some(Composed {
            parent: parent.clone(),
            props: props.clone(),
            dynamic,
            scope: scope.clone(),
        });
        scope
    }
}

impl fmt::Debug for ScopeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeProvider")
            .field("registry", &self.registry)
            .field("compositions", &self.compositions.get())
            .finish()
    }
}
