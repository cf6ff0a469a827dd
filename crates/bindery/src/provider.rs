#![forbid(unsafe_code)]

//! Provider hooks: publishing scopes and registering sources at runtime.
//!
//! A provider component calls [`use_scope_provider`] with its own props and
//! hands the returned [`Provided::contexts`] to its children. Descendants
//! read the composed scope through [`crate::resolve::current_scope`] and may
//! register additional instances with [`use_provide_source`]; a registration
//! re-renders the provider, which re-composes and passes new contexts down.
//!
//! The root of the tree starts from [`root_contexts`].

use std::fmt;

use bindery_core::{Family, Id, Listenable, SourceRef};
use bindery_runtime::{ByPtr, Cleanup, Contexts, Cx};

use crate::resolve::current_scope;
use crate::scope::{DynamicRegistry, NamedSources, Scope, ScopeProps, ScopeProvider};

/// Contexts for the root of a component tree: the empty root scope.
#[must_use]
pub fn root_contexts() -> Contexts {
    Contexts::new().with(Scope::root())
}

/// What a provider hands to its children.
#[derive(Clone)]
pub struct Provided {
    pub scope: Scope,
    pub contexts: Contexts,
}

impl fmt::Debug for Provided {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provided")
            .field("scope", &self.scope)
            .field("contexts", &self.contexts.len())
            .finish()
    }
}

struct ChildContextsKey {
    parent: Contexts,
    scope: Scope,
}

impl PartialEq for ChildContextsKey {
    fn eq(&self, other: &Self) -> bool {
        self.scope.ptr_eq(&other.scope) && self.parent.same_as(&other.parent)
    }
}

/// Compose this provider's scope and the contexts its children render
/// under. Both stay identical across renders while no input changed.
pub fn use_scope_provider(cx: &mut Cx<'_>, props: &ScopeProps) -> Provided {
    let invalidator = cx.invalidator();
    let provider = cx.use_ref(|| ScopeProvider::new(invalidator));
    let own_root = cx.use_ref(Scope::root);
    let parent = cx
        .context::<Scope>()
        .map_or_else(|| Scope::clone(&own_root), |scope| Scope::clone(&scope));
    let scope = provider.scope(&parent, props);
    let key = ChildContextsKey {
        parent: cx.contexts().clone(),
        scope: scope.clone(),
    };
    let contexts = cx.use_memo(key, |key| key.parent.with(key.scope.clone()));
    Provided {
        scope,
        contexts: Contexts::clone(&contexts),
    }
}

/// Register `source` as `id` with the nearest provider for as long as this
/// component stays mounted with the same arguments.
pub fn use_provide_source(cx: &mut Cx<'_>, family: Family, id: &str, source: Option<&SourceRef>) {
    let registry = current_scope(cx).registry().cloned();
    let source = source.cloned();
    let key: (Option<DynamicRegistry>, Family, Id, Option<ByPtr<dyn Listenable>>) = (
        registry.clone(),
        family,
        id.to_owned(),
        ByPtr::opt(source.as_ref()),
    );
    let id = id.to_owned();
    cx.use_effect(key, move || {
        let source = source?;
        let Some(registry) = registry else {
            tracing::debug!(%family, id = %id, "no provider in scope; registration ignored");
            return None;
        };
        let registration = registry.register(family, id, source);
        Some(Box::new(move || drop(registration)) as Cleanup)
    });
}

/// Ids of the named instances of `family` visible here, in order.
pub fn use_source_ids(cx: &mut Cx<'_>, family: Family) -> Vec<Id> {
    current_scope(cx).source_ids(family)
}

/// The named instances of `family` visible here.
pub fn use_named_sources(cx: &mut Cx<'_>, family: Family) -> NamedSources {
    current_scope(cx).named_sources(family).clone()
}

/// Shared handle to the nearest provider's registry, for registering from
/// outside a render.
pub fn use_registry(cx: &mut Cx<'_>) -> Option<DynamicRegistry> {
    current_scope(cx).registry().cloned()
}
