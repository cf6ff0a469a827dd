#![forbid(unsafe_code)]

//! Target resolution: explicit instance, id, or the scope's default.
//!
//! Resolution is a pure lookup against a [`Scope`]; it never subscribes.
//! An id that matches nothing resolves to `None`, which every hook treats
//! as a valid state (defaults for reads, no-ops for writes).

use std::fmt;

use bindery_core::{Family, Id, SourceRef, same_source};
use bindery_runtime::Cx;

use crate::scope::Scope;

/// Which source instance a hook means.
#[derive(Clone, Default)]
pub enum Target {
    /// The nearest scope's default instance of the family.
    #[default]
    Default,
    /// The nearest scope's instance registered under this id.
    Id(Id),
    /// This exact instance, bypassing the scope.
    Source(SourceRef),
}

impl Target {
    /// Resolve against `scope`.
    #[must_use]
    pub fn resolve(&self, family: Family, scope: &Scope) -> Option<SourceRef> {
        resolve(self, family, scope)
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Target::Default, Target::Default) => true,
            (Target::Id(a), Target::Id(b)) => a == b,
            (Target::Source(a), Target::Source(b)) => same_source(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Default => f.write_str("Default"),
            Target::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Target::Source(source) => f.debug_tuple("Source").field(source).finish(),
        }
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Target::Id(id.to_owned())
    }
}

impl From<String> for Target {
    fn from(id: String) -> Self {
        Target::Id(id)
    }
}

impl From<SourceRef> for Target {
    fn from(source: SourceRef) -> Self {
        Target::Source(source)
    }
}

impl From<&SourceRef> for Target {
    fn from(source: &SourceRef) -> Self {
        Target::Source(SourceRef::clone(source))
    }
}

impl<T: Into<Target>> From<Option<T>> for Target {
    fn from(target: Option<T>) -> Self {
        target.map_or(Target::Default, Into::into)
    }
}

/// Turn `target` into a concrete instance of `family` using `scope`.
#[must_use]
pub fn resolve(target: &Target, family: Family, scope: &Scope) -> Option<SourceRef> {
    match target {
        Target::Source(source) => Some(SourceRef::clone(source)),
        Target::Id(id) => scope.named_source(family, id),
        Target::Default => scope.default_source(family),
    }
}

/// The nearest scope visible to the rendering component; an empty root
/// outside any tree.
#[must_use]
pub fn current_scope(cx: &Cx<'_>) -> Scope {
    cx.context::<Scope>()
        .map_or_else(Scope::root, |scope| Scope::clone(&scope))
}

/// Resolve `target` for `family` against the current scope.
#[must_use]
pub fn use_source(cx: &Cx<'_>, family: Family, target: &Target) -> Option<SourceRef> {
    let resolved = resolve(target, family, &current_scope(cx));
    if resolved.is_none()
        && let Target::Id(id) = target
    {
        tracing::trace!(%family, id = %id, "id resolved to no instance");
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{ScopeProps, ScopeProvider};
    use crate::testing::stub;
    use bindery_core::same_opt_source;
    use bindery_runtime::{Component, Contexts};
    use std::rc::Rc;

    const F: Family = Family::Queries;

    fn scope_with(default: &SourceRef, named: &SourceRef) -> Scope {
        let props = ScopeProps::new()
            .default_source(F, Rc::clone(default))
            .named_source(F, "q1", Rc::clone(named));
        ScopeProvider::with_registry(Default::default()).scope(&Scope::root(), &props)
    }

    #[test]
    fn explicit_source_bypasses_scope() {
        let explicit = stub(F);
        let target = Target::from(&explicit);
        assert!(same_opt_source(resolve(&target, F, &Scope::root()).as_ref(), Some(&explicit)));
    }

    #[test]
    fn id_and_default_lookups() {
        let (d, n) = (stub(F), stub(F));
        let scope = scope_with(&d, &n);
        assert!(same_opt_source(Target::Default.resolve(F, &scope).as_ref(), Some(&d)));
        assert!(same_opt_source(Target::from("q1").resolve(F, &scope).as_ref(), Some(&n)));
        assert!(Target::from("missing").resolve(F, &scope).is_none());
        assert!(Target::Default.resolve(Family::Store, &scope).is_none());
    }

    #[test]
    fn option_conversion_defaults() {
        assert_eq!(Target::from(None::<&str>), Target::Default);
        assert_eq!(Target::from(Some("x")), Target::Id("x".into()));
    }

    #[test]
    fn current_scope_reads_contexts() {
        let (d, n) = (stub(F), stub(F));
        let scope = scope_with(&d, &n);
        let mut inside = Component::with_contexts("inside", Contexts::new().with(scope.clone()));
        let seen = inside.render(|cx| current_scope(cx)).expect("mounted");
        assert!(seen.ptr_eq(&scope));

        let mut outside = Component::new("outside");
        let seen = outside
            .render(|cx| (current_scope(cx), use_source(cx, F, &Target::Default)))
            .expect("mounted");
        assert!(seen.0.default_source(F).is_none());
        assert!(seen.0.registry().is_none());
        assert!(seen.1.is_none());
    }
}
