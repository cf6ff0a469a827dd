#![forbid(unsafe_code)]

//! Scoped, shape-aware bindings between observable data sources and a
//! hook-based component tree.
//!
//! This crate provides:
//! - [`Scope`], [`ScopeProvider`] and [`DynamicRegistry`] for deciding which
//!   source instance a component means
//! - [`Target`] and [`resolve`](resolve::resolve) for turning a reference
//!   into an instance
//! - [`use_listenable`] and [`Binding`] for subscribing to one aspect of a
//!   source with reference-stable snapshots
//! - [`WriteSpec`] and [`use_write_callback`] for memoized write callbacks
//! - [`Lifecycle`] and the `use_create*` hooks for derived objects owned by a
//!   component
//! - [`use_listener`] for raw listeners
//! - per-family hooks under [`hooks`]
//!
//! # Example
//!
//! ```
//! use bindery::{root_contexts, Target};
//! use bindery::hooks::store::use_cell;
//! use bindery_runtime::Component;
//!
//! let mut cell = Component::with_contexts("cell", root_contexts());
//! // No store in scope: the read falls back to the scalar default.
//! let value = cell.render(|cx| use_cell(cx, "pets", "fido", "color", &Target::Default));
//! assert!(value.is_some_and(|v| v.is_absent()));
//! ```

pub mod adapter;
pub mod hooks;
pub mod lifecycle;
pub mod listener;
pub mod mutate;
pub mod provider;
pub mod resolve;
pub mod scope;

#[cfg(test)]
mod testing;

pub use adapter::{Binding, BindingKey, use_aspect, use_listenable, use_presence};
pub use lifecycle::{
    Created, Lifecycle, LifecycleState, Ticket, use_create, use_create_async,
    use_create_configured, use_create_store,
};
pub use listener::use_listener;
pub use mutate::{
    Mutator, MutatorKey, WriteOp, WriteSpec, use_command_callback, use_del_callback,
    use_set_callback, use_write_callback,
};
pub use provider::{
    Provided, root_contexts, use_named_sources, use_provide_source, use_registry,
    use_scope_provider, use_source_ids,
};
pub use resolve::{Target, current_scope, use_source};
pub use scope::{DynamicRegistry, NamedSources, Registration, Scope, ScopeProps, ScopeProvider};

pub use bindery_core::{
    Arg, Aspect, BindError, CheckpointIds, Command, Family, Id, Listenable, Read, Shape,
    SourceRef, Value, args,
};
