#![forbid(unsafe_code)]

//! Minimal single-threaded hook host for bindery.
//!
//! Bindery's hooks need a handful of rendering-engine primitives: memo slots,
//! effects with cleanup, an external-store synchronization primitive, a typed
//! context map, re-render requests and a local executor. This crate provides
//! exactly those and nothing else: no tree diffing, no layout, no output.
//!
//! # Example
//!
//! ```
//! use bindery_runtime::Component;
//!
//! let mut counter = Component::new("counter");
//! let doubled = counter.render(|cx| *cx.use_memo(21, |n| n * 2));
//! assert_eq!(doubled, Some(42));
//! ```

pub mod component;
pub mod context;
pub mod deps;
pub mod hooks;
pub mod reactive;
pub mod task;

pub use component::Component;
pub use context::Contexts;
pub use deps::ByPtr;
pub use hooks::{Cleanup, Cx, GetSnapshot, Notify};
pub use reactive::{Invalidator, Subscription};
pub use task::TaskPool;

pub use futures::executor::LocalSpawner;
