#![forbid(unsafe_code)]

//! Change-propagation primitives for the hook host.
//!
//! - [`Subscription`]: RAII guard that tears down a listener registration
//!   exactly once.
//! - [`Invalidator`]: cloneable handle that requests a component re-render.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc`, `Cell`, `RefCell`). Sources push
//! change notifications synchronously; a notification only marks a component
//! dirty and never renders re-entrantly.
//!
//! # Invariants
//!
//! 1. A subscription's teardown runs at most once, and always runs if the
//!    guard is dropped.
//! 2. An invalidator detached by unmount never marks its component dirty
//!    again.

pub mod invalidator;
pub mod subscription;

pub use invalidator::Invalidator;
pub use subscription::Subscription;
