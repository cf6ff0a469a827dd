#![forbid(unsafe_code)]

//! Core vocabulary shared by every bindery crate.
//!
//! This crate provides:
//! - [`Family`] and [`PerFamily`] for addressing the eight source families
//! - [`Value`], [`Arg`] and [`CheckpointIds`] for data crossing the source boundary
//! - [`Shape`] for per-category defaults and equality
//! - [`Aspect`], [`Read`], [`Command`] and the [`DispatchTable`] describing what
//!   each family exposes
//! - the [`Listenable`] contract every source implements
//! - [`BindError`] for the few fallible operations

pub mod aspect;
pub mod error;
pub mod family;
pub mod listenable;
pub mod shape;
pub mod value;

pub use aspect::{Aspect, AspectSpec, Command, DispatchTable, Read};
pub use error::{BindError, Result};
pub use family::{Family, PerFamily};
pub use listenable::{Listenable, Listener, ListenerId, SourceRef, same_opt_source, same_source};
pub use shape::Shape;
pub use value::{Arg, CheckpointIds, Id, Value};
