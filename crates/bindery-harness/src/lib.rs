#![forbid(unsafe_code)]

//! Test harness and in-memory reference sources for bindery.
//!
//! This crate provides:
//! - [`MemoryStore`], a complete in-memory store with wildcard listeners
//!   and transactions
//! - [`MemoryCheckpoints`], undo/redo history over a [`MemoryStore`]
//! - [`ScriptedSource`], a source of any family whose reads the test sets
//! - [`CallLog`] and [`Call`] for asserting what reached a source
//! - [`json`] conversions for fixtures and snapshots
//! - proptest strategies under [`strategy`]
//!
//! The integration tests under `tests/` drive whole component trees through
//! these sources.

pub mod calls;
pub mod checkpoints;
pub mod json;
pub mod listeners;
pub mod memory;
pub mod scripted;
pub mod strategy;

pub use calls::{Call, CallLog};
pub use checkpoints::MemoryCheckpoints;
pub use listeners::ListenerTable;
pub use memory::{MemoryStore, StoreContents};
pub use scripted::ScriptedSource;
