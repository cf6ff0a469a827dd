#![forbid(unsafe_code)]

//! Error type for the few fallible binding operations.
//!
//! Missing sources and unresolved ids are never errors: reads fall back to
//! shape defaults and writes become no-ops. `BindError` covers catalog
//! lookups and asynchronous creation failures only.

use thiserror::Error;

use crate::family::Family;

/// Errors raised by catalog lookups and object creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("unknown aspect {family}.{name}")]
    UnknownAspect { family: Family, name: String },

    #[error("{aspect} takes at most {max} argument(s), got {got}")]
    Arity {
        aspect: String,
        max: usize,
        got: usize,
    },

    #[error("{aspect} is not writable")]
    NotWritable { aspect: String },

    #[error("creating {family} failed: {reason}")]
    Creation { family: Family, reason: String },

    #[error("configuring {family} failed: {reason}")]
    Configuration { family: Family, reason: String },

    #[error("no local executor available for asynchronous creation")]
    NoExecutor,
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BindError>;
