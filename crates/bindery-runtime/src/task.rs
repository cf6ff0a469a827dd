#![forbid(unsafe_code)]

//! Local task pool for asynchronous hooks.
//!
//! Asynchronous creation steps run as `!Send` futures on a
//! [`futures::executor::LocalPool`]. The host owns the pool and drives it
//! between renders; components only receive a spawner.

use std::fmt;

use futures::executor::{LocalPool, LocalSpawner};

/// Single-threaded executor driven by the host.
pub struct TaskPool {
    pool: LocalPool,
}

impl TaskPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool: LocalPool::new(),
        }
    }

    /// Spawner to hand to components.
    #[must_use]
    pub fn spawner(&self) -> LocalSpawner {
        self.pool.spawner()
    }

    /// Poll every ready task until none can make progress.
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Run until every spawned task has completed.
    pub fn run(&mut self) {
        self.pool.run();
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskPool").finish_non_exhaustive()
    }
}
