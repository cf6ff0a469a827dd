#![forbid(unsafe_code)]

//! Mounted component instances.
//!
//! A [`Component`] owns its hook slots, its context map and its
//! [`Invalidator`]. The host (an application loop or a test) calls
//! [`Component::render`] whenever [`Component::needs_render`] reports a
//! pending request, and [`Component::unmount`] (or drops the component) when
//! it leaves the tree.
//!
//! # Invariants
//!
//! 1. Effects of a render commit before `render` returns.
//! 2. Unmount runs effect cleanups and drops store subscriptions in reverse
//!    slot order, exactly once.
//! 3. After unmount, invalidation requests are ignored and `render` is a
//!    no-op returning `None`.

use std::fmt;

use futures::executor::LocalSpawner;

use crate::context::Contexts;
use crate::hooks::{Cx, PendingEffect, Slot};
use crate::reactive::Invalidator;

/// A mounted component.
pub struct Component {
    name: &'static str,
    slots: Vec<Slot>,
    contexts: Contexts,
    invalidator: Invalidator,
    spawner: Option<LocalSpawner>,
    renders: u64,
    mounted: bool,
}

impl Component {
    /// Mount a component with empty contexts.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self::with_contexts(name, Contexts::new())
    }

    /// Mount a component under `contexts`.
    #[must_use]
    pub fn with_contexts(name: &'static str, contexts: Contexts) -> Self {
        tracing::trace!(component = name, "mount");
        Self {
            name,
            slots: Vec::new(),
            contexts,
            invalidator: Invalidator::new(),
            spawner: None,
            renders: 0,
            mounted: true,
        }
    }

    /// Attach a local executor for asynchronous hooks.
    #[must_use]
    pub fn with_spawner(mut self, spawner: LocalSpawner) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Component name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Contexts this component renders under.
    #[must_use]
    pub fn contexts(&self) -> &Contexts {
        &self.contexts
    }

    /// Replace the contexts; requests a re-render if any entry changed.
    pub fn set_contexts(&mut self, contexts: Contexts) {
        if !self.contexts.same_as(&contexts) {
            self.contexts = contexts;
            self.invalidator.invalidate();
        }
    }

    /// Handle requesting a re-render of this component.
    #[must_use]
    pub fn invalidator(&self) -> Invalidator {
        self.invalidator.clone()
    }

    /// Whether a re-render has been requested since the last render.
    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.invalidator.is_dirty()
    }

    /// Number of completed renders.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Whether the component is still mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Run one render pass, then commit its effects.
    pub fn render<R>(&mut self, body: impl FnOnce(&mut Cx<'_>) -> R) -> Option<R> {
        if !self.mounted {
            tracing::debug!(component = self.name, "render after unmount ignored");
            return None;
        }
        self.invalidator.clear();
        let previous_slots = self.slots.len();
        let (output, hooks, pending) = {
            let mut cx = Cx {
                slots: &mut self.slots,
                cursor: 0,
                pending: Vec::new(),
                contexts: &self.contexts,
                invalidator: &self.invalidator,
                spawner: self.spawner.as_ref(),
                name: self.name,
            };
            let output = body(&mut cx);
            (output, cx.cursor, cx.pending)
        };
        if self.renders > 0 && hooks != previous_slots {
            tracing::warn!(
                component = self.name,
                expected = previous_slots,
                called = hooks,
                "hook count changed between renders"
            );
        }
        self.renders += 1;
        self.commit(pending);
        Some(output)
    }

    /// Render only if a re-render was requested.
    pub fn render_if_needed<R>(&mut self, body: impl FnOnce(&mut Cx<'_>) -> R) -> Option<R> {
        if self.needs_render() {
            self.render(body)
        } else {
            None
        }
    }

    /// Tear down every hook. Idempotent.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.invalidator.detach();
        while let Some(slot) = self.slots.pop() {
            match slot {
                Slot::Effect(mut effect) => {
                    if let Some(cleanup) = effect.cleanup.take() {
                        cleanup();
                    }
                }
                other => drop(other),
            }
        }
        tracing::trace!(component = self.name, "unmount");
    }

    fn commit(&mut self, pending: Vec<PendingEffect>) {
        for effect in &pending {
            if let Some(Slot::Effect(slot)) = self.slots.get_mut(effect.index)
                && let Some(cleanup) = slot.cleanup.take()
            {
                cleanup();
            }
        }
        for effect in pending {
            let cleanup = (effect.run)();
            if let Some(Slot::Effect(slot)) = self.slots.get_mut(effect.index) {
                slot.cleanup = cleanup;
            }
        }
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("slots", &self.slots.len())
            .field("renders", &self.renders)
            .field("mounted", &self.mounted)
            .finish()
    }
}
