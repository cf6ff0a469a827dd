#![forbid(unsafe_code)]

//! RAII subscription guards.
//!
//! A [`Subscription`] owns the teardown of one listener registration. The
//! teardown runs exactly once: on [`Subscription::cancel`] or on drop,
//! whichever comes first, including during unwinding.

use std::fmt;

/// Guard that runs its teardown exactly once.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Guard that runs `teardown` when cancelled or dropped.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Guard with nothing to tear down.
    pub fn noop() -> Self {
        Self { teardown: None }
    }

    /// Whether a teardown is still pending.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.teardown.is_some()
    }

    /// Run the teardown now.
    pub fn cancel(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
