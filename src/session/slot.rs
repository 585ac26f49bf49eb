//! Single-slot event subscription.
//!
//! Each event channel has at most one live subscriber. Subscribing
//! replaces whatever was installed; cancellation is generation-tagged
//! so a stale cancellation cannot clobber a newer subscriber.

use std::sync::Arc;

/// Shared callback type for one event channel.
pub(crate) type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Holder for at most one live subscriber.
pub(crate) struct Slot<T> {
    callback: Option<Callback<T>>,
    generation: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            callback: None,
            generation: 0,
        }
    }
}

impl<T> Slot<T> {
    /// Installs `callback`, replacing any current subscriber, and
    /// returns the generation tag identifying this subscription.
    pub fn install(&mut self, callback: Callback<T>) -> u64 {
        self.generation += 1;
        self.callback = Some(callback);
        self.generation
    }

    /// Clears the slot if it still holds the subscription tagged
    /// `generation`. Returns whether anything was cleared.
    pub fn clear_if(&mut self, generation: u64) -> bool {
        if self.callback.is_some() && self.generation == generation {
            self.callback = None;
            true
        } else {
            false
        }
    }

    /// Unconditionally clears the slot.
    pub fn clear(&mut self) {
        self.callback = None;
    }

    /// Returns a clone of the current subscriber, if any.
    pub fn current(&self) -> Option<Callback<T>> {
        self.callback.clone()
    }
}
