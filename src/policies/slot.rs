//! # Shared, externally mutable slot.
//!
//! `Slot` holds an `Arc<V>` that long-running work reads at each decision
//! point while callers may replace it at any time. Readers get a snapshot
//! (`Arc` clone) and never block writers for longer than the pointer swap.

use std::sync::{Arc, PoisonError, RwLock};

/// Atomically replaceable shared value.
pub(crate) struct Slot<V: ?Sized> {
    inner: RwLock<Arc<V>>,
}

impl<V: ?Sized> Slot<V> {
    /// Creates a slot holding `value`.
    pub(crate) fn new(value: Arc<V>) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Returns the current value.
    pub(crate) fn load(&self) -> Arc<V> {
        let g = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&g)
    }

    /// Replaces the value, returning the previous one.
    pub(crate) fn store(&self, value: Arc<V>) -> Arc<V> {
        let mut g = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *g, value)
    }
}
