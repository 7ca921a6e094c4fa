//! # Generations and last-writer guarded cells.
//!
//! A [`Generation`] identifies one logical attempt-chain started by a trigger or
//! a shape change. Ids are minted by [`GenerationCounter`] and strictly increase
//! per handle; `0` means "nothing minted yet".
//!
//! A [`GuardedCell`] pairs a visible value with the generation that last wrote
//! it. A write is applied only when the writer's generation is `>=` the last
//! writer, so a stale generation can never overwrite a newer one's value. Each
//! visible field (pending, response, error) gets its own cell; they advance
//! independently.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Identifier of one attempt-chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The pre-mint generation.
    pub const NONE: Generation = Generation(0);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Mints generations and answers "is this still the latest?".
#[derive(Debug, Default)]
pub(crate) struct GenerationCounter {
    latest: AtomicU64,
}

impl GenerationCounter {
    pub(crate) fn next(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub(crate) fn current(&self) -> Generation {
        Generation(self.latest.load(Ordering::Acquire))
    }

    pub(crate) fn is_current(&self, g: Generation) -> bool {
        g >= self.current()
    }
}

/// Value guarded by its last writer's generation.
#[derive(Debug)]
pub(crate) struct GuardedCell<V> {
    inner: Mutex<(Generation, V)>,
}

impl<V> GuardedCell<V> {
    pub(crate) fn new(value: V) -> Self {
        Self {
            inner: Mutex::new((Generation::NONE, value)),
        }
    }

    /// Applies `value` if `by` is not older than the last writer. Returns whether it was applied.
    pub(crate) fn set(&self, by: Generation, value: V) -> bool {
        let mut g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if by < g.0 {
            return false;
        }
        *g = (by, value);
        true
    }

    #[cfg(test)]
    pub(crate) fn set_by(&self) -> Generation {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).0
    }
}

impl<V: Clone> GuardedCell<V> {
    pub(crate) fn get(&self) -> V {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).1.clone()
    }
}
