//! Single-writer latest-state cell.
//!
//! Both sides of the bridge retain exactly one value: the most recent
//! [`SelectionState`](crate::SelectionState) they saw. Each new state fully
//! replaces the prior one; there is no history and no incremental merge.

use std::sync::Arc;

use parking_lot::RwLock;

/// An owned latest-value slot with an atomic replace operation.
///
/// Readers receive a cheap `Arc` snapshot; a replace never blocks readers of
/// the previous snapshot.
#[derive(Debug)]
pub struct StateCell<T> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> StateCell<T> {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Replace the held value, returning the new snapshot.
    pub fn replace(&self, value: T) -> Arc<T> {
        let next = Arc::new(value);
        *self.slot.write() = Some(next.clone());
        next
    }

    /// The latest snapshot, if any value was ever stored.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.slot.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl<T> Default for StateCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
