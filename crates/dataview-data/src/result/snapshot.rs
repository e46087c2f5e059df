//! Flat snapshot storage shared by the list-backed sources.

use std::cell::RefCell;

use dataview_core::{DataError, DataState, IndexPath, Uniq, UpdateBatch};
use dataview_diff::diff;
use dataview_runtime::{EventChannel, Observable};

/// One section of items plus the state and channel that describe it.
pub(crate) struct SnapshotCore<T> {
    items: RefCell<Vec<T>>,
    pub(crate) state: Observable<DataState>,
    pub(crate) updates: EventChannel<UpdateBatch>,
}

impl<T: Clone + 'static> SnapshotCore<T> {
    pub(crate) fn new(items: Vec<T>, state: DataState) -> Self {
        Self {
            items: RefCell::new(items),
            state: Observable::new(state),
            updates: EventChannel::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.state.with(DataState::is_loading)
    }

    pub(crate) fn is_error(&self) -> bool {
        self.state.with(DataState::is_error)
    }

    pub(crate) fn get(&self, position: IndexPath) -> Option<T> {
        if position.section != 0 {
            return None;
        }
        self.items.borrow().get(position.item).cloned()
    }

    pub(crate) fn to_vec(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    /// Drop every item, announcing `[All]` if there were any.
    pub(crate) fn clear(&self) {
        let had_items = {
            let mut items = self.items.borrow_mut();
            let had_items = !items.is_empty();
            items.clear();
            had_items
        };
        if had_items {
            self.updates.emit(&UpdateBatch::all());
        }
    }

    pub(crate) fn fail(&self, error: DataError) {
        tracing::warn!(%error, "load failed");
        self.state.set(DataState::Error(error));
    }
}

impl<T: Uniq + PartialEq + Clone + 'static> SnapshotCore<T> {
    /// Swap in `next`: items first, then `Idle`, then the diff batch.
    pub(crate) fn replace(&self, next: Vec<T>) {
        let batch = {
            let items = self.items.borrow();
            diff(items.as_slice(), &next)
        };
        *self.items.borrow_mut() = next;
        self.state.set(DataState::Idle);
        if !batch.is_empty() {
            tracing::trace!(updates = batch.len(), "snapshot replaced");
            self.updates.emit(&batch);
        }
    }
}
