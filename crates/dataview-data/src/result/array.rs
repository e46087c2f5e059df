//! Fixed lists.

use dataview_core::{DataState, IndexPath, UpdateBatch};
use dataview_runtime::{EventChannel, Observable};

use super::snapshot::SnapshotCore;
use crate::source::ResultSource;

/// A snapshot that never changes. Always `Idle`.
pub(crate) struct StaticSource<T> {
    core: SnapshotCore<T>,
}

impl<T: Clone + 'static> StaticSource<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self {
            core: SnapshotCore::new(items, DataState::Idle),
        }
    }
}

impl<T: Clone + 'static> ResultSource<T> for StaticSource<T> {
    fn state(&self) -> &Observable<DataState> {
        &self.core.state
    }

    fn updates(&self) -> &EventChannel<UpdateBatch> {
        &self.core.updates
    }

    fn number_of_sections(&self) -> usize {
        1
    }

    fn number_of_items_in_section(&self, section: usize) -> usize {
        if section == 0 { self.core.len() } else { 0 }
    }

    fn item_at(&self, position: IndexPath) -> Option<T> {
        self.core.get(position)
    }

    fn reload(&self) {}

    fn load_more(&self) {}

    fn item(&self, index: usize) -> Option<T> {
        self.core.get(IndexPath::flat(index))
    }

    fn values(&self) -> Vec<T> {
        self.core.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_source_is_idle_and_indexable() {
        let source = StaticSource::new(vec!["a", "b"]);
        assert_eq!(source.state().get(), DataState::Idle);
        assert_eq!(source.count(), 2);
        assert_eq!(source.item(1), Some("b"));
        assert_eq!(source.item_at(IndexPath::new(1, 0)), None);
        assert_eq!(source.item(2), None);
        source.reload();
        source.load_more();
        assert_eq!(source.values(), vec!["a", "b"]);
    }
}
