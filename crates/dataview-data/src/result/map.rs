//! Lazy item mapping.

use std::rc::Rc;

use dataview_core::{DataState, IndexPath, UpdateBatch};
use dataview_runtime::{EventChannel, Observable};

use crate::source::ResultSource;

/// Applies `map` on every access. State, batches and positions are the
/// inner source's own.
pub(crate) struct MapSource<S, T> {
    inner: Rc<dyn ResultSource<S>>,
    map: Rc<dyn Fn(S) -> T>,
}

impl<S, T> MapSource<S, T> {
    pub(crate) fn new(inner: Rc<dyn ResultSource<S>>, map: impl Fn(S) -> T + 'static) -> Self {
        Self {
            inner,
            map: Rc::new(map),
        }
    }
}

impl<S, T> ResultSource<T> for MapSource<S, T> {
    fn state(&self) -> &Observable<DataState> {
        self.inner.state()
    }

    fn updates(&self) -> &EventChannel<UpdateBatch> {
        self.inner.updates()
    }

    fn number_of_sections(&self) -> usize {
        self.inner.number_of_sections()
    }

    fn number_of_items_in_section(&self, section: usize) -> usize {
        self.inner.number_of_items_in_section(section)
    }

    fn item_at(&self, position: IndexPath) -> Option<T> {
        self.inner.item_at(position).map(|item| (self.map)(item))
    }

    fn reload(&self) {
        self.inner.reload();
    }

    fn load_more(&self) {
        self.inner.load_more();
    }

    fn can_load_more(&self) -> bool {
        self.inner.can_load_more()
    }

    fn count(&self) -> usize {
        self.inner.count()
    }

    fn item(&self, index: usize) -> Option<T> {
        self.inner.item(index).map(|item| (self.map)(item))
    }

    fn values(&self) -> Vec<T> {
        self.inner.values().into_iter().map(|item| (self.map)(item)).collect()
    }
}
