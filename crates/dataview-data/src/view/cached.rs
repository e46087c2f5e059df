//! Memoized positional access.

use std::cell::RefCell;
use std::rc::Rc;

use dataview_core::{DataState, IndexPath, PositionCache, UpdateBatch};
use dataview_runtime::{EventChannel, Observable, Subscription};

use crate::source::ResultSource;

/// Wraps a source and remembers every item it hands out.
///
/// The cache follows the inner source's batches with the shift rules of
/// [`PositionCache`] and is re-indexed before the batch is re-emitted on
/// this source's own channel, so downstream listeners read a coherent
/// cache.
pub(crate) struct CachedSource<T> {
    inner: Rc<dyn ResultSource<T>>,
    cache: Rc<RefCell<PositionCache<T>>>,
    updates: EventChannel<UpdateBatch>,
    _subscription: Subscription,
}

impl<T: Clone + 'static> CachedSource<T> {
    pub(crate) fn new(inner: Rc<dyn ResultSource<T>>) -> Self {
        let cache = Rc::new(RefCell::new(PositionCache::new()));
        let updates = EventChannel::new();
        let subscription = {
            let (cache, channel) = (Rc::clone(&cache), updates.clone());
            inner.updates().subscribe(move |batch: &UpdateBatch| {
                cache.borrow_mut().apply_batch(batch);
                channel.emit(batch);
            })
        };
        Self {
            inner,
            cache,
            updates,
            _subscription: subscription,
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<T: Clone + 'static> ResultSource<T> for CachedSource<T> {
    fn state(&self) -> &Observable<DataState> {
        self.inner.state()
    }

    fn updates(&self) -> &EventChannel<UpdateBatch> {
        &self.updates
    }

    fn number_of_sections(&self) -> usize {
        self.inner.number_of_sections()
    }

    fn number_of_items_in_section(&self, section: usize) -> usize {
        self.inner.number_of_items_in_section(section)
    }

    fn item_at(&self, position: IndexPath) -> Option<T> {
        if let Some(hit) = self.cache.borrow().get(position) {
            return Some(hit.clone());
        }
        let value = self.inner.item_at(position)?;
        self.cache.borrow_mut().insert(position, value.clone());
        Some(value)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::DataResult;
    use std::cell::Cell;

    #[test]
    fn values_are_computed_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mapped = DataResult::from_vec(vec![1, 2, 3]).map(move |v: i32| {
            counter.set(counter.get() + 1);
            Rc::new(v * 10)
        });
        let cached = CachedSource::new(mapped.as_source());

        let first = cached.item(1).unwrap();
        let again = cached.item(1).unwrap();
        assert!(Rc::ptr_eq(&first, &again));
        assert_eq!(calls.get(), 1);

        assert_eq!(cached.values().len(), 3);
        assert_eq!(calls.get(), 3);
        assert_eq!(cached.cached_len(), 3);
    }

    #[test]
    fn cache_follows_batches_before_reemitting() {
        let source = DataResult::from_vec(vec!["a", "b", "c"]);
        let cached = Rc::new(CachedSource::new(source.as_source()));
        for i in 0..3 {
            cached.item(i);
        }
        let seen = Rc::new(Cell::new(0usize));
        let watch = {
            let (reader, seen) = (Rc::clone(&cached), Rc::clone(&seen));
            cached
                .updates()
                .subscribe(move |_| seen.set(reader.cached_len()))
        };
        source
            .updates()
            .emit(&UpdateBatch::from_updates([dataview_core::DataUpdate::Delete(
                IndexPath::flat(0),
            )]));
        assert_eq!(seen.get(), 2);
        drop(watch);
    }
}
