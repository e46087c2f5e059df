//! Single-value results.

use std::future::Future;
use std::rc::Rc;

use dataview_core::{DataError, DataState};
use dataview_runtime::{Binding, Observable, TaskGuard, UiExecutor, bind_mapped};

use crate::result::DataResult;
use crate::result::flat_map::FlatMapSource;

struct SingleInner<T> {
    item: Observable<Option<T>>,
    state: Observable<DataState>,
    _task: TaskGuard,
}

/// One asynchronously produced value.
///
/// Loading starts at construction. The value stays `None` until the
/// operation succeeds; a failure leaves it unset and moves to `Error`.
pub struct DataSingleResult<T> {
    inner: Rc<SingleInner<T>>,
}

impl<T> Clone for DataSingleResult<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> DataSingleResult<T> {
    /// Run `operation` on `executor` and publish its result.
    pub fn new(
        executor: &UiExecutor,
        operation: impl Future<Output = Result<T, DataError>> + 'static,
    ) -> Self {
        let item = Observable::new(None);
        let state = Observable::new(DataState::Loading);
        let task = {
            let (item, state) = (item.clone(), state.clone());
            executor.spawn(async move {
                match operation.await {
                    Ok(value) => {
                        item.set(Some(value));
                        state.set(DataState::Idle);
                    }
                    Err(error) => {
                        tracing::warn!(%error, "single value load failed");
                        state.set(DataState::Error(error));
                    }
                }
            })
        };
        Self {
            inner: Rc::new(SingleInner {
                item,
                state,
                _task: task,
            }),
        }
    }

    /// The value, once loaded.
    #[must_use]
    pub fn item(&self) -> &Observable<Option<T>> {
        &self.inner.item
    }

    /// Load state.
    #[must_use]
    pub fn state(&self) -> &Observable<DataState> {
        &self.inner.state
    }

    /// Whether the operation is still running.
    #[must_use]
    pub fn is_loading(&self) -> Binding<bool> {
        bind_mapped(&self.inner.state, DataState::is_loading)
    }

    /// A source produced from the value once it arrives.
    ///
    /// Until then the source is empty. When the value arrives, `transform`
    /// builds the source that takes over and an `[All]` batch is emitted.
    pub fn flat_map<U: Clone + 'static>(
        &self,
        transform: impl Fn(T) -> DataResult<U> + 'static,
    ) -> DataResult<U> {
        DataResult::from_source(FlatMapSource::new(self.clone(), transform))
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for DataSingleResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSingleResult")
            .field("item", &self.inner.item)
            .field("state", &self.inner.state)
            .finish()
    }
}
