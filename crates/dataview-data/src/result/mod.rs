//! Result sources and the [`DataResult`] handle.
//!
//! Each strategy lives in its own module and implements
//! [`ResultSource`](crate::ResultSource); the factories on [`DataResult`]
//! are the only way to construct one.
//!
//! | Factory | Strategy | `reload` | `load_more` |
//! |---------|----------|----------|-------------|
//! | [`from_vec`](DataResult::from_vec), [`empty`](DataResult::empty) | fixed list | no-op | no-op |
//! | [`from_future`](DataResult::from_future), [`from_stream`](DataResult::from_stream) | async snapshots | restart | no-op |
//! | [`paged`](DataResult::paged) | page loader | page 1 | next page |
//! | [`live_query`](DataResult::live_query) | store query | re-fetch | next store page |
//! | [`combine`](DataResult::combine) | concatenation | every child | last child |
//! | [`map`](DataResult::map) | per-access transform | forwarded | forwarded |
//!
//! Async strategies start loading as soon as they are created. Dropping the
//! last handle to a source aborts its running operation.

pub(crate) mod array;
pub(crate) mod combine;
pub(crate) mod flat_map;
pub mod live_query;
pub(crate) mod map;
pub mod paged;
pub(crate) mod snapshot;
pub(crate) mod stream;

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use dataview_core::{DataError, DataState, IndexPath, Uniq, UpdateBatch};
use dataview_runtime::{EventChannel, Observable, UiExecutor};
use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;
use futures::{FutureExt, StreamExt};

use crate::config::PagingConfig;
use crate::source::ResultSource;
use live_query::{LiveQuery, StorePageLoader};
use paged::PageRequest;

/// A future resolving to a whole snapshot.
pub type SnapshotFuture<T> = LocalBoxFuture<'static, Result<Vec<T>, DataError>>;

/// A stream of successive snapshots.
pub type SnapshotStream<T> = LocalBoxStream<'static, Result<Vec<T>, DataError>>;

/// Cloneable handle onto a result source.
///
/// Clones share the same source.
pub struct DataResult<T> {
    source: Rc<dyn ResultSource<T>>,
}

impl<T> Clone for DataResult<T> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
        }
    }
}

impl<T: 'static> DataResult<T> {
    /// Wrap any source implementation.
    pub fn from_source(source: impl ResultSource<T> + 'static) -> Self {
        Self {
            source: Rc::new(source),
        }
    }

    /// The shared source behind this handle.
    #[must_use]
    pub fn as_source(&self) -> Rc<dyn ResultSource<T>> {
        Rc::clone(&self.source)
    }

    /// Concatenate `results` end to end.
    pub fn combine(results: impl IntoIterator<Item = DataResult<T>>) -> Self {
        let children = results.into_iter().map(|r| r.source).collect();
        Self::from_source(combine::CombineSource::new(children))
    }

    /// A source over a live store query.
    ///
    /// Without a `loader` the query is the only data path and `load_more` is
    /// a no-op. With one, pages are fetched into the store per `paging`.
    pub fn live_query(
        executor: UiExecutor,
        query: Rc<dyn LiveQuery<T>>,
        paging: PagingConfig,
        loader: Option<StorePageLoader>,
    ) -> Self {
        Self::from_source(live_query::LiveQuerySource::new(
            executor, query, paging, loader,
        ))
    }

    /// Items transformed by `map` on every access.
    #[must_use]
    pub fn map<U: 'static>(&self, map: impl Fn(T) -> U + 'static) -> DataResult<U> {
        DataResult::from_source(map::MapSource::new(self.as_source(), map))
    }

    /// Current load state.
    #[must_use]
    pub fn state(&self) -> &Observable<DataState> {
        self.source.state()
    }

    /// Update batch channel.
    #[must_use]
    pub fn updates(&self) -> &EventChannel<UpdateBatch> {
        self.source.updates()
    }

    /// Total number of items.
    #[must_use]
    pub fn count(&self) -> usize {
        self.source.count()
    }

    /// Number of sections.
    #[must_use]
    pub fn number_of_sections(&self) -> usize {
        self.source.number_of_sections()
    }

    /// Number of items in `section`.
    #[must_use]
    pub fn number_of_items_in_section(&self, section: usize) -> usize {
        self.source.number_of_items_in_section(section)
    }

    /// Item at a flat index.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<T> {
        self.source.item(index)
    }

    /// Item at a position.
    #[must_use]
    pub fn item_at(&self, position: IndexPath) -> Option<T> {
        self.source.item_at(position)
    }

    /// Full current snapshot.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.source.values()
    }

    /// Restart loading. No-op while loading.
    pub fn reload(&self) {
        self.source.reload();
    }

    /// Load the next page, when there is one.
    pub fn load_more(&self) {
        self.source.load_more();
    }

    /// Whether `load_more` would start a request.
    #[must_use]
    pub fn can_load_more(&self) -> bool {
        self.source.can_load_more()
    }
}

impl<T: Clone + 'static> DataResult<T> {
    /// A fixed list. Always `Idle`.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::from_source(array::StaticSource::new(items))
    }

    /// A fixed empty list.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl<T: Uniq + PartialEq + Clone + 'static> DataResult<T> {
    /// A snapshot produced by one future, re-run on `reload`.
    pub fn from_future<F>(executor: UiExecutor, start: impl Fn() -> F + 'static) -> Self
    where
        F: Future<Output = Result<Vec<T>, DataError>> + 'static,
    {
        Self::from_stream(executor, move || {
            StreamExt::boxed_local(FutureExt::into_stream(start()))
        })
    }

    /// Successive snapshots from a stream, restarted on `reload`.
    pub fn from_stream(executor: UiExecutor, start: impl Fn() -> SnapshotStream<T> + 'static) -> Self {
        Self::from_source(stream::StreamSource::new(executor, start))
    }

    /// Pages from `loader`, appended and diffed as they arrive.
    pub fn paged<F>(
        executor: UiExecutor,
        paging: PagingConfig,
        loader: impl Fn(PageRequest) -> F + 'static,
    ) -> Self
    where
        F: Future<Output = Result<Vec<T>, DataError>> + 'static,
    {
        Self::from_source(paged::PagedSource::new(executor, paging, move |request| {
            FutureExt::boxed_local(loader(request))
        }))
    }
}

impl<T: 'static> ResultSource<T> for DataResult<T> {
    fn state(&self) -> &Observable<DataState> {
        self.source.state()
    }

    fn updates(&self) -> &EventChannel<UpdateBatch> {
        self.source.updates()
    }

    fn number_of_sections(&self) -> usize {
        self.source.number_of_sections()
    }

    fn number_of_items_in_section(&self, section: usize) -> usize {
        self.source.number_of_items_in_section(section)
    }

    fn item_at(&self, position: IndexPath) -> Option<T> {
        self.source.item_at(position)
    }

    fn reload(&self) {
        self.source.reload();
    }

    fn load_more(&self) {
        self.source.load_more();
    }

    fn can_load_more(&self) -> bool {
        self.source.can_load_more()
    }

    fn count(&self) -> usize {
        self.source.count()
    }

    fn item(&self, index: usize) -> Option<T> {
        self.source.item(index)
    }

    fn values(&self) -> Vec<T> {
        self.source.values()
    }
}

impl<T: 'static> fmt::Debug for DataResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataResult")
            .field("state", &self.source.state().get())
            .field("count", &self.source.count())
            .finish()
    }
}
