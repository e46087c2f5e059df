//! Projected views over result sources.
//!
//! A [`DataView`] adds presentation state on top of a source: derived
//! empty/loading flags and a [`SelectionSet`] that follows the items through
//! every update batch. Composition (`map`, `cached`) builds a new view over
//! a new source without touching the original.
//!
//! # Invariants
//!
//! 1. Flags are refreshed on every state change and every update batch, so
//!    they are consistent with `count()` by the time a batch listener runs
//!    after the view's own listener.
//! 2. The selection is re-derived with the shift rules of
//!    [`SelectionSet::apply`] before the view's subscribers see the batch on
//!    the selection observable; `[All]` clears it.
//! 3. A view owns its subscriptions. Dropping the last clone releases them;
//!    the source never holds a reference back to the view.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `select_many` with several positions | single-selection mode | `Err(SelectionError)`, selection untouched |
//! | Out-of-range read | stale position | `None` |

mod cached;

use std::fmt;
use std::rc::Rc;

use dataview_core::{DataState, IndexPath, SelectionError, SelectionSet, UpdateBatch};
use dataview_runtime::{BindingScope, EventChannel, Observable};

use crate::result::DataResult;
use crate::result::map::MapSource;
use crate::source::ResultSource;
use cached::CachedSource;

struct ViewInner<T> {
    source: Rc<dyn ResultSource<T>>,
    selection: Observable<SelectionSet>,
    is_empty: Observable<bool>,
    is_loading: Observable<bool>,
    is_empty_and_loading: Observable<bool>,
    _scope: BindingScope,
}

/// Presentation wrapper around a result source.
///
/// Clones share the same flags and selection.
pub struct DataView<T> {
    inner: Rc<ViewInner<T>>,
}

impl<T> Clone for DataView<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

#[derive(Clone)]
struct Flags {
    is_empty: Observable<bool>,
    is_loading: Observable<bool>,
    is_empty_and_loading: Observable<bool>,
}

impl Flags {
    fn refresh<T>(&self, source: &dyn ResultSource<T>) {
        let empty = source.count() == 0;
        let loading = source.state().with(DataState::is_loading);
        self.is_empty.set(empty);
        self.is_loading.set(loading);
        self.is_empty_and_loading.set(empty && loading);
    }
}

impl<T: 'static> DataView<T> {
    /// A view over `result`.
    #[must_use]
    pub fn new(result: DataResult<T>) -> Self {
        Self::from_source(result.as_source())
    }

    /// A view over any shared source.
    #[must_use]
    pub fn from_source(source: Rc<dyn ResultSource<T>>) -> Self {
        let flags = Flags {
            is_empty: Observable::new(true),
            is_loading: Observable::new(false),
            is_empty_and_loading: Observable::new(false),
        };
        flags.refresh(source.as_ref());
        let selection = Observable::new(SelectionSet::new());

        let mut scope = BindingScope::new();
        {
            let (flags, source_ref) = (flags.clone(), Rc::clone(&source));
            scope.subscribe(source.state(), move |_| flags.refresh(source_ref.as_ref()));
        }
        {
            let (flags, source_ref) = (flags.clone(), Rc::clone(&source));
            let selection = selection.clone();
            scope.listen(source.updates(), move |batch: &UpdateBatch| {
                if batch.is_reload() && selection.with(|s| !s.is_empty()) {
                    tracing::trace!("selection cleared by full reload");
                }
                selection.update(|s| s.apply_batch(batch));
                flags.refresh(source_ref.as_ref());
            });
        }

        Self {
            inner: Rc::new(ViewInner {
                source,
                selection,
                is_empty: flags.is_empty,
                is_loading: flags.is_loading,
                is_empty_and_loading: flags.is_empty_and_loading,
                _scope: scope,
            }),
        }
    }

    /// The source this view projects.
    #[must_use]
    pub fn as_source(&self) -> Rc<dyn ResultSource<T>> {
        Rc::clone(&self.inner.source)
    }

    /// A view whose items are `map` applied on every access.
    ///
    /// The new view has its own selection.
    #[must_use]
    pub fn map<U: 'static>(&self, map: impl Fn(T) -> U + 'static) -> DataView<U> {
        DataView::from_source(Rc::new(MapSource::new(self.as_source(), map)))
    }

    // -----------------------------------------------------------------------
    // Source access
    // -----------------------------------------------------------------------

    /// Load state of the source.
    #[must_use]
    pub fn state(&self) -> &Observable<DataState> {
        self.inner.source.state()
    }

    /// Update batches of the source.
    #[must_use]
    pub fn updates(&self) -> &EventChannel<UpdateBatch> {
        self.inner.source.updates()
    }

    /// Total number of items.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.source.count()
    }

    /// Number of sections.
    #[must_use]
    pub fn number_of_sections(&self) -> usize {
        self.inner.source.number_of_sections()
    }

    /// Number of items in `section`.
    #[must_use]
    pub fn number_of_items_in_section(&self, section: usize) -> usize {
        self.inner.source.number_of_items_in_section(section)
    }

    /// Item at a flat index.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<T> {
        self.inner.source.item(index)
    }

    /// Item at a position.
    #[must_use]
    pub fn item_at(&self, position: IndexPath) -> Option<T> {
        self.inner.source.item_at(position)
    }

    /// Every item in order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.inner.source.values()
    }

    /// Reload the source.
    pub fn reload(&self) {
        self.inner.source.reload();
    }

    /// Ask the source for its next page.
    pub fn load_more(&self) {
        self.inner.source.load_more();
    }

    /// Whether `load_more` would start a request.
    #[must_use]
    pub fn can_load_more(&self) -> bool {
        self.inner.source.can_load_more()
    }

    // -----------------------------------------------------------------------
    // Derived flags
    // -----------------------------------------------------------------------

    /// `true` while the source has no items.
    #[must_use]
    pub fn is_empty(&self) -> &Observable<bool> {
        &self.inner.is_empty
    }

    /// `true` while the source is loading.
    #[must_use]
    pub fn is_loading(&self) -> &Observable<bool> {
        &self.inner.is_loading
    }

    /// `true` while the source has no items and is loading.
    #[must_use]
    pub fn is_empty_and_loading(&self) -> &Observable<bool> {
        &self.inner.is_empty_and_loading
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// The selection, as an observable.
    #[must_use]
    pub fn selection(&self) -> &Observable<SelectionSet> {
        &self.inner.selection
    }

    /// Selected positions in selection order.
    #[must_use]
    pub fn selected(&self) -> Vec<IndexPath> {
        self.inner.selection.with(SelectionSet::to_vec)
    }

    /// Items at the selected positions, skipping any that no longer resolve.
    #[must_use]
    pub fn selected_items(&self) -> Vec<T> {
        self.selected()
            .into_iter()
            .filter_map(|position| self.item_at(position))
            .collect()
    }

    /// Whether `position` is selected.
    #[must_use]
    pub fn is_selected(&self, position: IndexPath) -> bool {
        self.inner.selection.with(|s| s.contains(position))
    }

    /// Whether multi-selection is enabled.
    #[must_use]
    pub fn allows_multiple_selection(&self) -> bool {
        self.inner.selection.with(SelectionSet::allows_multiple)
    }

    /// Enable or disable multi-selection. Disabling keeps the latest pick.
    pub fn set_allows_multiple_selection(&self, multiple: bool) {
        self.inner
            .selection
            .update(|s| s.set_allows_multiple(multiple));
    }

    /// Select `position`. Returns `false` if it was already selected.
    pub fn select(&self, position: IndexPath) -> bool {
        let mut changed = false;
        self.inner
            .selection
            .update(|s| changed = s.select(position));
        changed
    }

    /// Select several positions at once.
    pub fn select_many(
        &self,
        positions: impl IntoIterator<Item = IndexPath>,
    ) -> Result<bool, SelectionError> {
        let mut outcome = Ok(false);
        self.inner
            .selection
            .update(|s| outcome = s.select_many(positions));
        outcome
    }

    /// Deselect `position`. Returns `false` if it was not selected.
    pub fn deselect(&self, position: IndexPath) -> bool {
        let mut changed = false;
        self.inner
            .selection
            .update(|s| changed = s.deselect(position));
        changed
    }

    /// Clear the selection.
    pub fn reset_selection(&self) -> bool {
        let mut changed = false;
        self.inner.selection.update(|s| changed = s.reset());
        changed
    }
}

impl<T: Clone + 'static> DataView<T> {
    /// A view that memoizes every item it hands out by position.
    ///
    /// Memoized values follow inserts, deletes and moves; only positions an
    /// update actually touches are dropped. `[All]` drops everything.
    #[must_use]
    pub fn cached(&self) -> DataView<T> {
        DataView::from_source(Rc::new(CachedSource::new(self.as_source())))
    }
}

impl<T: 'static> From<DataResult<T>> for DataView<T> {
    fn from(result: DataResult<T>) -> Self {
        Self::new(result)
    }
}

impl<T: 'static> ResultSource<T> for DataView<T> {
    fn state(&self) -> &Observable<DataState> {
        self.inner.source.state()
    }

    fn updates(&self) -> &EventChannel<UpdateBatch> {
        self.inner.source.updates()
    }

    fn number_of_sections(&self) -> usize {
        self.inner.source.number_of_sections()
    }

    fn number_of_items_in_section(&self, section: usize) -> usize {
        self.inner.source.number_of_items_in_section(section)
    }

    fn item_at(&self, position: IndexPath) -> Option<T> {
        self.inner.source.item_at(position)
    }

    fn reload(&self) {
        self.inner.source.reload();
    }

    fn load_more(&self) {
        self.inner.source.load_more();
    }

    fn can_load_more(&self) -> bool {
        self.inner.source.can_load_more()
    }

    fn count(&self) -> usize {
        self.inner.source.count()
    }
}

impl<T: 'static> fmt::Debug for DataView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataView")
            .field("state", &self.state().get())
            .field("count", &self.count())
            .field("selected", &self.selected())
            .finish()
    }
}
