//! Sources backed by a live store query.
//!
//! The store owns the items. The source re-runs the query on `reload`,
//! reads sections and objects straight from it, and turns the store's change
//! notifications into update batches, one batch per notification.
//!
//! An optional page loader only drives fetching: what it loads lands in the
//! store and reaches the source through change notifications. With a page
//! size of `usize::MAX` the page counter never advances.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dataview_core::{DataError, DataState, DataUpdate, IndexPath, UpdateBatch};
use dataview_runtime::{EventChannel, Observable, TaskGuard, UiExecutor};
use futures::StreamExt;
use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;

use super::paged::PageRequest;
use crate::config::PagingConfig;
use crate::source::ResultSource;

/// One object- or section-level change reported by the store.
///
/// Positions are sequential: each is interpreted against the collection as
/// it stands after the previous changes of the same [`ChangeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// An object was inserted.
    Insert {
        /// Where it now lives.
        new: Option<IndexPath>,
    },
    /// An object was deleted.
    Delete {
        /// Where it lived.
        old: Option<IndexPath>,
    },
    /// An object changed in place.
    Update {
        /// Where it lives.
        at: Option<IndexPath>,
    },
    /// An object moved.
    Move {
        /// Where it lived.
        old: Option<IndexPath>,
        /// Where it now lives.
        new: Option<IndexPath>,
    },
    /// A section was inserted.
    SectionInsert(usize),
    /// A section was deleted.
    SectionDelete(usize),
}

/// The changes of one store notification cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Changes in application order.
    pub changes: Vec<StoreChange>,
}

impl ChangeSet {
    /// Wrap a list of changes.
    pub fn new(changes: impl IntoIterator<Item = StoreChange>) -> Self {
        Self {
            changes: changes.into_iter().collect(),
        }
    }

    /// Translate into an update batch.
    ///
    /// Section changes, and object changes without the positions they need,
    /// cannot be expressed per item; they turn the whole set into `[All]`.
    #[must_use]
    pub fn to_batch(&self) -> UpdateBatch {
        let mut batch = UpdateBatch::new();
        for change in &self.changes {
            let update = match *change {
                StoreChange::Insert { new: Some(at) } => DataUpdate::Insert(at),
                StoreChange::Delete { old: Some(at) } => DataUpdate::Delete(at),
                StoreChange::Update { at: Some(at) } => DataUpdate::Update(at),
                StoreChange::Move {
                    old: Some(from),
                    new: Some(to),
                } => DataUpdate::Move { from, to },
                _ => return UpdateBatch::all(),
            };
            batch.push(update);
        }
        batch
    }
}

/// The store query collaborator.
pub trait LiveQuery<T> {
    /// Execute the query, refreshing the fetched objects.
    fn perform_fetch(&self) -> Result<(), DataError>;

    /// Number of result sections.
    fn number_of_sections(&self) -> usize;

    /// Number of objects in `section`.
    fn number_of_items_in_section(&self, section: usize) -> usize;

    /// Object at a position.
    fn object_at(&self, position: IndexPath) -> Option<T>;

    /// Every fetched object in order.
    fn fetched_objects(&self) -> Vec<T>;

    /// Change notifications, one item per notification cycle.
    fn changes(&self) -> LocalBoxStream<'static, ChangeSet>;
}

/// Loader that fetches a page into the store and reports how many objects
/// it received.
pub type StorePageLoader = Box<dyn Fn(PageRequest) -> LocalBoxFuture<'static, Result<usize, DataError>>>;

struct Cursor {
    page: Cell<usize>,
    finished: Cell<bool>,
}

pub(crate) struct LiveQuerySource<T> {
    query: Rc<dyn LiveQuery<T>>,
    state: Observable<DataState>,
    updates: EventChannel<UpdateBatch>,
    cursor: Rc<Cursor>,
    config: PagingConfig,
    loader: Option<StorePageLoader>,
    executor: UiExecutor,
    load_task: RefCell<TaskGuard>,
    _changes_task: TaskGuard,
}

impl<T: 'static> LiveQuerySource<T> {
    /// Start listening for changes and perform the first fetch.
    pub(crate) fn new(
        executor: UiExecutor,
        query: Rc<dyn LiveQuery<T>>,
        config: PagingConfig,
        loader: Option<StorePageLoader>,
    ) -> Self {
        let updates = EventChannel::new();
        let mut changes = query.changes();
        let channel = updates.clone();
        let changes_task = executor.spawn(async move {
            while let Some(set) = changes.next().await {
                let batch = set.to_batch();
                if !batch.is_empty() {
                    tracing::trace!(updates = batch.len(), "store changed");
                    channel.emit(&batch);
                }
            }
        });
        let source = Self {
            query,
            state: Observable::new(DataState::None),
            updates,
            cursor: Rc::new(Cursor {
                page: Cell::new(1),
                finished: Cell::new(false),
            }),
            config: config.sanitized(),
            loader,
            executor,
            load_task: RefCell::new(TaskGuard::none()),
            _changes_task: changes_task,
        };
        source.reload();
        source
    }
}

impl<T: 'static> ResultSource<T> for LiveQuerySource<T> {
    fn state(&self) -> &Observable<DataState> {
        &self.state
    }

    fn updates(&self) -> &EventChannel<UpdateBatch> {
        &self.updates
    }

    fn number_of_sections(&self) -> usize {
        self.query.number_of_sections()
    }

    fn number_of_items_in_section(&self, section: usize) -> usize {
        self.query.number_of_items_in_section(section)
    }

    fn item_at(&self, position: IndexPath) -> Option<T> {
        self.query.object_at(position)
    }

    fn reload(&self) {
        if self.state.with(DataState::is_loading) {
            tracing::trace!("reload skipped: already loading");
            return;
        }
        self.load_task.borrow_mut().cancel();
        self.cursor.finished.set(false);
        self.cursor.page.set(1);
        self.state.set(DataState::None);

        if let Err(error) = self.query.perform_fetch() {
            tracing::warn!(%error, "store fetch failed");
            self.state.set(DataState::Error(error));
            return;
        }
        if self.loader.is_none() {
            self.state.set(DataState::Idle);
        }
        self.updates.emit(&UpdateBatch::all());
        self.load_more();
    }

    fn load_more(&self) {
        let Some(loader) = &self.loader else {
            return;
        };
        if !self.can_load_more() {
            tracing::trace!("load_more skipped");
            return;
        }
        let request = PageRequest {
            page: self.cursor.page.get(),
            page_size: self.config.page_size,
        };
        self.state.set(DataState::Loading);
        tracing::debug!(page = request.page, "loading store page");

        let page = loader(request);
        let state = self.state.clone();
        let cursor = Rc::clone(&self.cursor);
        let paginated = self.config.is_paginated();
        let task = self.executor.spawn(async move {
            match page.await {
                Ok(received) => {
                    cursor.finished.set(received < request.page_size);
                    if paginated {
                        cursor.page.set(request.page + 1);
                    }
                    state.set(DataState::Idle);
                }
                Err(error) => {
                    tracing::warn!(%error, "store page load failed");
                    state.set(DataState::Error(error));
                }
            }
        });
        *self.load_task.borrow_mut() = task;
    }

    fn can_load_more(&self) -> bool {
        self.loader.is_some()
            && !self.cursor.finished.get()
            && self.state.with(|s| !s.is_loading() && !s.is_error())
    }

    fn values(&self) -> Vec<T> {
        self.query.fetched_objects()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_changes_translate_in_order() {
        let set = ChangeSet::new([
            StoreChange::Delete {
                old: Some(IndexPath::flat(0)),
            },
            StoreChange::Move {
                old: Some(IndexPath::flat(1)),
                new: Some(IndexPath::flat(0)),
            },
            StoreChange::Update {
                at: Some(IndexPath::flat(1)),
            },
        ]);
        assert_eq!(
            set.to_batch().as_slice(),
            &[
                DataUpdate::Delete(IndexPath::flat(0)),
                DataUpdate::Move {
                    from: IndexPath::flat(1),
                    to: IndexPath::flat(0)
                },
                DataUpdate::Update(IndexPath::flat(1)),
            ]
        );
    }

    #[test]
    fn section_change_is_full_reload() {
        let set = ChangeSet::new([
            StoreChange::Insert {
                new: Some(IndexPath::flat(0)),
            },
            StoreChange::SectionInsert(1),
        ]);
        assert!(set.to_batch().is_reload());
    }

    #[test]
    fn missing_position_is_full_reload() {
        let set = ChangeSet::new([StoreChange::Insert { new: None }]);
        assert_eq!(set.to_batch(), UpdateBatch::all());
    }
}
