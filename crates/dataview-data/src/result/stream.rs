//! Async snapshot sources.
//!
//! The operation yields one or more successive snapshots. Each one is diffed
//! against the current items and announced as a batch. A plain future is a
//! stream of one.
//!
//! `reload` drops the running operation, clears the items (announcing
//! `[All]` if there were any), and starts the operation again.

use std::cell::RefCell;
use std::rc::Rc;

use dataview_core::{DataState, IndexPath, Uniq, UpdateBatch};
use dataview_runtime::{EventChannel, Observable, TaskGuard, UiExecutor};
use futures::StreamExt;

use super::SnapshotStream;
use super::snapshot::SnapshotCore;
use crate::source::ResultSource;

pub(crate) struct StreamSource<T> {
    core: Rc<SnapshotCore<T>>,
    start: Box<dyn Fn() -> SnapshotStream<T>>,
    executor: UiExecutor,
    task: RefCell<TaskGuard>,
}

impl<T: Uniq + PartialEq + Clone + 'static> StreamSource<T> {
    /// Create the source and start the first load.
    pub(crate) fn new(executor: UiExecutor, start: impl Fn() -> SnapshotStream<T> + 'static) -> Self {
        let source = Self {
            core: Rc::new(SnapshotCore::new(Vec::new(), DataState::None)),
            start: Box::new(start),
            executor,
            task: RefCell::new(TaskGuard::none()),
        };
        source.reload();
        source
    }
}

async fn consume<T: Uniq + PartialEq + Clone + 'static>(
    core: Rc<SnapshotCore<T>>,
    mut snapshots: SnapshotStream<T>,
) {
    while let Some(next) = snapshots.next().await {
        match next {
            Ok(items) => core.replace(items),
            Err(error) => {
                core.fail(error);
                return;
            }
        }
    }
    if core.is_loading() {
        core.state.set(DataState::Idle);
    }
}

impl<T: Uniq + PartialEq + Clone + 'static> ResultSource<T> for StreamSource<T> {
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

    fn reload(&self) {
        if self.core.is_loading() {
            tracing::trace!("reload skipped: already loading");
            return;
        }
        self.task.borrow_mut().cancel();
        self.core.state.set(DataState::Loading);
        self.core.clear();
        tracing::debug!("reload dispatched");

        let snapshots = (self.start)();
        let task = self
            .executor
            .spawn(consume(Rc::clone(&self.core), snapshots));
        *self.task.borrow_mut() = task;
    }

    fn load_more(&self) {}

    fn item(&self, index: usize) -> Option<T> {
        self.core.get(IndexPath::flat(index))
    }

    fn values(&self) -> Vec<T> {
        self.core.to_vec()
    }
}
