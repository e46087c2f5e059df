//! Page-at-a-time loading.
//!
//! # Invariants
//!
//! 1. Pages are numbered from 1. The counter advances only when a page
//!    arrives.
//! 2. A page with fewer than `page_size` items marks the source finished;
//!    `load_more` is then a no-op until `reload`.
//! 3. Each page is diffed against the whole accumulated snapshot
//!    (`old + page`), not announced as a bare append, so overlapping pages
//!    reconcile.
//! 4. `reload` clears the items (announcing `[All]` if any), resets the
//!    counter and the finished flag, leaves any error behind, and loads
//!    page 1.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Page load fails | `Error`; items kept; `load_more` refused until `reload` |
//! | Source dropped mid-load | Task aborted; the page is discarded |

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dataview_core::{DataState, IndexPath, Uniq, UpdateBatch};
use dataview_runtime::{EventChannel, Observable, TaskGuard, UiExecutor};

use super::SnapshotFuture;
use super::snapshot::SnapshotCore;
use crate::config::PagingConfig;
use crate::source::ResultSource;

/// Which page a loader is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: usize,
    /// Requested page length.
    pub page_size: usize,
}

impl PageRequest {
    /// Index of the first item of this page in the whole collection.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

struct PagedCore<T> {
    snapshot: SnapshotCore<T>,
    page: Cell<usize>,
    finished: Cell<bool>,
}

pub(crate) struct PagedSource<T> {
    core: Rc<PagedCore<T>>,
    config: PagingConfig,
    loader: Box<dyn Fn(PageRequest) -> SnapshotFuture<T>>,
    executor: UiExecutor,
    task: RefCell<TaskGuard>,
}

impl<T: Uniq + PartialEq + Clone + 'static> PagedSource<T> {
    /// Create the source and request page 1.
    pub(crate) fn new(
        executor: UiExecutor,
        config: PagingConfig,
        loader: impl Fn(PageRequest) -> SnapshotFuture<T> + 'static,
    ) -> Self {
        let source = Self {
            core: Rc::new(PagedCore {
                snapshot: SnapshotCore::new(Vec::new(), DataState::None),
                page: Cell::new(1),
                finished: Cell::new(false),
            }),
            config: config.sanitized(),
            loader: Box::new(loader),
            executor,
            task: RefCell::new(TaskGuard::none()),
        };
        source.reload();
        source
    }
}

async fn load_page<T: Uniq + PartialEq + Clone + 'static>(
    core: Rc<PagedCore<T>>,
    request: PageRequest,
    page: SnapshotFuture<T>,
) {
    match page.await {
        Ok(items) => {
            let finished = items.len() < request.page_size;
            core.finished.set(finished);
            if request.page_size < usize::MAX {
                core.page.set(request.page + 1);
            }
            tracing::debug!(page = request.page, len = items.len(), finished, "page loaded");
            let mut next = core.snapshot.to_vec();
            next.extend(items);
            core.snapshot.replace(next);
        }
        Err(error) => core.snapshot.fail(error),
    }
}

impl<T: Uniq + PartialEq + Clone + 'static> ResultSource<T> for PagedSource<T> {
    fn state(&self) -> &Observable<DataState> {
        &self.core.snapshot.state
    }

    fn updates(&self) -> &EventChannel<UpdateBatch> {
        &self.core.snapshot.updates
    }

    fn number_of_sections(&self) -> usize {
        1
    }

    fn number_of_items_in_section(&self, section: usize) -> usize {
        if section == 0 { self.core.snapshot.len() } else { 0 }
    }

    fn item_at(&self, position: IndexPath) -> Option<T> {
        self.core.snapshot.get(position)
    }

    fn reload(&self) {
        if self.core.snapshot.is_loading() {
            tracing::trace!("reload skipped: already loading");
            return;
        }
        self.task.borrow_mut().cancel();
        self.core.finished.set(false);
        self.core.page.set(1);
        self.core.snapshot.state.set(DataState::None);
        self.core.snapshot.clear();
        self.load_more();
    }

    fn load_more(&self) {
        if !self.can_load_more() {
            tracing::trace!(
                finished = self.core.finished.get(),
                state = ?self.core.snapshot.state.get(),
                "load_more skipped"
            );
            return;
        }
        let request = PageRequest {
            page: self.core.page.get(),
            page_size: self.config.page_size,
        };
        self.core.snapshot.state.set(DataState::Loading);
        tracing::debug!(page = request.page, page_size = request.page_size, "loading page");

        let page = (self.loader)(request);
        let task = self
            .executor
            .spawn(load_page(Rc::clone(&self.core), request, page));
        *self.task.borrow_mut() = task;
    }

    fn can_load_more(&self) -> bool {
        !self.core.finished.get()
            && !self.core.snapshot.is_loading()
            && !self.core.snapshot.is_error()
    }

    fn item(&self, index: usize) -> Option<T> {
        self.core.snapshot.get(IndexPath::flat(index))
    }

    fn values(&self) -> Vec<T> {
        self.core.snapshot.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_of_page() {
        let request = PageRequest {
            page: 3,
            page_size: 10,
        };
        assert_eq!(request.offset(), 20);
        let first = PageRequest {
            page: 1,
            page_size: usize::MAX,
        };
        assert_eq!(first.offset(), 0);
    }
}
