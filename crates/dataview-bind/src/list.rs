//! Table and collection widgets.
//!
//! A [`ListBinding`] listens to a [`DataView`] and replays every update batch
//! onto a [`ListWidget`]. The widget reads counts and cells back through the
//! binding, so it always sees the snapshot the batch describes.
//!
//! # Invariants
//!
//! 1. `[All]` becomes one `reload_data`. Any other non-empty batch becomes
//!    `begin_updates`, one call per update in batch order, `end_updates`.
//! 2. After [`detach`](ListBinding::detach) (or drop) the widget has been
//!    reloaded against an empty source and receives nothing further.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `All` mixed into a longer batch | producer bug | logged, full reload |
//! | Widget already borrowed | widget re-entered the binding from a callback | batch dropped, logged |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use dataview_core::{DataUpdate, IndexPath, UpdateBatch};
use dataview_data::{DataResult, DataView, PagingConfig};
use dataview_runtime::BindingScope;

/// Row operations of a table or collection widget.
pub trait ListWidget {
    /// What the widget displays for one item.
    type Cell;

    /// Throw away every row and ask the data source again.
    fn reload_data(&mut self);

    /// Open a group of row operations animated together.
    fn begin_updates(&mut self);

    fn insert_row(&mut self, at: IndexPath);

    fn delete_row(&mut self, at: IndexPath);

    fn reload_row(&mut self, at: IndexPath);

    fn move_row(&mut self, from: IndexPath, to: IndexPath);

    /// Close the group opened by `begin_updates`.
    fn end_updates(&mut self);
}

/// Replay one batch onto `widget`.
pub fn apply_updates<W: ListWidget + ?Sized>(widget: &mut W, updates: &[DataUpdate]) {
    match updates {
        [] => {}
        [DataUpdate::All] => widget.reload_data(),
        _ if updates.contains(&DataUpdate::All) => {
            tracing::warn!(len = updates.len(), "full reload mixed into a batch; reloading");
            widget.reload_data();
        }
        _ => {
            widget.begin_updates();
            for update in updates {
                match *update {
                    DataUpdate::Insert(at) => widget.insert_row(at),
                    DataUpdate::Delete(at) => widget.delete_row(at),
                    DataUpdate::Update(at) => widget.reload_row(at),
                    DataUpdate::Move { from, to } => widget.move_row(from, to),
                    DataUpdate::All => {}
                }
            }
            widget.end_updates();
        }
    }
}

type CellFactory<T, C> = Box<dyn Fn(IndexPath, T) -> C>;

/// Drives a [`ListWidget`] from a [`DataView`].
pub struct ListBinding<T, W: ListWidget> {
    widget: Rc<RefCell<W>>,
    view: DataView<T>,
    cells: CellFactory<T, W::Cell>,
    paging: PagingConfig,
    scope: BindingScope,
}

impl<T: Clone + 'static, W: ListWidget + 'static> ListBinding<T, W> {
    /// Bind `view` to `widget` and reload the widget once.
    pub fn bind(
        widget: Rc<RefCell<W>>,
        view: DataView<T>,
        cells: impl Fn(IndexPath, T) -> W::Cell + 'static,
    ) -> Self {
        let target = Rc::clone(&widget);
        let mut scope = BindingScope::new();
        scope.listen(view.updates(), move |batch: &UpdateBatch| {
            match target.try_borrow_mut() {
                Ok(mut widget) => apply_updates(&mut *widget, batch.as_slice()),
                Err(_) => tracing::warn!(len = batch.len(), "list widget busy; batch dropped"),
            }
        });
        let binding = Self {
            widget,
            view,
            cells: Box::new(cells),
            paging: PagingConfig::default(),
            scope,
        };
        binding.reload_widget();
        binding
    }

    /// Use `paging.prefetch_distance` for [`will_display`](Self::will_display).
    #[must_use]
    pub fn with_paging(mut self, paging: PagingConfig) -> Self {
        self.paging = paging.sanitized();
        self
    }

    fn reload_widget(&self) {
        match self.widget.try_borrow_mut() {
            Ok(mut widget) => widget.reload_data(),
            Err(_) => tracing::warn!("list widget busy; reload skipped"),
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.scope.is_empty()
    }

    /// The view currently backing the widget.
    #[must_use]
    pub fn view(&self) -> &DataView<T> {
        &self.view
    }

    #[must_use]
    pub fn number_of_sections(&self) -> usize {
        self.view.number_of_sections()
    }

    #[must_use]
    pub fn number_of_items_in_section(&self, section: usize) -> usize {
        self.view.number_of_items_in_section(section)
    }

    /// Build the cell for `position`.
    #[must_use]
    pub fn cell(&self, position: IndexPath) -> Option<W::Cell> {
        let item = self.view.item_at(position)?;
        Some((self.cells)(position, item))
    }

    /// Tell the binding the widget is about to show `position`.
    ///
    /// Requests the next page when at most `prefetch_distance` items follow
    /// the position. Returns whether a page was requested.
    pub fn will_display(&self, position: IndexPath) -> bool {
        if !self.is_attached() || !self.view.can_load_more() {
            return false;
        }
        let before: usize = (0..position.section)
            .map(|section| self.view.number_of_items_in_section(section))
            .sum();
        let index = before + position.item;
        let count = self.view.count();
        if index >= count || count - 1 - index > self.paging.prefetch_distance {
            return false;
        }
        tracing::debug!(%position, count, "prefetching next page");
        self.view.load_more();
        true
    }

    /// Stop listening and show an empty list.
    pub fn detach(&mut self) {
        if !self.is_attached() {
            return;
        }
        self.scope.clear();
        self.view = DataView::new(DataResult::empty());
        self.reload_widget();
    }
}

impl<T, W: ListWidget> Drop for ListBinding<T, W> {
    fn drop(&mut self) {
        if self.scope.is_empty() {
            return;
        }
        self.scope.clear();
        match self.widget.try_borrow_mut() {
            Ok(mut widget) => widget.reload_data(),
            Err(_) => tracing::warn!("list widget busy; final reload skipped"),
        }
    }
}

impl<T: 'static, W: ListWidget> fmt::Debug for ListBinding<T, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListBinding")
            .field("attached", &!self.scope.is_empty())
            .field("count", &self.view.count())
            .field("paging", &self.paging)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl ListWidget for Log {
        type Cell = ();

        fn reload_data(&mut self) {
            self.0.push("reload".into());
        }
        fn begin_updates(&mut self) {
            self.0.push("begin".into());
        }
        fn insert_row(&mut self, at: IndexPath) {
            self.0.push(format!("insert {at}"));
        }
        fn delete_row(&mut self, at: IndexPath) {
            self.0.push(format!("delete {at}"));
        }
        fn reload_row(&mut self, at: IndexPath) {
            self.0.push(format!("update {at}"));
        }
        fn move_row(&mut self, from: IndexPath, to: IndexPath) {
            self.0.push(format!("move {from} -> {to}"));
        }
        fn end_updates(&mut self) {
            self.0.push("end".into());
        }
    }

    #[test]
    fn stray_all_reloads() {
        let mut log = Log::default();
        apply_updates(
            &mut log,
            &[DataUpdate::Insert(IndexPath::flat(0)), DataUpdate::All],
        );
        assert_eq!(log.0, ["reload"]);
    }

    #[test]
    fn empty_batch_is_ignored() {
        let mut log = Log::default();
        apply_updates(&mut log, &[]);
        assert!(log.0.is_empty());
    }

    #[test]
    fn incremental_batch_is_bracketed() {
        let mut log = Log::default();
        apply_updates(
            &mut log,
            &[
                DataUpdate::Delete(IndexPath::flat(2)),
                DataUpdate::Move {
                    from: IndexPath::flat(0),
                    to: IndexPath::flat(1),
                },
                DataUpdate::Update(IndexPath::flat(0)),
            ],
        );
        assert_eq!(
            log.0,
            [
                "begin",
                "delete [0, 2]",
                "move [0, 0] -> [0, 1]",
                "update [0, 0]",
                "end"
            ]
        );
    }
}
