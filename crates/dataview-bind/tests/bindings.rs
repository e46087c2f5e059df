//! Widgets driven by live views.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use dataview_bind::{ListBinding, ListWidget, PagerBinding, PagerWidget};
use dataview_core::{DataError, DataState, IndexPath};
use dataview_data::{DataResult, DataView, PagingConfig};
use dataview_runtime::UiLoop;
use futures::StreamExt;
use futures::channel::mpsc;
use futures::future;
use futures::stream;

type Snapshots = mpsc::UnboundedSender<Result<Vec<&'static str>, DataError>>;

fn streamed(ui: &UiLoop) -> (DataView<&'static str>, Snapshots) {
    let (tx, rx) = mpsc::unbounded();
    let rx = RefCell::new(Some(rx));
    let result = DataResult::from_stream(ui.executor(), move || match rx.borrow_mut().take() {
        Some(rx) => rx.boxed_local(),
        None => stream::empty().boxed_local(),
    });
    (DataView::new(result), tx)
}

fn p(item: usize) -> IndexPath {
    IndexPath::flat(item)
}

/// Records every call as text.
#[derive(Default)]
struct Table {
    calls: Vec<String>,
}

impl Table {
    fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.calls)
    }
}

impl ListWidget for Table {
    type Cell = String;

    fn reload_data(&mut self) {
        self.calls.push("reload".to_owned());
    }

    fn begin_updates(&mut self) {
        self.calls.push("begin".to_owned());
    }

    fn insert_row(&mut self, at: IndexPath) {
        self.calls.push(format!("insert {at}"));
    }

    fn delete_row(&mut self, at: IndexPath) {
        self.calls.push(format!("delete {at}"));
    }

    fn reload_row(&mut self, at: IndexPath) {
        self.calls.push(format!("update {at}"));
    }

    fn move_row(&mut self, from: IndexPath, to: IndexPath) {
        self.calls.push(format!("move {from} -> {to}"));
    }

    fn end_updates(&mut self) {
        self.calls.push("end".to_owned());
    }
}

fn upper(_: IndexPath, item: &'static str) -> String {
    item.to_uppercase()
}

// ---------------------------------------------------------------------------
// ListBinding
// ---------------------------------------------------------------------------

#[test]
fn list_replays_batches() {
    let mut ui = UiLoop::new();
    let (view, snapshots) = streamed(&ui);
    let table = Rc::new(RefCell::new(Table::default()));
    let binding = ListBinding::bind(Rc::clone(&table), view.clone(), upper);
    assert_eq!(table.borrow_mut().take(), ["reload"]);

    snapshots.unbounded_send(Ok(vec!["a", "b"])).unwrap();
    ui.run_until_stalled();
    assert_eq!(
        table.borrow_mut().take(),
        ["begin", "insert [0, 0]", "insert [0, 1]", "end"]
    );
    assert_eq!(binding.number_of_sections(), 1);
    assert_eq!(binding.number_of_items_in_section(0), 2);
    assert_eq!(binding.cell(p(1)).as_deref(), Some("B"));
    assert_eq!(binding.cell(p(2)), None);

    snapshots.unbounded_send(Ok(vec!["a"])).unwrap();
    ui.run_until_stalled();
    assert_eq!(table.borrow_mut().take(), ["begin", "delete [0, 1]", "end"]);

    view.reload();
    ui.run_until_stalled();
    assert_eq!(table.borrow_mut().take(), ["reload"]);
}

#[test]
fn detach_shows_an_empty_list_and_stops_listening() {
    let mut ui = UiLoop::new();
    let (view, snapshots) = streamed(&ui);
    let table = Rc::new(RefCell::new(Table::default()));
    let mut binding = ListBinding::bind(Rc::clone(&table), view, upper);
    snapshots.unbounded_send(Ok(vec!["a", "b"])).unwrap();
    ui.run_until_stalled();
    table.borrow_mut().take();

    binding.detach();
    assert!(!binding.is_attached());
    assert_eq!(table.borrow_mut().take(), ["reload"]);
    assert_eq!(binding.number_of_sections(), 1);
    assert_eq!(binding.number_of_items_in_section(0), 0);
    assert_eq!(binding.view().state().get(), DataState::Idle);
    assert_eq!(binding.cell(p(0)), None);

    let _ = snapshots.unbounded_send(Ok(vec!["c"]));
    ui.run_until_stalled();
    assert!(table.borrow().calls.is_empty());

    binding.detach();
    drop(binding);
    assert!(table.borrow().calls.is_empty());
}

#[test]
fn dropping_the_binding_detaches() {
    let mut ui = UiLoop::new();
    let (view, snapshots) = streamed(&ui);
    let table = Rc::new(RefCell::new(Table::default()));
    let binding = ListBinding::bind(Rc::clone(&table), view, upper);
    table.borrow_mut().take();

    drop(binding);
    assert_eq!(table.borrow_mut().take(), ["reload"]);
    let _ = snapshots.unbounded_send(Ok(vec!["a"]));
    ui.run_until_stalled();
    assert!(table.borrow().calls.is_empty());
}

#[test]
fn rows_near_the_end_prefetch_the_next_page() {
    let mut ui = UiLoop::new();
    let pages = Rc::new(RefCell::new(VecDeque::from([
        vec!["a", "b", "c", "d"],
        vec!["e"],
    ])));
    let requests = Rc::new(RefCell::new(Vec::new()));
    let result = {
        let (pages, requests) = (Rc::clone(&pages), Rc::clone(&requests));
        DataResult::paged(
            ui.executor(),
            PagingConfig::with_page_size(4),
            move |request| {
                requests.borrow_mut().push(request.page);
                future::ready(Ok(pages.borrow_mut().pop_front().unwrap_or_default()))
            },
        )
    };
    let table = Rc::new(RefCell::new(Table::default()));
    let binding = ListBinding::bind(Rc::clone(&table), DataView::new(result), upper).with_paging(
        PagingConfig {
            page_size: 4,
            prefetch_distance: 1,
        },
    );
    ui.run_until_stalled();
    assert_eq!(binding.view().count(), 4);
    table.borrow_mut().take();

    assert!(!binding.will_display(p(1)));
    assert!(!binding.will_display(p(9)));
    assert!(binding.will_display(p(2)));
    assert_eq!(*requests.borrow(), [1, 2]);

    ui.run_until_stalled();
    assert_eq!(table.borrow_mut().take(), ["begin", "insert [0, 4]", "end"]);
    assert!(!binding.will_display(p(4)));
    assert_eq!(*requests.borrow(), [1, 2]);
}

// ---------------------------------------------------------------------------
// PagerBinding
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Pager {
    shown: Vec<(usize, String)>,
    cleared: usize,
}

impl PagerWidget for Pager {
    type Page = String;

    fn show_page(&mut self, index: usize, page: String) {
        self.shown.push((index, page));
    }

    fn clear_pages(&mut self) {
        self.cleared += 1;
    }
}

fn page(index: usize, item: &'static str) -> String {
    format!("{index}:{item}")
}

#[test]
fn pager_shows_first_page_and_neighbours() {
    let pager = Rc::new(RefCell::new(Pager::default()));
    let view = DataView::new(DataResult::from_vec(vec!["p", "q", "r"]));
    let binding = PagerBinding::bind(Rc::clone(&pager), view, page);

    assert_eq!(pager.borrow().shown, [(0, "0:p".to_owned())]);
    assert_eq!(binding.page_count(), 3);
    assert_eq!(binding.page_after(0).as_deref(), Some("1:q"));
    assert_eq!(binding.page_before(2).as_deref(), Some("1:q"));
    assert_eq!(binding.page_before(0), None);
    assert_eq!(binding.page_after(2), None);
}

#[test]
fn pager_returns_to_first_page_after_updates() {
    let mut ui = UiLoop::new();
    let (view, snapshots) = streamed(&ui);
    let pager = Rc::new(RefCell::new(Pager::default()));
    let _binding = PagerBinding::bind(Rc::clone(&pager), view, page);
    assert_eq!(pager.borrow().cleared, 1);

    snapshots.unbounded_send(Ok(vec!["x", "y"])).unwrap();
    ui.run_until_stalled();
    assert_eq!(pager.borrow().shown, [(0, "0:x".to_owned())]);

    snapshots.unbounded_send(Ok(Vec::new())).unwrap();
    ui.run_until_stalled();
    assert_eq!(pager.borrow().cleared, 2);
}
