//! End-to-end concatenation of sources.
//!
//! Child sections are stacked: child `i` owns the section range that starts
//! after every section of children `0..i`. Child batches are re-addressed
//! into that range and forwarded as they arrive. Interleaving across
//! children follows completion order.
//!
//! # Invariants
//!
//! 1. State is the first child error, else `Loading` if any child loads,
//!    else `None` if any child never loaded, else `Idle`.
//! 2. `reload` reloads every child; `load_more` goes to the last child only.
//! 3. Section offsets are computed when a batch is forwarded, so a child
//!    that gains or loses sections shifts its successors.

use std::rc::Rc;

use dataview_core::{DataState, IndexPath, UpdateBatch};
use dataview_runtime::{BindingScope, EventChannel, Observable};

use crate::source::ResultSource;

pub(crate) struct CombineSource<T> {
    children: Rc<[Rc<dyn ResultSource<T>>]>,
    state: Observable<DataState>,
    updates: EventChannel<UpdateBatch>,
    _scope: BindingScope,
}

fn aggregate<T>(children: &[Rc<dyn ResultSource<T>>]) -> DataState {
    let states: Vec<DataState> = children.iter().map(|c| c.state().get()).collect();
    DataState::aggregate(states.iter())
}

fn section_offset<T>(children: &[Rc<dyn ResultSource<T>>], index: usize) -> usize {
    children[..index]
        .iter()
        .map(|c| c.number_of_sections())
        .sum()
}

impl<T: 'static> CombineSource<T> {
    pub(crate) fn new(children: Vec<Rc<dyn ResultSource<T>>>) -> Self {
        let children: Rc<[Rc<dyn ResultSource<T>>]> = children.into();
        let state = Observable::new(aggregate(&children));
        let updates = EventChannel::new();
        let mut scope = BindingScope::new();

        for (index, child) in children.iter().enumerate() {
            let (all, target) = (Rc::clone(&children), state.clone());
            scope.subscribe(child.state(), move |_| target.set(aggregate(&all)));

            let (all, channel) = (Rc::clone(&children), updates.clone());
            scope.listen(child.updates(), move |batch: &UpdateBatch| {
                let offset = section_offset(&all, index);
                channel.emit(&batch.offset_sections(offset));
            });
        }

        Self {
            children,
            state,
            updates,
            _scope: scope,
        }
    }

    /// Child owning `section`, and the section index inside it.
    fn locate(&self, section: usize) -> Option<(&Rc<dyn ResultSource<T>>, usize)> {
        let mut start = 0;
        for child in self.children.iter() {
            let sections = child.number_of_sections();
            if section < start + sections {
                return Some((child, section - start));
            }
            start += sections;
        }
        None
    }
}

impl<T: 'static> ResultSource<T> for CombineSource<T> {
    fn state(&self) -> &Observable<DataState> {
        &self.state
    }

    fn updates(&self) -> &EventChannel<UpdateBatch> {
        &self.updates
    }

    fn number_of_sections(&self) -> usize {
        self.children.iter().map(|c| c.number_of_sections()).sum()
    }

    fn number_of_items_in_section(&self, section: usize) -> usize {
        self.locate(section)
            .map_or(0, |(child, local)| child.number_of_items_in_section(local))
    }

    fn item_at(&self, position: IndexPath) -> Option<T> {
        let (child, local) = self.locate(position.section)?;
        child.item_at(IndexPath::new(local, position.item))
    }

    fn reload(&self) {
        for child in self.children.iter() {
            child.reload();
        }
    }

    fn load_more(&self) {
        if let Some(last) = self.children.last() {
            last.load_more();
        }
    }

    fn can_load_more(&self) -> bool {
        self.children.last().is_some_and(|last| last.can_load_more())
    }

    fn count(&self) -> usize {
        self.children.iter().map(|c| c.count()).sum()
    }

    fn item(&self, index: usize) -> Option<T> {
        let mut remaining = index;
        for child in self.children.iter() {
            let count = child.count();
            if remaining < count {
                return child.item(remaining);
            }
            remaining -= count;
        }
        None
    }

    fn values(&self) -> Vec<T> {
        self.children.iter().flat_map(|c| c.values()).collect()
    }
}
