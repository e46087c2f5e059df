//! A source chosen by a single loaded value.
//!
//! The source owns two scopes: one on the single value and one on the
//! current inner source. Callbacks hold the shared core strongly; the core
//! holds no subscriptions, so clearing both scopes on drop releases it.

use std::cell::RefCell;
use std::rc::Rc;

use dataview_core::{DataState, IndexPath, UpdateBatch};
use dataview_runtime::{BindingScope, EventChannel, Observable};

use super::DataResult;
use crate::single::DataSingleResult;
use crate::source::ResultSource;

struct FlatMapCore<S, T> {
    single: DataSingleResult<S>,
    current: RefCell<DataResult<T>>,
    state: Observable<DataState>,
    updates: EventChannel<UpdateBatch>,
}

impl<S: Clone + PartialEq + 'static, T: Clone + 'static> FlatMapCore<S, T> {
    /// Hand over to `next`, announcing `[All]`. `inner` receives the
    /// subscriptions on `next`; the previous ones are released.
    fn swap(self: &Rc<Self>, next: DataResult<T>, inner: &RefCell<BindingScope>) {
        let mut scope = BindingScope::new();
        {
            let core = Rc::clone(self);
            scope.subscribe(next.state(), move |_| core.refresh_state());
        }
        let channel = self.updates.clone();
        scope.listen(next.updates(), move |batch: &UpdateBatch| channel.emit(batch));

        let previous_scope = inner.replace(scope);
        let previous = self.current.replace(next);
        drop(previous_scope);
        drop(previous);

        tracing::debug!("flat_map source swapped");
        self.refresh_state();
        self.updates.emit(&UpdateBatch::all());
    }

    fn refresh_state(&self) {
        let next = match self.single.state().get() {
            DataState::Loading => DataState::Loading,
            DataState::Error(error) => DataState::Error(error),
            DataState::None => DataState::None,
            DataState::Idle => self.current.borrow().state().get(),
        };
        self.state.set(next);
    }

    fn current(&self) -> DataResult<T> {
        self.current.borrow().clone()
    }
}

pub(crate) struct FlatMapSource<S, T> {
    core: Rc<FlatMapCore<S, T>>,
    /// Subscriptions on the single value.
    outer: BindingScope,
    /// Subscriptions on the current inner source, replaced on every swap.
    inner: Rc<RefCell<BindingScope>>,
}

impl<S: Clone + PartialEq + 'static, T: Clone + 'static> FlatMapSource<S, T> {
    pub(crate) fn new(
        single: DataSingleResult<S>,
        transform: impl Fn(S) -> DataResult<T> + 'static,
    ) -> Self {
        let core = Rc::new(FlatMapCore {
            single: single.clone(),
            current: RefCell::new(DataResult::empty()),
            state: Observable::new(DataState::None),
            updates: EventChannel::new(),
        });
        core.refresh_state();

        let transform = Rc::new(transform);
        let inner = Rc::new(RefCell::new(BindingScope::new()));
        let mut outer = BindingScope::new();
        {
            let (core, inner, transform) =
                (Rc::clone(&core), Rc::clone(&inner), Rc::clone(&transform));
            outer.subscribe(single.item(), move |item: &Option<S>| {
                if let Some(value) = item {
                    core.swap(transform(value.clone()), &inner);
                }
            });
        }
        {
            let core = Rc::clone(&core);
            outer.subscribe(single.state(), move |_| core.refresh_state());
        }
        if let Some(value) = single.item().get() {
            core.swap(transform(value), &inner);
        }

        Self { core, outer, inner }
    }
}

impl<S, T> Drop for FlatMapSource<S, T> {
    fn drop(&mut self) {
        self.outer.clear();
        match self.inner.try_borrow_mut() {
            Ok(mut inner) => inner.clear(),
            Err(_) => tracing::warn!("flat_map inner scope busy at drop"),
        }
    }
}

impl<S: Clone + PartialEq + 'static, T: Clone + 'static> ResultSource<T> for FlatMapSource<S, T> {
    fn state(&self) -> &Observable<DataState> {
        &self.core.state
    }

    fn updates(&self) -> &EventChannel<UpdateBatch> {
        &self.core.updates
    }

    fn number_of_sections(&self) -> usize {
        self.core.current().number_of_sections()
    }

    fn number_of_items_in_section(&self, section: usize) -> usize {
        self.core.current().number_of_items_in_section(section)
    }

    fn item_at(&self, position: IndexPath) -> Option<T> {
        self.core.current().item_at(position)
    }

    fn reload(&self) {
        self.core.current().reload();
    }

    fn load_more(&self) {
        self.core.current().load_more();
    }

    fn can_load_more(&self) -> bool {
        self.core.current().can_load_more()
    }

    fn count(&self) -> usize {
        self.core.current().count()
    }

    fn item(&self, index: usize) -> Option<T> {
        self.core.current().item(index)
    }

    fn values(&self) -> Vec<T> {
        self.core.current().values()
    }
}
