//! Page widgets: one item per page, swiped left and right.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use dataview_core::UpdateBatch;
use dataview_data::DataView;
use dataview_runtime::BindingScope;

/// A widget showing one page at a time.
pub trait PagerWidget {
    type Page;

    /// Replace the visible page.
    fn show_page(&mut self, index: usize, page: Self::Page);

    /// Nothing to show.
    fn clear_pages(&mut self);
}

type PageFactory<T, P> = Rc<dyn Fn(usize, T) -> P>;

/// Drives a [`PagerWidget`] from a [`DataView`].
///
/// The first item is shown on bind and again after every update batch.
/// Neighbouring pages are built on demand by
/// [`page_after`](Self::page_after) and [`page_before`](Self::page_before).
pub struct PagerBinding<T, W: PagerWidget> {
    view: DataView<T>,
    pages: PageFactory<T, W::Page>,
    _scope: BindingScope,
}

fn show_first<T: 'static, W: PagerWidget>(
    widget: &RefCell<W>,
    view: &DataView<T>,
    pages: &dyn Fn(usize, T) -> W::Page,
) {
    let Ok(mut widget) = widget.try_borrow_mut() else {
        tracing::warn!("pager widget busy; first page not shown");
        return;
    };
    match view.item(0) {
        Some(item) => widget.show_page(0, pages(0, item)),
        None => widget.clear_pages(),
    }
}

impl<T: 'static, W: PagerWidget + 'static> PagerBinding<T, W> {
    pub fn bind(
        widget: Rc<RefCell<W>>,
        view: DataView<T>,
        pages: impl Fn(usize, T) -> W::Page + 'static,
    ) -> Self {
        let pages: PageFactory<T, W::Page> = Rc::new(pages);
        show_first(&widget, &view, pages.as_ref());

        let mut scope = BindingScope::new();
        {
            let (shown, pages) = (view.clone(), Rc::clone(&pages));
            scope.listen(view.updates(), move |batch: &UpdateBatch| {
                tracing::trace!(len = batch.len(), "pager back to first page");
                show_first(&widget, &shown, pages.as_ref());
            });
        }
        Self {
            view,
            pages,
            _scope: scope,
        }
    }

    /// Page for the item at `index`.
    #[must_use]
    pub fn page(&self, index: usize) -> Option<W::Page> {
        let item = self.view.item(index)?;
        Some((self.pages)(index, item))
    }

    /// Page following `index`, if any.
    #[must_use]
    pub fn page_after(&self, index: usize) -> Option<W::Page> {
        self.page(index.checked_add(1)?)
    }

    /// Page preceding `index`, if any.
    #[must_use]
    pub fn page_before(&self, index: usize) -> Option<W::Page> {
        self.page(index.checked_sub(1)?)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.view.count()
    }
}

impl<T: 'static, W: PagerWidget> fmt::Debug for PagerBinding<T, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagerBinding")
            .field("pages", &self.view.count())
            .finish_non_exhaustive()
    }
}
