//! The capability set shared by every source.

use dataview_core::{DataState, IndexPath, UpdateBatch};
use dataview_runtime::{EventChannel, Observable};

/// A grouped, ordered collection that loads itself and reports changes.
///
/// # Contract
///
/// - `state` changes strictly before the update batch describing the same
///   transition is emitted, and item accessors already reflect the new
///   snapshot when the batch arrives.
/// - Batches are emitted in the order their operations complete.
/// - `reload` while `Loading` is a no-op. `load_more` while `Loading`, in
///   `Error`, or with no further data is a no-op.
/// - A failed load moves to `Error` and leaves the last good snapshot
///   readable.
/// - Out-of-range positions yield `None`.
pub trait ResultSource<T> {
    /// Current load state.
    fn state(&self) -> &Observable<DataState>;

    /// Channel that carries one batch per completed change.
    fn updates(&self) -> &EventChannel<UpdateBatch>;

    /// Number of sections.
    fn number_of_sections(&self) -> usize;

    /// Number of items in `section`; 0 for unknown sections.
    fn number_of_items_in_section(&self, section: usize) -> usize;

    /// Item at a two-dimensional position.
    fn item_at(&self, position: IndexPath) -> Option<T>;

    /// Start over from the first page or a fresh fetch.
    fn reload(&self);

    /// Request the next page.
    fn load_more(&self);

    /// Whether `load_more` would currently start a request.
    fn can_load_more(&self) -> bool {
        false
    }

    /// Total number of items across sections.
    fn count(&self) -> usize {
        (0..self.number_of_sections())
            .map(|section| self.number_of_items_in_section(section))
            .sum()
    }

    /// Position of the `index`-th item counting across sections.
    fn position_of(&self, index: usize) -> Option<IndexPath> {
        let mut remaining = index;
        for section in 0..self.number_of_sections() {
            let len = self.number_of_items_in_section(section);
            if remaining < len {
                return Some(IndexPath::new(section, remaining));
            }
            remaining -= len;
        }
        None
    }

    /// Item at a flat index counting across sections.
    fn item(&self, index: usize) -> Option<T> {
        self.item_at(self.position_of(index)?)
    }

    /// The whole current snapshot in order.
    fn values(&self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.count());
        for section in 0..self.number_of_sections() {
            for item in 0..self.number_of_items_in_section(section) {
                if let Some(value) = self.item_at(IndexPath::new(section, item)) {
                    values.push(value);
                }
            }
        }
        values
    }
}
