//! Ordered selection of positions.
//!
//! # Invariants
//!
//! 1. A position appears at most once; iteration yields selection order.
//! 2. In single-selection mode at most one position is selected.
//! 3. After [`SelectionSet::apply`], every remaining position refers to the
//!    same logical item it referred to before the update (see
//!    [`remap`](crate::shift::remap)).
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `select_many` with several positions | single-selection mode | `Err(SelectionError::MultipleNotAllowed)`, selection untouched |
//! | `deselect` of unselected position | caller error | no-op, returns `false` |

use indexmap::IndexSet;

use crate::position::IndexPath;
use crate::shift::remap;
use crate::update::{DataUpdate, UpdateBatch};

/// Errors from selection operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Several positions were given while multi-selection is disabled.
    #[error("multiple selection is disabled ({requested} positions requested)")]
    MultipleNotAllowed {
        /// How many positions the caller tried to select.
        requested: usize,
    },
}

/// An ordered set of selected positions.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    positions: IndexSet<IndexPath>,
    multiple: bool,
}

impl SelectionSet {
    /// Empty single-selection set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty set with multi-selection enabled.
    #[must_use]
    pub fn multiple() -> Self {
        Self {
            positions: IndexSet::new(),
            multiple: true,
        }
    }

    /// Whether multi-selection is enabled.
    #[must_use]
    pub fn allows_multiple(&self) -> bool {
        self.multiple
    }

    /// Enable or disable multi-selection.
    ///
    /// Disabling keeps only the most recently selected position.
    pub fn set_allows_multiple(&mut self, multiple: bool) {
        self.multiple = multiple;
        if !multiple && self.positions.len() > 1 {
            let last = self.positions.pop();
            self.positions.clear();
            self.positions.extend(last);
        }
    }

    /// Select `position`.
    ///
    /// Replaces the selection in single mode; appends in multi mode. Returns
    /// `false` if the position was already selected.
    pub fn select(&mut self, position: IndexPath) -> bool {
        if self.positions.contains(&position) {
            return false;
        }
        if !self.multiple {
            self.positions.clear();
        }
        self.positions.insert(position);
        true
    }

    /// Select several positions at once.
    pub fn select_many(
        &mut self,
        positions: impl IntoIterator<Item = IndexPath>,
    ) -> Result<bool, SelectionError> {
        let positions: Vec<IndexPath> = positions.into_iter().collect();
        if !self.multiple && positions.len() > 1 {
            return Err(SelectionError::MultipleNotAllowed {
                requested: positions.len(),
            });
        }
        let mut changed = false;
        for position in positions {
            changed |= self.select(position);
        }
        Ok(changed)
    }

    /// Deselect `position`. Returns `false` if it was not selected.
    pub fn deselect(&mut self, position: IndexPath) -> bool {
        self.positions.shift_remove(&position)
    }

    /// Clear the selection. Returns `false` if it was already empty.
    pub fn reset(&mut self) -> bool {
        let changed = !self.positions.is_empty();
        self.positions.clear();
        changed
    }

    /// Whether `position` is selected.
    #[must_use]
    pub fn contains(&self, position: IndexPath) -> bool {
        self.positions.contains(&position)
    }

    /// Selected positions in selection order.
    pub fn iter(&self) -> impl Iterator<Item = IndexPath> + '_ {
        self.positions.iter().copied()
    }

    /// Selected positions in selection order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<IndexPath> {
        self.iter().collect()
    }

    /// Number of selected positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Re-derive the selection after one update.
    pub fn apply(&mut self, update: &DataUpdate) {
        if self.positions.is_empty() {
            return;
        }
        if *update == DataUpdate::All {
            self.positions.clear();
            return;
        }
        self.positions = self
            .positions
            .iter()
            .filter_map(|&p| remap(p, update))
            .collect();
    }

    /// Re-derive the selection after a whole batch, in order.
    pub fn apply_batch(&mut self, batch: &UpdateBatch) {
        for update in batch {
            self.apply(update);
        }
    }
}

impl PartialEq for SelectionSet {
    fn eq(&self, other: &Self) -> bool {
        self.multiple == other.multiple && self.positions.iter().eq(other.positions.iter())
    }
}

impl Eq for SelectionSet {}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(item: usize) -> IndexPath {
        IndexPath::flat(item)
    }

    #[test]
    fn single_mode_replaces() {
        let mut set = SelectionSet::new();
        assert!(set.select(p(1)));
        assert!(set.select(p(3)));
        assert_eq!(set.to_vec(), vec![p(3)]);
        assert!(!set.select(p(3)));
    }

    #[test]
    fn multi_mode_appends_in_order() {
        let mut set = SelectionSet::multiple();
        set.select(p(3));
        set.select(p(1));
        set.select(p(3));
        assert_eq!(set.to_vec(), vec![p(3), p(1)]);
    }

    #[test]
    fn select_many_rejected_in_single_mode() {
        let mut set = SelectionSet::new();
        set.select(p(0));
        let err = set.select_many([p(1), p(2)]).unwrap_err();
        assert_eq!(err, SelectionError::MultipleNotAllowed { requested: 2 });
        assert_eq!(set.to_vec(), vec![p(0)]);
        assert_eq!(set.select_many([p(4)]), Ok(true));
        assert_eq!(set.to_vec(), vec![p(4)]);
    }

    #[test]
    fn deselect_and_reset() {
        let mut set = SelectionSet::multiple();
        set.select_many([p(0), p(1), p(2)]).unwrap();
        assert!(set.deselect(p(1)));
        assert!(!set.deselect(p(1)));
        assert_eq!(set.to_vec(), vec![p(0), p(2)]);
        assert!(set.reset());
        assert!(!set.reset());
    }

    #[test]
    fn delete_before_selection_shifts_left() {
        let mut set = SelectionSet::new();
        set.select(p(2));
        set.apply(&DataUpdate::Delete(p(0)));
        assert_eq!(set.to_vec(), vec![p(1)]);
    }

    #[test]
    fn delete_of_selected_removes_it() {
        let mut set = SelectionSet::multiple();
        set.select_many([p(1), p(4)]).unwrap();
        set.apply(&DataUpdate::Delete(p(1)));
        assert_eq!(set.to_vec(), vec![p(3)]);
    }

    #[test]
    fn insert_shifts_right_and_update_is_neutral() {
        let mut set = SelectionSet::new();
        set.select(p(2));
        set.apply(&DataUpdate::Insert(p(2)));
        assert_eq!(set.to_vec(), vec![p(3)]);
        set.apply(&DataUpdate::Update(p(3)));
        assert_eq!(set.to_vec(), vec![p(3)]);
    }

    #[test]
    fn move_carries_selected_item() {
        let mut set = SelectionSet::new();
        set.select(p(0));
        set.apply(&DataUpdate::Move {
            from: p(0),
            to: p(2),
        });
        assert_eq!(set.to_vec(), vec![p(2)]);
    }

    #[test]
    fn all_clears() {
        let mut set = SelectionSet::multiple();
        set.select_many([p(0), p(1)]).unwrap();
        set.apply_batch(&UpdateBatch::all());
        assert!(set.is_empty());
    }

    #[test]
    fn disabling_multiple_keeps_latest() {
        let mut set = SelectionSet::multiple();
        set.select_many([p(0), p(5), p(2)]).unwrap();
        set.set_allows_multiple(false);
        assert_eq!(set.to_vec(), vec![p(2)]);
    }

    #[test]
    fn equality_respects_order() {
        let mut a = SelectionSet::multiple();
        a.select_many([p(0), p(1)]).unwrap();
        let mut b = SelectionSet::multiple();
        b.select_many([p(1), p(0)]).unwrap();
        assert_ne!(a, b);
    }
}
