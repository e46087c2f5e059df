//! Apply an update batch to a flat snapshot.

use dataview_core::{DataUpdate, UpdateBatch};

/// Apply `batch` to a copy of `old`, sequentially.
///
/// Inserted and updated values are taken from `new` at the update's item
/// index, which is where a correct script leaves them. `[All]` yields `new`
/// as-is. Sections are ignored; only item indices are read.
///
/// Returns `None` when an update addresses a position that does not exist at
/// the point it is applied.
#[must_use]
pub fn replay<T: Clone>(old: &[T], new: &[T], batch: &UpdateBatch) -> Option<Vec<T>> {
    let mut items = old.to_vec();
    for update in batch {
        match *update {
            DataUpdate::All => return Some(new.to_vec()),
            DataUpdate::Insert(at) => {
                if at.item > items.len() {
                    return None;
                }
                items.insert(at.item, new.get(at.item)?.clone());
            }
            DataUpdate::Delete(at) => {
                if at.item >= items.len() {
                    return None;
                }
                items.remove(at.item);
            }
            DataUpdate::Update(at) => {
                let slot = items.get_mut(at.item)?;
                *slot = new.get(at.item)?.clone();
            }
            DataUpdate::Move { from, to } => {
                if from.item >= items.len() {
                    return None;
                }
                let item = items.remove(from.item);
                if to.item > items.len() {
                    return None;
                }
                items.insert(to.item, item);
            }
        }
    }
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataview_core::IndexPath;

    #[test]
    fn move_is_remove_then_insert() {
        let batch = UpdateBatch::from_updates([DataUpdate::Move {
            from: IndexPath::flat(0),
            to: IndexPath::flat(2),
        }]);
        assert_eq!(replay(&[1, 2, 3], &[], &batch), Some(vec![2, 3, 1]));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let batch = UpdateBatch::from_updates([DataUpdate::Delete(IndexPath::flat(3))]);
        assert_eq!(replay(&[1, 2, 3], &[1, 2], &batch), None);
    }

    #[test]
    fn all_yields_new() {
        assert_eq!(replay(&[1], &[7, 8], &UpdateBatch::all()), Some(vec![7, 8]));
    }
}
