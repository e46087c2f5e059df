//! Positional shift rules.
//!
//! Both [`SelectionSet`](crate::SelectionSet) and
//! [`PositionCache`](crate::PositionCache) key state by position. When the
//! underlying collection mutates, that state must follow the items it was
//! attached to. [`remap`] is the single source of truth for where a position
//! lands after one update:
//!
//! | Update | Effect on position `p` |
//! |--------|------------------------|
//! | `All` | removed |
//! | `Delete(d)` | `p == d` removed; later items of the same section shift left |
//! | `Insert(i)` | items at or after `i` in the same section shift right |
//! | `Update(u)` | unchanged |
//! | `Move { from, to }` | `p == from` lands on `to`; the items in between shift by one |

use crate::position::IndexPath;
use crate::update::DataUpdate;

/// Where `position` lands after `update`, or `None` if it was removed.
#[must_use]
pub fn remap(position: IndexPath, update: &DataUpdate) -> Option<IndexPath> {
    match *update {
        DataUpdate::All => None,
        DataUpdate::Update(_) => Some(position),
        DataUpdate::Delete(at) => after_delete(position, at),
        DataUpdate::Insert(at) => Some(after_insert(position, at)),
        DataUpdate::Move { from, to } => {
            if from == to {
                return Some(position);
            }
            if position == from {
                return Some(to);
            }
            after_delete(position, from).map(|p| after_insert(p, to))
        }
    }
}

fn after_delete(position: IndexPath, at: IndexPath) -> Option<IndexPath> {
    if position.section != at.section || position.item < at.item {
        Some(position)
    } else if position.item == at.item {
        None
    } else {
        Some(IndexPath::new(position.section, position.item - 1))
    }
}

fn after_insert(position: IndexPath, at: IndexPath) -> IndexPath {
    if position.section == at.section && position.item >= at.item {
        IndexPath::new(position.section, position.item + 1)
    } else {
        position
    }
}
