//! Position-indexed memo of derived values.
//!
//! A [`PositionCache`] remembers values computed for positions of a
//! collection and keeps them attached to the same logical items while the
//! collection mutates. It applies the shift rules of
//! [`remap`](crate::shift::remap) with one difference: an `Update` invalidates
//! the entry at its position, because the content behind it changed.
//!
//! # Invariants
//!
//! 1. Only entries whose position is affected by an update are touched;
//!    every other value stays in place and is never recomputed.
//! 2. A moved entry keeps its value.
//! 3. `All` empties the cache.

use std::collections::BTreeMap;

use crate::position::IndexPath;
use crate::update::{DataUpdate, UpdateBatch};

/// Ordered `(section, item) -> value` memo with positional re-indexing.
#[derive(Debug, Clone)]
pub struct PositionCache<V> {
    entries: BTreeMap<IndexPath, V>,
}

impl<V> Default for PositionCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PositionCache<V> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Cached value at `position`.
    #[must_use]
    pub fn get(&self, position: IndexPath) -> Option<&V> {
        self.entries.get(&position)
    }

    /// Store a value, returning the previous one.
    pub fn insert(&mut self, position: IndexPath, value: V) -> Option<V> {
        self.entries.insert(position, value)
    }

    /// Drop the value at `position`.
    pub fn remove(&mut self, position: IndexPath) -> Option<V> {
        self.entries.remove(&position)
    }

    /// Number of cached values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every value.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Cached positions in order.
    pub fn positions(&self) -> impl Iterator<Item = IndexPath> + '_ {
        self.entries.keys().copied()
    }

    /// Re-index after one update.
    pub fn apply(&mut self, update: &DataUpdate) {
        match *update {
            DataUpdate::All => self.entries.clear(),
            DataUpdate::Update(at) => {
                self.entries.remove(&at);
            }
            DataUpdate::Delete(at) => {
                self.entries.remove(&at);
                self.shift(at.section, at.item.saturating_add(1), None, Shift::Left);
            }
            DataUpdate::Insert(at) => {
                self.shift(at.section, at.item, None, Shift::Right);
            }
            DataUpdate::Move { from, to } => {
                if from == to {
                    return;
                }
                let moved = self.entries.remove(&from);
                if from.section == to.section {
                    if from.item < to.item {
                        self.shift(from.section, from.item + 1, Some(to.item), Shift::Left);
                    } else {
                        self.shift(from.section, to.item, Some(from.item - 1), Shift::Right);
                    }
                } else {
                    self.shift(from.section, from.item + 1, None, Shift::Left);
                    self.shift(to.section, to.item, None, Shift::Right);
                }
                if let Some(value) = moved {
                    self.entries.insert(to, value);
                }
            }
        }
    }

    /// Re-index after a whole batch, in order.
    pub fn apply_batch(&mut self, batch: &UpdateBatch) {
        for update in batch {
            self.apply(update);
        }
    }

    /// Shift the entries of `section` with item in `start..=end` by one slot.
    fn shift(&mut self, section: usize, start: usize, end: Option<usize>, direction: Shift) {
        let lo = IndexPath::new(section, start);
        let hi = match end {
            Some(end) if end < start => return,
            Some(end) => IndexPath::new(section, end),
            None => IndexPath::section_end(section),
        };
        if lo > hi {
            return;
        }
        let keys: Vec<IndexPath> = self.entries.range(lo..=hi).map(|(k, _)| *k).collect();
        let moved: Vec<(IndexPath, V)> = keys
            .into_iter()
            .filter_map(|k| self.entries.remove(&k).map(|v| (k, v)))
            .collect();
        for (key, value) in moved {
            let item = match direction {
                Shift::Left => key.item - 1,
                Shift::Right => key.item + 1,
            };
            self.entries.insert(IndexPath::new(section, item), value);
        }
    }
}

#[derive(Clone, Copy)]
enum Shift {
    Left,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::remap;
    use proptest::prelude::*;

    fn p(item: usize) -> IndexPath {
        IndexPath::flat(item)
    }

    fn filled(n: usize) -> PositionCache<usize> {
        let mut cache = PositionCache::new();
        for i in 0..n {
            cache.insert(p(i), i);
        }
        cache
    }

    fn snapshot(cache: &PositionCache<usize>) -> Vec<(IndexPath, usize)> {
        cache.entries.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn delete_shifts_left() {
        let mut cache = filled(4);
        cache.apply(&DataUpdate::Delete(p(1)));
        assert_eq!(snapshot(&cache), vec![(p(0), 0), (p(1), 2), (p(2), 3)]);
    }

    #[test]
    fn insert_shifts_right() {
        let mut cache = filled(3);
        cache.apply(&DataUpdate::Insert(p(1)));
        assert_eq!(snapshot(&cache), vec![(p(0), 0), (p(2), 1), (p(3), 2)]);
    }

    #[test]
    fn update_invalidates_only_target() {
        let mut cache = filled(3);
        cache.apply(&DataUpdate::Update(p(1)));
        assert_eq!(snapshot(&cache), vec![(p(0), 0), (p(2), 2)]);
    }

    #[test]
    fn move_preserves_values() {
        let mut cache = filled(5);
        cache.apply(&DataUpdate::Move {
            from: p(1),
            to: p(3),
        });
        assert_eq!(
            snapshot(&cache),
            vec![(p(0), 0), (p(1), 2), (p(2), 3), (p(3), 1), (p(4), 4)]
        );
        cache.apply(&DataUpdate::Move {
            from: p(3),
            to: p(1),
        });
        assert_eq!(snapshot(&cache), snapshot(&filled(5)));
    }

    #[test]
    fn move_of_uncached_item_still_shifts_neighbors() {
        let mut cache = filled(4);
        cache.remove(p(0));
        cache.apply(&DataUpdate::Move {
            from: p(0),
            to: p(3),
        });
        assert_eq!(snapshot(&cache), vec![(p(0), 1), (p(1), 2), (p(2), 3)]);
    }

    #[test]
    fn move_across_sections() {
        let mut cache = PositionCache::new();
        cache.insert(IndexPath::new(0, 0), 10);
        cache.insert(IndexPath::new(0, 1), 11);
        cache.insert(IndexPath::new(1, 0), 20);
        cache.apply(&DataUpdate::Move {
            from: IndexPath::new(0, 0),
            to: IndexPath::new(1, 0),
        });
        assert_eq!(
            snapshot(&cache),
            vec![
                (IndexPath::new(0, 0), 11),
                (IndexPath::new(1, 0), 10),
                (IndexPath::new(1, 1), 20),
            ]
        );
    }

    #[test]
    fn all_clears() {
        let mut cache = filled(3);
        cache.apply_batch(&UpdateBatch::all());
        assert!(cache.is_empty());
    }

    fn arb_update() -> impl Strategy<Value = DataUpdate> {
        let pos = (0usize..2, 0usize..8).prop_map(|(s, i)| IndexPath::new(s, i));
        prop_oneof![
            pos.clone().prop_map(DataUpdate::Insert),
            pos.clone().prop_map(DataUpdate::Delete),
            pos.clone().prop_map(DataUpdate::Update),
            (pos.clone(), pos).prop_map(|(from, to)| DataUpdate::Move { from, to }),
        ]
    }

    proptest! {
        // The cache and the selection use the same shift rules.
        #[test]
        fn cache_agrees_with_remap(
            keys in proptest::collection::btree_set((0usize..2, 0usize..8), 0..12),
            update in arb_update(),
        ) {
            let mut cache = PositionCache::new();
            for &(s, i) in &keys {
                cache.insert(IndexPath::new(s, i), (s, i));
            }
            cache.apply(&update);

            let mut expected: Vec<(IndexPath, (usize, usize))> = keys
                .iter()
                .filter_map(|&(s, i)| {
                    let key = IndexPath::new(s, i);
                    if update == DataUpdate::Update(key) {
                        return None;
                    }
                    remap(key, &update).map(|k| (k, (s, i)))
                })
                .collect();
            expected.sort();
            let actual: Vec<(IndexPath, (usize, usize))> =
                cache.entries.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
