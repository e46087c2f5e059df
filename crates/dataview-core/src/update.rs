//! Incremental change vocabulary.
//!
//! # Invariants
//!
//! 1. Updates inside a batch are sequential: each position is interpreted
//!    against the collection as it stands after every earlier update of the
//!    same batch has been applied.
//! 2. [`DataUpdate::All`] never shares a batch with other updates. Listeners
//!    may assume that when `All` is present it is the sole entry.
//! 3. A `Move` is a removal at `from` followed by an insertion at `to`, where
//!    `to` is expressed after the removal.

use core::fmt;

use smallvec::SmallVec;

use crate::position::IndexPath;

/// A single change to a grouped, ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataUpdate {
    /// Discard incremental reasoning; treat as a full reload.
    All,
    /// An item was inserted at the position.
    Insert(IndexPath),
    /// The item at the position was removed.
    Delete(IndexPath),
    /// The item at the position changed content but kept its identity.
    Update(IndexPath),
    /// The item moved between positions.
    Move {
        /// Position before the move.
        from: IndexPath,
        /// Position after the move.
        to: IndexPath,
    },
}

impl DataUpdate {
    /// The same update with every position shifted `offset` sections down.
    #[must_use]
    pub fn offset_sections(self, offset: usize) -> Self {
        if offset == 0 {
            return self;
        }
        match self {
            Self::All => Self::All,
            Self::Insert(at) => Self::Insert(at.with_section_offset(offset)),
            Self::Delete(at) => Self::Delete(at.with_section_offset(offset)),
            Self::Update(at) => Self::Update(at.with_section_offset(offset)),
            Self::Move { from, to } => Self::Move {
                from: from.with_section_offset(offset),
                to: to.with_section_offset(offset),
            },
        }
    }
}

impl fmt::Display for DataUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Insert(at) => write!(f, "insert {at}"),
            Self::Delete(at) => write!(f, "delete {at}"),
            Self::Update(at) => write!(f, "update {at}"),
            Self::Move { from, to } => write!(f, "move {from} -> {to}"),
        }
    }
}

/// One notification: an ordered sequence of updates.
///
/// Construction enforces invariant 2: any batch that would contain
/// [`DataUpdate::All`] collapses to exactly `[All]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    updates: SmallVec<[DataUpdate; 4]>,
}

impl UpdateBatch {
    /// An empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The full-reload batch `[All]`.
    #[must_use]
    pub fn all() -> Self {
        let mut updates = SmallVec::new();
        updates.push(DataUpdate::All);
        Self { updates }
    }

    /// Build a batch, collapsing to `[All]` if any update is `All`.
    pub fn from_updates(updates: impl IntoIterator<Item = DataUpdate>) -> Self {
        let mut batch = Self::new();
        for update in updates {
            batch.push(update);
            if batch.is_reload() {
                return batch;
            }
        }
        batch
    }

    /// Append an update. Pushing `All` replaces the whole batch with `[All]`;
    /// pushing anything onto an `[All]` batch is absorbed.
    pub fn push(&mut self, update: DataUpdate) {
        if self.is_reload() {
            return;
        }
        if update == DataUpdate::All {
            *self = Self::all();
        } else {
            self.updates.push(update);
        }
    }

    /// Whether this batch is the full-reload batch `[All]`.
    #[must_use]
    pub fn is_reload(&self) -> bool {
        self.updates.first() == Some(&DataUpdate::All)
    }

    /// Number of updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Whether the batch carries no updates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Iterate the updates in application order.
    pub fn iter(&self) -> core::slice::Iter<'_, DataUpdate> {
        self.updates.iter()
    }

    /// The updates as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[DataUpdate] {
        &self.updates
    }

    /// The same batch with every position shifted `offset` sections down.
    #[must_use]
    pub fn offset_sections(&self, offset: usize) -> Self {
        Self {
            updates: self
                .updates
                .iter()
                .map(|u| u.offset_sections(offset))
                .collect(),
        }
    }
}

impl FromIterator<DataUpdate> for UpdateBatch {
    fn from_iter<I: IntoIterator<Item = DataUpdate>>(iter: I) -> Self {
        Self::from_updates(iter)
    }
}

impl<'a> IntoIterator for &'a UpdateBatch {
    type Item = &'a DataUpdate;
    type IntoIter = core::slice::Iter<'a, DataUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.iter()
    }
}

impl fmt::Display for UpdateBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, update) in self.updates.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{update}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_collapses_batch() {
        let batch = UpdateBatch::from_updates([
            DataUpdate::Insert(IndexPath::flat(0)),
            DataUpdate::All,
            DataUpdate::Delete(IndexPath::flat(1)),
        ]);
        assert!(batch.is_reload());
        assert_eq!(batch.as_slice(), &[DataUpdate::All]);
    }

    #[test]
    fn push_onto_reload_is_absorbed() {
        let mut batch = UpdateBatch::all();
        batch.push(DataUpdate::Update(IndexPath::flat(3)));
        assert_eq!(batch.len(), 1);
        assert!(batch.is_reload());
    }

    #[test]
    fn offset_shifts_sections_only() {
        let batch = UpdateBatch::from_updates([
            DataUpdate::Insert(IndexPath::new(0, 2)),
            DataUpdate::Move {
                from: IndexPath::new(0, 1),
                to: IndexPath::new(1, 0),
            },
        ]);
        let shifted = batch.offset_sections(2);
        assert_eq!(
            shifted.as_slice(),
            &[
                DataUpdate::Insert(IndexPath::new(2, 2)),
                DataUpdate::Move {
                    from: IndexPath::new(2, 1),
                    to: IndexPath::new(3, 0),
                },
            ]
        );
        assert_eq!(UpdateBatch::all().offset_sections(3), UpdateBatch::all());
    }

    #[test]
    fn display_lists_updates() {
        let batch: UpdateBatch = [
            DataUpdate::Delete(IndexPath::flat(0)),
            DataUpdate::Update(IndexPath::flat(1)),
        ]
        .into_iter()
        .collect();
        assert_eq!(batch.to_string(), "[delete [0, 0], update [0, 1]]");
    }
}
