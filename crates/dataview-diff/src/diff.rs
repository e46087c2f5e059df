//! Wagner–Fischer alignment with move and update coalescing.
//!
//! # Algorithm
//!
//! 1. **Intern identities.** Every item's [`Uniq::identity`] is mapped to a
//!    dense `u32` symbol so the alignment compares integers.
//! 2. **Trim.** The common prefix and suffix (by identity) are matched
//!    directly; only the middle window enters the matrix.
//! 3. **Align.** A suffix edit-distance matrix with insert/delete cost 1 and
//!    match cost 0 (no substitution) is filled bottom-up, then walked
//!    forward from `(0, 0)`: an equal pair is always matched, otherwise a
//!    delete is preferred over an insert when both are optimal. Matching the
//!    earliest identical items first makes the alignment leftmost-greedy and
//!    deterministic.
//! 4. **Coalesce.** A deleted item whose identity is also inserted becomes a
//!    single move (pairs are formed in index order). A matched or moved item
//!    whose content differs also gets an update.
//! 5. **Emit** a sequential script:
//!    - pure deletes, highest index first;
//!    - moves, placing each moved item right after its predecessor in the
//!      new order (one move per moved item);
//!    - pure inserts, lowest new index first;
//!    - updates at their final positions.
//!
//! # Invariants
//!
//! 1. **Correct**: `replay(old, new, diff(old, new)) == new`.
//! 2. **Deterministic**: identical inputs produce identical scripts.
//! 3. **Quiet**: `diff(x, x)` is empty.
//! 4. **Never `All`**: empty-to-full and full-to-empty produce per-item
//!    inserts and deletes.
//!
//! # Complexity
//!
//! `O(a·b)` time and space for the untrimmed middle windows of length `a`
//! and `b`; `O(n + m)` when the snapshots differ only at one end.

use std::collections::VecDeque;

use ahash::AHashMap;
use dataview_core::{DataUpdate, IndexPath, Uniq, UpdateBatch};

/// Edit script turning `old` into `new`, positions in section 0.
#[must_use]
pub fn diff<T: Uniq + PartialEq>(old: &[T], new: &[T]) -> UpdateBatch {
    diff_in_section(old, new, 0)
}

/// Edit script turning `old` into `new`, positions in `section`.
#[must_use]
pub fn diff_in_section<T: Uniq + PartialEq>(old: &[T], new: &[T], section: usize) -> UpdateBatch {
    let (old_syms, new_syms) = intern(old, new);
    let alignment = align(&old_syms, &new_syms);
    let script = build_script(old, new, &old_syms, &new_syms, alignment, section);

    #[cfg(feature = "tracing")]
    tracing::trace!(
        old = old.len(),
        new = new.len(),
        updates = script.len(),
        "computed diff"
    );

    script
}

fn intern<T: Uniq>(old: &[T], new: &[T]) -> (Vec<u32>, Vec<u32>) {
    let mut table: AHashMap<T::Id, u32> = AHashMap::with_capacity(old.len() + new.len());
    let mut symbol = |item: &T| {
        let next = table.len() as u32;
        *table.entry(item.identity()).or_insert(next)
    };
    let old_syms = old.iter().map(&mut symbol).collect();
    let new_syms = new.iter().map(&mut symbol).collect();
    (old_syms, new_syms)
}

/// Result of aligning two symbol sequences.
#[derive(Debug, Default)]
struct Alignment {
    /// `(old index, new index)` pairs kept in place, ascending in both.
    matched: Vec<(usize, usize)>,
    /// Old indices with no partner, ascending.
    deleted: Vec<usize>,
    /// New indices with no partner, ascending.
    inserted: Vec<usize>,
}

fn align(old: &[u32], new: &[u32]) -> Alignment {
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    let mut alignment = Alignment::default();
    alignment.matched.extend((0..prefix).map(|i| (i, i)));
    align_window(old_mid, new_mid, prefix, &mut alignment);
    let old_tail = old.len() - suffix;
    let new_tail = new.len() - suffix;
    alignment
        .matched
        .extend((0..suffix).map(|k| (old_tail + k, new_tail + k)));
    alignment
}

fn align_window(old: &[u32], new: &[u32], offset: usize, out: &mut Alignment) {
    let (a, b) = (old.len(), new.len());
    if a == 0 {
        out.inserted.extend((0..b).map(|j| offset + j));
        return;
    }
    if b == 0 {
        out.deleted.extend((0..a).map(|i| offset + i));
        return;
    }

    // dist[i * width + j] = edit distance between old[i..] and new[j..].
    let width = b + 1;
    let mut dist = vec![0u32; (a + 1) * width];
    for j in 0..=b {
        dist[a * width + j] = (b - j) as u32;
    }
    for i in (0..a).rev() {
        dist[i * width + b] = (a - i) as u32;
        for j in (0..b).rev() {
            dist[i * width + j] = if old[i] == new[j] {
                dist[(i + 1) * width + j + 1]
            } else {
                1 + dist[(i + 1) * width + j].min(dist[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < a || j < b {
        if i < a && j < b && old[i] == new[j] {
            out.matched.push((offset + i, offset + j));
            i += 1;
            j += 1;
        } else if i < a && (j == b || dist[(i + 1) * width + j] <= dist[i * width + j + 1]) {
            out.deleted.push(offset + i);
            i += 1;
        } else {
            out.inserted.push(offset + j);
            j += 1;
        }
    }
}

fn build_script<T: PartialEq>(
    old: &[T],
    new: &[T],
    old_syms: &[u32],
    new_syms: &[u32],
    alignment: Alignment,
    section: usize,
) -> UpdateBatch {
    let Alignment {
        matched,
        deleted,
        inserted,
    } = alignment;

    // Pair deletions and insertions of the same identity into moves.
    let mut pending: AHashMap<u32, VecDeque<usize>> = AHashMap::new();
    for &i in &deleted {
        pending.entry(old_syms[i]).or_default().push_back(i);
    }
    let mut moved: Vec<(usize, usize)> = Vec::new();
    let mut pure_inserts: Vec<usize> = Vec::new();
    for &j in &inserted {
        match pending.get_mut(&new_syms[j]).and_then(VecDeque::pop_front) {
            Some(i) => moved.push((i, j)),
            None => pure_inserts.push(j),
        }
    }
    let mut move_sources: Vec<usize> = moved.iter().map(|&(i, _)| i).collect();
    move_sources.sort_unstable();
    let pure_deletes: Vec<usize> = deleted
        .into_iter()
        .filter(|i| move_sources.binary_search(i).is_err())
        .collect();

    let at = |item: usize| IndexPath::new(section, item);
    let mut batch = UpdateBatch::new();

    for &i in pure_deletes.iter().rev() {
        batch.push(DataUpdate::Delete(at(i)));
    }

    // Survivors in their old order, tracked by old index.
    let mut working: Vec<usize> = {
        let mut survivors: Vec<usize> = matched
            .iter()
            .map(|&(i, _)| i)
            .chain(move_sources.iter().copied())
            .collect();
        survivors.sort_unstable();
        survivors
    };
    // Survivors in their new order: (new index, old index, is_move).
    let mut target: Vec<(usize, usize, bool)> = matched
        .iter()
        .map(|&(i, j)| (j, i, false))
        .chain(moved.iter().map(|&(i, j)| (j, i, true)))
        .collect();
    target.sort_unstable();

    for k in 0..target.len() {
        let (_, old_index, is_move) = target[k];
        if !is_move {
            continue;
        }
        let Some(from) = working.iter().position(|&x| x == old_index) else {
            continue;
        };
        working.remove(from);
        let to = if k == 0 {
            0
        } else {
            let predecessor = target[k - 1].1;
            working
                .iter()
                .position(|&x| x == predecessor)
                .map_or(0, |p| p + 1)
        };
        working.insert(to, old_index);
        if from != to {
            batch.push(DataUpdate::Move {
                from: at(from),
                to: at(to),
            });
        }
    }

    for &j in &pure_inserts {
        batch.push(DataUpdate::Insert(at(j)));
    }

    let mut changed: Vec<usize> = matched
        .iter()
        .chain(moved.iter())
        .filter(|&&(i, j)| old[i] != new[j])
        .map(|&(_, j)| j)
        .collect();
    changed.sort_unstable();
    for j in changed {
        batch.push(DataUpdate::Update(at(j)));
    }

    batch
}
