#![no_main]

use arbitrary::Arbitrary;
use dataview_core::{IndexPath, PositionCache, SelectionSet, Uniq};
use dataview_diff::diff;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, PartialEq, Arbitrary)]
struct Row {
    key: u8,
    body: u8,
}

impl Uniq for Row {
    type Id = u8;

    fn identity(&self) -> u8 {
        self.key
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    old: Vec<Row>,
    new: Vec<Row>,
    picks: Vec<u8>,
}

fuzz_target!(|input: Input| {
    if input.old.len() > 128 || input.new.len() > 128 || input.old.is_empty() {
        return;
    }
    let mut selection = SelectionSet::multiple();
    let mut cache = PositionCache::new();
    for pick in &input.picks {
        let at = usize::from(*pick) % input.old.len();
        selection.select(IndexPath::flat(at));
        cache.insert(IndexPath::flat(at), input.old[at].key);
    }

    let batch = diff(&input.old, &input.new);
    selection.apply_batch(&batch);
    cache.apply_batch(&batch);

    // Whatever survives still points at an item with the same identity.
    for position in selection.iter() {
        assert!(position.item < input.new.len());
    }
    for position in cache.positions() {
        assert!(selection.contains(position));
        assert_eq!(cache.get(position), Some(&input.new[position.item].key));
    }
});
