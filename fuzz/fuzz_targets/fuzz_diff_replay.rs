#![no_main]

use arbitrary::Arbitrary;
use dataview_core::Uniq;
use dataview_diff::{diff, replay};
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
}

fuzz_target!(|input: Input| {
    // Keep the quadratic alignment cheap per case.
    if input.old.len() > 256 || input.new.len() > 256 {
        return;
    }
    let batch = diff(&input.old, &input.new);
    assert_eq!(replay(&input.old, &input.new, &batch).as_ref(), Some(&input.new));
    assert_eq!(diff(&input.old, &input.new), batch);
    assert!(diff(&input.new, &input.new).is_empty());
});
