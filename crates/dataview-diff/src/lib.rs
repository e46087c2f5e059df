#![forbid(unsafe_code)]

//! Edit scripts between identity-bearing snapshots.
//!
//! [`diff`] turns two ordered snapshots into an [`UpdateBatch`] that, applied
//! in order to the old snapshot, yields the new one. [`replay`] applies such a
//! batch and is what the tests and the fuzz target check the engine against.
//!
//! [`UpdateBatch`]: dataview_core::UpdateBatch

pub mod diff;
pub mod replay;

pub use diff::{diff, diff_in_section};
pub use replay::replay;
