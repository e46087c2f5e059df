#![forbid(unsafe_code)]

//! Binding adapters between dataview views and widgets.
//!
//! Widgets are described by small traits ([`ListWidget`], [`PagerWidget`]);
//! a binding subscribes to a [`DataView`](dataview_data::DataView)'s update
//! batches and turns each one into widget calls on the UI loop.

pub mod list;
pub mod pager;

pub use list::{ListBinding, ListWidget, apply_updates};
pub use pager::{PagerBinding, PagerWidget};
