#![forbid(unsafe_code)]

//! Result sources and projected views.
//!
//! A [`DataResult<T>`] is a handle onto one data-producing strategy (a fixed
//! list, an async snapshot stream, a paged loader, a live store query, a
//! concatenation, a mapping). Every strategy exposes the same
//! [`ResultSource`] capability set: a [`DataState`] observable, an update
//! batch channel, positional access, and `reload`/`load_more`.
//!
//! A [`DataView<T>`] projects a source for presentation: empty/loading
//! flags, a selection that follows the items through updates, mapping, and
//! an optional position-indexed memo of mapped values.
//!
//! All state lives on the UI loop ([`dataview_runtime::UiLoop`]); sources
//! and views are `!Send`.
//!
//! [`DataState`]: dataview_core::DataState

pub mod config;
pub mod result;
pub mod single;
pub mod source;
pub mod view;

pub use config::PagingConfig;
pub use result::live_query::{ChangeSet, LiveQuery, StoreChange, StorePageLoader};
pub use result::paged::PageRequest;
pub use result::{DataResult, SnapshotFuture, SnapshotStream};
pub use single::DataSingleResult;
pub use source::ResultSource;
pub use view::DataView;
