#![forbid(unsafe_code)]

//! Core vocabulary for the dataview pipeline.
//!
//! Everything else in the workspace speaks in these types:
//!
//! - [`IndexPath`]: a `(section, item)` position in a grouped collection.
//! - [`DataState`]: the lifecycle of the operation feeding a source.
//! - [`DataUpdate`] / [`UpdateBatch`]: incremental change notifications.
//! - [`Uniq`]: the identity contract items must satisfy to be diffed.
//! - [`DataError`]: the error taxonomy surfaced by collaborators.
//! - [`SelectionSet`] / [`PositionCache`]: position-keyed state that follows
//!   the same shift rules when a collection mutates.

pub mod cache;
pub mod error;
pub mod identity;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod position;
pub mod selection;
pub mod shift;
pub mod state;
pub mod update;

pub use cache::PositionCache;
pub use error::{DataError, ErrorCause};
pub use identity::Uniq;
pub use position::IndexPath;
pub use selection::{SelectionError, SelectionSet};
pub use shift::remap;
pub use state::DataState;
pub use update::{DataUpdate, UpdateBatch};
