#![forbid(unsafe_code)]

//! Observable, diffed, paginated data pipelines.
//!
//! This crate re-exports the workspace crates under one roof:
//!
//! | Module | Crate | Contents |
//! |--------|-------|----------|
//! | [`model`] | `dataview-core` | positions, states, update batches, errors, selection |
//! | [`diff`] | `dataview-diff` | edit scripts between snapshots |
//! | [`runtime`] | `dataview-runtime` | observables, the UI loop, request sharing |
//! | [`data`] | `dataview-data` | result sources and views |
//! | [`http`] | `dataview-http` | HTTP filters and services (feature `http`) |
//! | [`bind`] | `dataview-bind` | list and pager widget adapters (feature `bind`) |
//!
//! Most applications only need the [`prelude`].
//!
//! ```ignore
//! use dataview::prelude::*;
//!
//! let mut ui = UiLoop::new();
//! let view = DataView::new(DataResult::paged(
//!     ui.executor(),
//!     PagingConfig::with_page_size(20),
//!     |request| fetch_page(request.page),
//! ));
//! ui.run_until_stalled();
//! ```

pub use dataview_core as model;
pub use dataview_data as data;
pub use dataview_diff as diff;
pub use dataview_runtime as runtime;

#[cfg(feature = "bind")]
pub use dataview_bind as bind;
#[cfg(feature = "http")]
pub use dataview_http as http;

pub use dataview_core::{
    DataError, DataState, DataUpdate, ErrorCause, IndexPath, SelectionError, SelectionSet, Uniq,
    UpdateBatch,
};
pub use dataview_data::{DataResult, DataSingleResult, DataView, PagingConfig, ResultSource};
pub use dataview_runtime::{RequestCache, UiLoop};

/// The types most pipelines touch.
pub mod prelude {
    pub use dataview_core::{
        DataError, DataState, DataUpdate, IndexPath, SelectionSet, Uniq, UpdateBatch,
    };
    pub use dataview_data::{
        DataResult, DataSingleResult, DataView, PageRequest, PagingConfig, ResultSource,
    };
    pub use dataview_runtime::{
        BindingScope, EventChannel, Handoff, Observable, RequestCache, Subscription, UiExecutor,
        UiLoop,
    };

    #[cfg(feature = "bind")]
    pub use dataview_bind::{ListBinding, ListWidget, PagerBinding, PagerWidget};
    #[cfg(feature = "http")]
    pub use dataview_http::{
        DecodableService, HttpDataFilter, HttpMethod, HttpService, JsonService, Service,
        ServiceConfig, Transport,
    };
}
