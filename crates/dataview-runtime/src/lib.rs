#![forbid(unsafe_code)]

//! Runtime plumbing for dataview pipelines.
//!
//! - [`reactive`]: single-threaded observable values and event channels.
//! - [`executor`]: the UI task loop that sources run their work on.
//! - [`request_cache`]: sharing of identical in-flight requests.

pub mod executor;
pub mod reactive;
pub mod request_cache;

pub use executor::{Handoff, RuntimeError, TaskGuard, UiExecutor, UiLoop};
pub use reactive::{Binding, BindingScope, EventChannel, Observable, Subscription, bind_mapped};
pub use request_cache::{RequestCache, RequestCancelled, RequestHandle};
