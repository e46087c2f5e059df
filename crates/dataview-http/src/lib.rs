#![forbid(unsafe_code)]

//! HTTP collaborators for dataview sources.
//!
//! A request is described declaratively by an [`HttpDataFilter`] and sent
//! through a [`Service`]. The wire itself is an injected [`Transport`]; this
//! crate builds requests, encodes bodies, shares identical in-flight
//! requests, classifies responses into [`DataError`], and decodes JSON.
//!
//! ```text
//! HttpDataFilter ──▶ HttpService ──▶ RequestCache ──▶ Transport
//!                        │                               │
//!                        ◀──── classify (2xx / status / transport) ◀─┘
//!                        ├──▶ ErrorFeed (every failure)
//!                        ▼
//!            JsonService / DecodableService<T> ──▶ Decoded<T>
//! ```
//!
//! [`DataError`]: dataview_core::DataError

pub mod auth;
pub mod body;
pub mod config;
pub mod filter;
pub mod json;
pub mod request;
pub mod service;
pub mod transport;

pub use auth::{Authorized, AuthorizedService, BearerToken};
pub use body::{BodyError, Upload};
pub use config::{ConfigError, ServiceConfig};
pub use filter::{HttpDataFilter, HttpMethod};
pub use json::{DecodableService, Decoded, JsonService};
pub use request::{HttpRequest, RequestError, build_request};
pub use service::{ErrorFeed, HttpService, Service};
pub use transport::{HttpResponse, Transport, TransportError, classify};
