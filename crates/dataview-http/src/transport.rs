//! The network collaborator and response classification.
//!
//! # Failure Modes
//!
//! | Transport outcome | Surfaced as |
//! |-------------------|-------------|
//! | 2xx response | `Ok(HttpResponse)` |
//! | other status | [`DataError::InvalidStatus`] with the raw body |
//! | [`TransportError::NotConnected`] | [`DataError::NoConnectivity`] |
//! | [`TransportError::Failed`] | [`DataError::TransportFailure`] |
//! | [`TransportError::Cancelled`] | [`DataError::Cancelled`] |

use std::collections::BTreeMap;

use dataview_core::{DataError, ErrorCause};
use futures::future::BoxFuture;

use crate::request::HttpRequest;

/// A received response, any status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response with `status`, no headers and `body`.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a transport could not produce a response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The device is offline.
    #[error("not connected: {0}")]
    NotConnected(ErrorCause),
    /// Anything else that kept the exchange from completing.
    #[error("request failed: {0}")]
    Failed(ErrorCause),
    /// The transport gave up on the request.
    #[error("request cancelled")]
    Cancelled,
}

impl From<TransportError> for DataError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::NotConnected(cause) => DataError::NoConnectivity(cause),
            TransportError::Failed(cause) => DataError::TransportFailure(cause),
            TransportError::Cancelled => DataError::Cancelled,
        }
    }
}

/// Executes requests. Implementations own connection handling; dropping the
/// returned future must cancel the exchange.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'static, Result<HttpResponse, TransportError>>;
}

/// Map a transport outcome onto the pipeline's error taxonomy.
pub fn classify(outcome: Result<HttpResponse, TransportError>) -> Result<HttpResponse, DataError> {
    let response = outcome?;
    if response.is_success() {
        Ok(response)
    } else {
        Err(DataError::InvalidStatus {
            code: response.status,
            body: response.body,
        })
    }
}
